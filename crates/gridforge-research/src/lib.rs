//! Research progression: a strictly linear chain of tiers, each gated by
//! resource requirements and each unlocking a set of building kinds.
//!
//! # Overview
//!
//! The controller holds the current level (0 = nothing researched), an
//! informational point counter fed by labs, and the simulation time of
//! the last advancement. [`ResearchController::advance`] consumes the next
//! tier's requirements from the ledger and moves up exactly one level.
//! Advancements closer together than the cooldown are refused, so several
//! labs completing in the same tick cannot skip tiers.
//!
//! Time is whatever the caller passes as `now`; the engine passes its
//! simulation clock.

use gridforge_core::fixed::{Fixed64, Seconds, clamped_ratio, units};
use gridforge_core::id::{BuildingKind, Resource};
use gridforge_core::ledger::ResourceLedger;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

/// One research tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    /// 1-based level this tier brings the controller to.
    pub level: u32,
    /// Whole-unit amounts consumed on advancement.
    pub requirements: Vec<(Resource, u32)>,
    /// Kinds buildable once `level` is reached.
    pub unlocks: Vec<BuildingKind>,
}

/// Kinds that are buildable before any research.
pub const ALWAYS_UNLOCKED: [BuildingKind; 3] = [
    BuildingKind::IronMiner,
    BuildingKind::Conveyor,
    BuildingKind::Submitter,
];

/// Default seconds between two advancements.
pub const DEFAULT_COOLDOWN_SECS: u32 = 1;

/// The shipped eight-tier table.
pub fn standard_tiers() -> Vec<Tier> {
    use BuildingKind as K;
    use Resource as R;

    let tier = |level, requirements: &[(Resource, u32)], unlocks: &[BuildingKind]| Tier {
        level,
        requirements: requirements.to_vec(),
        unlocks: unlocks.to_vec(),
    };

    vec![
        tier(1, &[(R::Iron, 10)], &[K::CopperMiner, K::Roller]),
        tier(
            2,
            &[(R::Copper, 5), (R::IronRod, 3)],
            &[K::Furnace, K::Storage, K::CoalMiner, K::CoalGenerator],
        ),
        tier(
            3,
            &[(R::Steel, 2), (R::CopperRod, 2)],
            &[K::Assembler, K::SolarPanel, K::GoldMiner],
        ),
        tier(4, &[(R::Gear, 1), (R::Steel, 5)], &[K::AdvancedMiner, K::Splitter]),
        tier(5, &[(R::Gear, 3), (R::Steel, 10)], &[K::Factory, K::Lab]),
        tier(
            6,
            &[(R::Gear, 5), (R::Steel, 15), (R::Gold, 5)],
            &[K::CircuitFactory, K::MotorFactory, K::UraniumMiner],
        ),
        tier(
            7,
            &[(R::Circuit, 2), (R::Motor, 1)],
            &[K::ComputerFactory, K::RobotFactory, K::NuclearReactor],
        ),
        tier(8, &[(R::Robot, 5), (R::Computer, 3)], &[K::QuantumLab, K::TimeMachine]),
    ]
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events emitted by the research controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResearchEvent {
    /// The controller moved up to `level`, unlocking `unlocked`.
    TierAdvanced {
        level: u32,
        unlocked: Vec<BuildingKind>,
    },
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why an advancement (or a tier table) was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResearchError {
    #[error("every research tier is already complete")]
    AllTiersComplete,

    #[error("research is cooling down for another {remaining}s")]
    CoolingDown { remaining: Seconds },

    #[error("research needs {required} {resource:?}, only {available} available")]
    RequirementsNotMet {
        resource: Resource,
        required: u32,
        available: Fixed64,
    },

    #[error("tier table out of sequence: expected level {expected}, found {found}")]
    TierOutOfSequence { expected: u32, found: u32 },
}

// ---------------------------------------------------------------------------
// Persistent state
// ---------------------------------------------------------------------------

/// The part of the controller that survives a save/load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchState {
    pub level: u32,
    pub progress: u64,
    pub last_advance: Option<Seconds>,
}

// ---------------------------------------------------------------------------
// ResearchController
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ResearchController {
    tiers: Vec<Tier>,
    cooldown: Seconds,
    state: ResearchState,
    /// Events emitted since last drain.
    events: Vec<ResearchEvent>,
}

impl Default for ResearchController {
    fn default() -> Self {
        Self {
            tiers: standard_tiers(),
            cooldown: units(DEFAULT_COOLDOWN_SECS),
            state: ResearchState::default(),
            events: Vec::new(),
        }
    }
}

impl ResearchController {
    /// A controller at level 0 over `tiers`, which must be listed with
    /// levels 1, 2, 3, ... in order.
    pub fn new(tiers: Vec<Tier>, cooldown: Seconds) -> Result<Self, ResearchError> {
        for (i, tier) in tiers.iter().enumerate() {
            let expected = i as u32 + 1;
            if tier.level != expected {
                return Err(ResearchError::TierOutOfSequence {
                    expected,
                    found: tier.level,
                });
            }
        }
        Ok(Self {
            tiers,
            cooldown: cooldown.max(Fixed64::ZERO),
            state: ResearchState::default(),
            events: Vec::new(),
        })
    }

    // -- Queries --

    pub fn level(&self) -> u32 {
        self.state.level
    }

    /// Research points accrued since the last advancement.
    pub fn progress(&self) -> u64 {
        self.state.progress
    }

    pub fn cooldown(&self) -> Seconds {
        self.cooldown
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn max_level(&self) -> u32 {
        self.tiers.len() as u32
    }

    pub fn is_complete(&self) -> bool {
        self.state.level >= self.max_level()
    }

    /// The tier the next advancement would reach.
    pub fn next_tier(&self) -> Option<&Tier> {
        self.tiers.get(self.state.level as usize)
    }

    /// Whether `kind` may be placed at the current level.
    pub fn is_unlocked(&self, kind: BuildingKind) -> bool {
        ALWAYS_UNLOCKED.contains(&kind)
            || self
                .tiers
                .iter()
                .take(self.state.level as usize)
                .any(|t| t.unlocks.contains(&kind))
    }

    /// The level that unlocks `kind`, 0 for always-available kinds, `None`
    /// if no tier lists it.
    pub fn unlock_level(&self, kind: BuildingKind) -> Option<u32> {
        if ALWAYS_UNLOCKED.contains(&kind) {
            return Some(0);
        }
        self.tiers
            .iter()
            .find(|t| t.unlocks.contains(&kind))
            .map(|t| t.level)
    }

    /// Whether the ledger covers the next tier. `Err` names the first
    /// shortfall.
    pub fn requirements_met(&self, ledger: &ResourceLedger) -> Result<(), ResearchError> {
        let tier = self.next_tier().ok_or(ResearchError::AllTiersComplete)?;
        for &(resource, required) in &tier.requirements {
            let available = ledger.amount(resource);
            if available < units(required) {
                return Err(ResearchError::RequirementsNotMet {
                    resource,
                    required,
                    available,
                });
            }
        }
        Ok(())
    }

    /// Fraction of the next tier's requirements currently held, counting
    /// each resource at most up to its requirement. 1 once every tier is
    /// complete.
    pub fn goal_progress(&self, ledger: &ResourceLedger) -> Fixed64 {
        let Some(tier) = self.next_tier() else {
            return Fixed64::ONE;
        };
        let mut have = Fixed64::ZERO;
        let mut need = Fixed64::ZERO;
        for &(resource, required) in &tier.requirements {
            let required = units(required);
            have = have.saturating_add(ledger.amount(resource).min(required));
            need = need.saturating_add(required);
        }
        clamped_ratio(have, need)
    }

    // -- Mutation --

    /// Add lab output to the informational point counter.
    pub fn add_progress(&mut self, points: u64) {
        self.state.progress = self.state.progress.saturating_add(points);
    }

    /// Advance if the next tier's requirements are already met. Refusals
    /// are logged and swallowed. Returns the new level on success.
    pub fn check_advancement(&mut self, ledger: &mut ResourceLedger, now: Seconds) -> Option<u32> {
        if self.requirements_met(ledger).is_err() {
            return None;
        }
        match self.advance(ledger, now) {
            Ok(level) => Some(level),
            Err(err) => {
                tracing::debug!(%err, "research check did not advance");
                None
            }
        }
    }

    /// Consume the next tier's requirements and move up one level.
    ///
    /// Refused if every tier is done, if the previous advancement was less
    /// than `cooldown` ago, or if the ledger falls short. A refusal leaves
    /// the ledger untouched.
    pub fn advance(&mut self, ledger: &mut ResourceLedger, now: Seconds) -> Result<u32, ResearchError> {
        let Some(tier) = self.tiers.get(self.state.level as usize) else {
            return Err(ResearchError::AllTiersComplete);
        };

        if let Some(last) = self.state.last_advance {
            let since = now.saturating_sub(last);
            if since < self.cooldown {
                return Err(ResearchError::CoolingDown {
                    remaining: self.cooldown.saturating_sub(since),
                });
            }
        }

        self.requirements_met(ledger)?;
        ledger
            .try_debit_all(&tier.requirements)
            .map_err(|err| match err {
                gridforge_core::ledger::LedgerError::Insufficient {
                    resource,
                    required,
                    available,
                } => ResearchError::RequirementsNotMet {
                    resource,
                    required: required.to_num::<u32>(),
                    available,
                },
            })?;

        let unlocked = tier.unlocks.clone();
        self.state.level += 1;
        self.state.progress = 0;
        self.state.last_advance = Some(now);

        tracing::info!(level = self.state.level, unlocked = ?unlocked, "research tier advanced");
        self.events.push(ResearchEvent::TierAdvanced {
            level: self.state.level,
            unlocked,
        });
        Ok(self.state.level)
    }

    // -- Persistence --

    pub fn state(&self) -> ResearchState {
        self.state
    }

    /// Replace the runtime state. The level is clamped to the table.
    pub fn restore(&mut self, state: ResearchState) {
        self.state = ResearchState {
            level: state.level.min(self.max_level()),
            ..state
        };
        self.events.clear();
    }

    /// Back to level 0 with no progress and no cooldown pending.
    pub fn reset(&mut self) {
        self.restore(ResearchState::default());
    }

    // -- Event API --

    /// Drain all pending events.
    pub fn drain_events(&mut self) -> Vec<ResearchEvent> {
        std::mem::take(&mut self.events)
    }
}
