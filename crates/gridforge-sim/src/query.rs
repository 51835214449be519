//! Read-only query API for the presentation layer.
//!
//! Every view is an owned copy. Nothing here borrows into the engine, so a
//! renderer may hold a frame's views while the next tick runs.

use gridforge_core::fixed::{Fixed64, Seconds};
use gridforge_core::id::{BuildingId, BuildingKind, Resource};
use gridforge_core::rotation::Rotation;
use gridforge_research::Tier;
use gridforge_spatial::{Building, BuildingState, GridPosition};

use crate::engine::Engine;

// ---------------------------------------------------------------------------
// View types
// ---------------------------------------------------------------------------

/// One placed building as the renderer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingView {
    pub id: BuildingId,
    pub kind: BuildingKind,
    pub position: GridPosition,
    pub rotation: Rotation,
    /// Whether a processor currently holds an input.
    pub working: bool,
    /// Progress toward the next emission as a 0..1 fraction, scaled by the
    /// current power efficiency. 0 for kinds without a rate gate.
    pub progress: Fixed64,
    /// Items buffered inside a storage container.
    pub stored: Vec<Resource>,
}

/// One in-transit item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemView {
    pub position: GridPosition,
    pub resource: Resource,
    pub progress: Fixed64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchStatus {
    pub level: u32,
    pub max_level: u32,
    /// Lab points accrued since the last advancement.
    pub progress: u64,
    /// The next tier, `None` once everything is researched.
    pub next: Option<Tier>,
    /// Share of the next tier's requirements already in the ledger.
    pub goal_progress: Fixed64,
    /// Seconds until another advancement is accepted.
    pub cooldown_remaining: Seconds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerStatus {
    pub production: Fixed64,
    pub consumption: Fixed64,
    pub efficiency: Fixed64,
    pub brownout: bool,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl Engine {
    fn view(&self, id: BuildingId, building: &Building) -> BuildingView {
        let spec = self.catalog.get(building.kind);
        let rate = spec.rate.saturating_mul(spec.efficiency_factor(self.power.efficiency));
        let elapsed = match &building.state {
            BuildingState::Charging { elapsed } | BuildingState::Working { elapsed, .. } => *elapsed,
            _ => Fixed64::ZERO,
        };
        let stored = match &building.state {
            BuildingState::Storage { queue } => queue.iter().copied().collect(),
            _ => Vec::new(),
        };
        BuildingView {
            id,
            kind: building.kind,
            position: building.position,
            rotation: building.rotation,
            working: building.state.is_working(),
            progress: elapsed.saturating_mul(rate).clamp(Fixed64::ZERO, Fixed64::ONE),
            stored,
        }
    }

    /// Every placed building, in placement order.
    pub fn buildings(&self) -> Vec<BuildingView> {
        self.grid
            .ids_in_order()
            .into_iter()
            .filter_map(|id| self.grid.get(id).map(|b| self.view(id, b)))
            .collect()
    }

    pub fn building_at(&self, pos: GridPosition) -> Option<BuildingView> {
        let id = self.grid.building_id_at(pos)?;
        self.grid.get(id).map(|b| self.view(id, b))
    }

    /// Buildings inside the inclusive rectangle `min..=max`.
    pub fn buildings_in_view(&self, min: GridPosition, max: GridPosition) -> Vec<BuildingView> {
        self.grid
            .buildings_in_rect(min, max)
            .into_iter()
            .filter_map(|b| {
                let id = self.grid.building_id_at(b.position)?;
                Some(self.view(id, b))
            })
            .collect()
    }

    pub fn items(&self) -> Vec<ItemView> {
        self.grid
            .items()
            .map(|(position, item)| ItemView {
                position,
                resource: item.resource,
                progress: item.progress,
            })
            .collect()
    }

    /// Every counter, in display order.
    pub fn resources(&self) -> Vec<(Resource, Fixed64)> {
        self.ledger.snapshot()
    }

    pub fn resource(&self, resource: Resource) -> Fixed64 {
        self.ledger.amount(resource)
    }

    pub fn discovered(&self) -> Vec<Resource> {
        self.ledger.discovered().collect()
    }

    pub fn research_status(&self) -> ResearchStatus {
        let research = &self.research;
        let cooldown_remaining = research
            .state()
            .last_advance
            .map(|last| {
                let since = self.clock.elapsed.saturating_sub(last);
                research.cooldown().saturating_sub(since).max(Fixed64::ZERO)
            })
            .unwrap_or(Fixed64::ZERO);
        ResearchStatus {
            level: research.level(),
            max_level: research.max_level(),
            progress: research.progress(),
            next: research.next_tier().cloned(),
            goal_progress: research.goal_progress(&self.ledger),
            cooldown_remaining,
        }
    }

    pub fn power_status(&self) -> PowerStatus {
        PowerStatus {
            production: self.power.total_production,
            consumption: self.power.total_consumption,
            efficiency: self.power.efficiency,
            brownout: self.power.is_brownout(),
        }
    }

    /// Kinds placeable at the current research level, in catalog order.
    pub fn unlocked_kinds(&self) -> Vec<BuildingKind> {
        BuildingKind::ALL
            .iter()
            .copied()
            .filter(|&k| self.research.is_unlocked(k))
            .collect()
    }
}
