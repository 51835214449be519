//! The simulation engine: owns the grid, the ledger, research and power,
//! and runs the two-pass tick.
//!
//! # Architecture
//!
//! The `Engine` owns:
//! - A [`GridIndex`] (buildings and in-transit items)
//! - A [`ResourceLedger`] (counters and the discovered set)
//! - A [`ResearchController`] and a [`PowerGrid`]
//! - A [`SimClock`] fed by the caller's `dt`
//! - A buffer of [`GameEvent`]s for the presentation layer
//!
//! # Tick
//!
//! Each `advance(dt)` runs:
//! 1. **Clock** -- add `dt` (negative counts as zero)
//! 2. **Power** -- rebuild the balance from every placed building, burning fuel
//! 3. **Production** -- every building runs its rule once, in placement order,
//!    against the efficiency settled in step 2
//! 4. **Research** -- advancements triggered by labs discover the yields of
//!    what they unlocked

use gridforge_core::catalog::Catalog;
use gridforge_core::fixed::{Fixed64, Seconds, f64_to_fixed64};
use gridforge_core::id::{BuildingId, BuildingKind, Resource};
use gridforge_core::ledger::ResourceLedger;
use gridforge_core::rotation::Rotation;
use gridforge_core::sim::SimClock;
use gridforge_power::{PowerGrid, PowerNode};
use gridforge_research::{ResearchController, ResearchError, ResearchEvent};
use gridforge_spatial::{Building, BuildingState, GridError, GridIndex, GridPosition};

use crate::config::{ConfigError, GameConfig};
use crate::event::{GameEvent, PlacementError};
use crate::rules::{self, TickContext, Unit};

/// The building kind and rotation the player is about to place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub kind: BuildingKind,
    pub rotation: Rotation,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Engine {
    pub(crate) catalog: Catalog,
    pub(crate) config: GameConfig,
    pub(crate) grid: GridIndex,
    pub(crate) ledger: ResourceLedger,
    pub(crate) research: ResearchController,
    pub(crate) power: PowerGrid,
    pub(crate) clock: SimClock,
    pub(crate) events: Vec<GameEvent>,
    pub(crate) selection: Option<Selection>,

    // -- Presentation state, stored but never simulated --
    pub(crate) camera: GridPosition,
    pub(crate) tutorial_completed: bool,
    pub(crate) sound_enabled: bool,
}

impl Default for Engine {
    fn default() -> Self {
        let config = GameConfig::default();
        Self {
            catalog: Catalog::standard(),
            grid: GridIndex::new(),
            ledger: config.starting_ledger(),
            research: ResearchController::default(),
            power: PowerGrid::new(),
            clock: SimClock::new(),
            events: Vec::new(),
            selection: None,
            camera: config.spawn,
            tutorial_completed: false,
            sound_enabled: true,
            config,
        }
    }
}

impl Engine {
    /// A fresh game described by `config`.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        let research = config.research_controller()?;
        Ok(Self {
            ledger: config.starting_ledger(),
            research,
            camera: config.spawn,
            config,
            ..Self::default()
        })
    }

    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Run one tick of `dt` seconds.
    pub fn advance(&mut self, dt: Seconds) {
        let dt = dt.max(Fixed64::ZERO);
        self.clock.advance(dt);

        self.settle_power(dt);
        self.run_production(dt);
        self.absorb_research_events();
    }

    /// [`advance`](Self::advance) with a floating-point frame delta.
    pub fn advance_secs(&mut self, dt: f64) {
        self.advance(f64_to_fixed64(dt));
    }

    fn settle_power(&mut self, dt: Seconds) {
        let catalog = &self.catalog;
        let nodes: Vec<PowerNode> = self
            .grid
            .buildings()
            .filter_map(|b| PowerNode::from_spec(catalog.get(b.kind)))
            .collect();
        let transitions = self.power.settle(nodes, &mut self.ledger, dt, self.clock.tick);
        self.events.extend(transitions.into_iter().map(GameEvent::Power));
    }

    fn run_production(&mut self, dt: Seconds) {
        let efficiency = self.power.efficiency;
        let now = self.clock.elapsed;

        for id in self.grid.ids_in_order() {
            let Some(building) = self.grid.get_mut(id) else {
                continue;
            };
            let spec = self.catalog.get(building.kind);
            let unit = Unit {
                position: building.position,
                rotation: building.rotation,
                spec,
            };
            let mut state = std::mem::replace(&mut building.state, BuildingState::Passive);

            let mut ctx = TickContext {
                catalog: &self.catalog,
                grid: &mut self.grid,
                ledger: &mut self.ledger,
                research: &mut self.research,
                events: &mut self.events,
                dt,
                now,
                efficiency,
            };
            rules::update(&mut ctx, &unit, &mut state);

            if let Some(building) = self.grid.get_mut(id) {
                building.state = state;
            }
        }
    }

    /// Forward research events, discovering what each new tier makes
    /// producible.
    fn absorb_research_events(&mut self) {
        for event in self.research.drain_events() {
            let ResearchEvent::TierAdvanced { unlocked, .. } = &event;
            for &kind in unlocked {
                for resource in self.catalog.get(kind).yields() {
                    rules::discover(&mut self.ledger, &mut self.events, resource);
                }
            }
            self.events.push(GameEvent::Research(event));
        }
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Why placing `kind` at `pos` would fail, if it would.
    pub fn can_place(&self, pos: GridPosition, kind: BuildingKind) -> Result<(), PlacementError> {
        if self.grid.has_building(pos) {
            return Err(PlacementError::Occupied);
        }
        if !self.research.is_unlocked(kind) {
            return Err(PlacementError::Locked(kind));
        }
        if !self.ledger.can_afford(self.catalog.get(kind).cost.entries()) {
            return Err(PlacementError::Unaffordable(kind));
        }
        Ok(())
    }

    /// Pay for and place a building. Nothing changes on failure.
    pub fn place_building(
        &mut self,
        pos: GridPosition,
        kind: BuildingKind,
        rotation: Rotation,
    ) -> Result<BuildingId, PlacementError> {
        if let Err(reason) = self.can_place(pos, kind) {
            return Err(self.reject(Some(kind), pos, reason));
        }

        let spec = self.catalog.get(kind);
        let cost = spec.cost.clone();
        let building = Building {
            kind,
            position: pos,
            rotation,
            state: rules::initial_state(spec),
        };
        if self.ledger.try_debit_all(cost.entries()).is_err() {
            return Err(self.reject(Some(kind), pos, PlacementError::Unaffordable(kind)));
        }
        let id = match self.grid.place(building) {
            Ok(id) => id,
            Err(_) => {
                for &(resource, n) in cost.entries() {
                    self.ledger.credit_units(resource, n);
                }
                return Err(self.reject(Some(kind), pos, PlacementError::Occupied));
            }
        };

        self.events.push(GameEvent::BuildingPlaced {
            kind,
            position: pos,
            rotation,
        });
        Ok(id)
    }

    fn reject(
        &mut self,
        kind: Option<BuildingKind>,
        position: GridPosition,
        reason: PlacementError,
    ) -> PlacementError {
        tracing::debug!(?kind, x = position.x, y = position.y, %reason, "placement rejected");
        self.events.push(GameEvent::PlacementRejected {
            kind,
            position,
            reason,
        });
        reason
    }

    /// Remove the building at `pos`, clear the item resting on its cell
    /// and refund half of its cost. Returns the refund.
    pub fn delete_building(&mut self, pos: GridPosition) -> Result<Vec<(Resource, u32)>, GridError> {
        let building = self.grid.remove(pos)?;
        self.grid.take_item(pos);

        let refund = self.catalog.get(building.kind).cost.refund();
        for &(resource, n) in &refund {
            self.ledger.credit_units(resource, n);
        }
        self.events.push(GameEvent::BuildingRemoved {
            kind: building.kind,
            position: pos,
            refund: refund.clone(),
        });
        Ok(refund)
    }

    // -- Selection --

    /// Pick `kind` for placement, starting unrotated.
    pub fn select(&mut self, kind: BuildingKind) {
        self.selection = Some(Selection {
            kind,
            rotation: Rotation::None,
        });
    }

    /// Turn the pending building a quarter turn clockwise. Returns the new
    /// rotation, or `None` with nothing selected.
    pub fn rotate_pending(&mut self) -> Option<Rotation> {
        let selection = self.selection.as_mut()?;
        selection.rotation = selection.rotation.rotate_cw();
        Some(selection.rotation)
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Place the pending building at `pos`.
    pub fn place_selected(&mut self, pos: GridPosition) -> Result<BuildingId, PlacementError> {
        let Some(Selection { kind, rotation }) = self.selection else {
            return Err(self.reject(None, pos, PlacementError::NothingSelected));
        };
        self.place_building(pos, kind, rotation)
    }

    // -- Research --

    /// Try to move up one research tier now.
    pub fn advance_research(&mut self) -> Result<u32, ResearchError> {
        let result = self.research.advance(&mut self.ledger, self.clock.elapsed);
        if let Err(err) = &result {
            tracing::debug!(%err, "research advance rejected");
        }
        self.absorb_research_events();
        result
    }

    // -- Presentation flags --

    /// Flip the sound flag. The simulation never reads it.
    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn camera(&self) -> GridPosition {
        self.camera
    }

    pub fn set_camera(&mut self, camera: GridPosition) {
        self.camera = camera;
    }

    pub fn spawn(&self) -> GridPosition {
        self.config.spawn
    }

    pub fn tutorial_completed(&self) -> bool {
        self.tutorial_completed
    }

    pub fn set_tutorial_completed(&mut self, done: bool) {
        self.tutorial_completed = done;
    }

    /// Back to the configured starting state. The sound flag survives.
    pub fn reset(&mut self) {
        self.grid.clear();
        self.ledger = self.config.starting_ledger();
        self.research.reset();
        self.power = PowerGrid::new();
        self.clock = SimClock::new();
        self.events.clear();
        self.selection = None;
        self.camera = self.config.spawn;
        self.tutorial_completed = false;
        tracing::info!("game reset");
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Drain every event buffered since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[GameEvent] {
        &self.events
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn grid(&self) -> &GridIndex {
        &self.grid
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn research(&self) -> &ResearchController {
        &self.research
    }

    pub fn power(&self) -> &PowerGrid {
        &self.power
    }

    pub fn clock(&self) -> SimClock {
        self.clock
    }
}
