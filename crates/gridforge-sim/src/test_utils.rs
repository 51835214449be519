//! Shared helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use gridforge_core::fixed::{Fixed64, Seconds};
use gridforge_core::id::{BuildingKind, Resource};
use gridforge_core::ledger::ResourceLedger;
use gridforge_core::rotation::Rotation;
use gridforge_core::test_utils::rich_ledger;
use gridforge_research::{ResearchController, ResearchState};
use gridforge_spatial::{GridPosition, Item};

use crate::engine::Engine;

// ===========================================================================
// Time
// ===========================================================================

/// Frame delta used throughout the tests: four ticks per second.
pub const DT: f64 = 0.25;

pub fn dt() -> Seconds {
    Fixed64::from_num(DT)
}

/// Advance `engine` by `secs` seconds in steps of [`DT`].
pub fn run_for(engine: &mut Engine, secs: f64) {
    let ticks = (secs / DT).round() as u64;
    for _ in 0..ticks {
        engine.advance(dt());
    }
}

// ===========================================================================
// Layouts
// ===========================================================================

pub fn pos(x: i32, y: i32) -> GridPosition {
    GridPosition::new(x, y)
}

/// An engine with every tier researched and 10 000 of every resource.
pub fn sandbox() -> Engine {
    let mut engine = Engine::default();
    let max_level = engine.research.max_level();
    engine.research.restore(ResearchState {
        level: max_level,
        ..ResearchState::default()
    });
    engine.ledger = rich_ledger(10_000);
    engine
}

/// Iron miner at `origin` facing right, `belts` conveyors, then a
/// submitter. Panics if any placement fails.
pub fn starter_line(engine: &mut Engine, origin: GridPosition, belts: i32) {
    engine
        .place_building(origin, BuildingKind::IronMiner, Rotation::None)
        .expect("miner placement");
    for i in 1..=belts {
        engine
            .place_building(pos(origin.x + i, origin.y), BuildingKind::Conveyor, Rotation::None)
            .expect("conveyor placement");
    }
    engine
        .place_building(pos(origin.x + belts + 1, origin.y), BuildingKind::Submitter, Rotation::None)
        .expect("submitter placement");
}

// ===========================================================================
// Engine back doors
// ===========================================================================

impl Engine {
    pub fn ledger_mut(&mut self) -> &mut ResourceLedger {
        &mut self.ledger
    }

    pub fn research_mut(&mut self) -> &mut ResearchController {
        &mut self.research
    }

    /// Drop an item on `pos`. Panics if the cell already holds one.
    pub fn spawn_item(&mut self, pos: GridPosition, resource: Resource) {
        self.grid
            .put_item(pos, Item::new(resource))
            .expect("cell already holds an item");
    }
}
