//! Per-kind update rules.
//!
//! Every rule runs once per building per tick, in placement order, against
//! a [`TickContext`] that borrows the grid, the ledger and the research
//! controller. The building's own [`BuildingState`] is handed in separately
//! (the engine moves it out of the grid for the duration of the call).
//!
//! Shared conventions:
//!
//! - A cell accepts an emitted item iff it holds no item and is not a full
//!   storage container.
//! - Rate gates complete when `elapsed * rate * efficiency >= 1`; only kinds
//!   that draw power see the grid efficiency.
//! - A finished unit that cannot be emitted is held: the timer keeps
//!   running and no input is consumed until an output cell frees up.

use std::collections::VecDeque;

use gridforge_core::catalog::{AssemblyRecipe, Behavior, BuildingSpec, Catalog, Transform};
use gridforge_core::fixed::{Fixed64, Seconds, cycle_complete};
use gridforge_core::id::Resource;
use gridforge_core::ledger::ResourceLedger;
use gridforge_core::rotation::Rotation;
use gridforge_research::ResearchController;
use gridforge_spatial::{BuildingState, GridIndex, GridPosition, Item};

use crate::event::GameEvent;

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Everything a rule may touch besides its own state.
pub(crate) struct TickContext<'a> {
    pub catalog: &'a Catalog,
    pub grid: &'a mut GridIndex,
    pub ledger: &'a mut ResourceLedger,
    pub research: &'a mut ResearchController,
    pub events: &'a mut Vec<GameEvent>,
    pub dt: Seconds,
    /// Simulation time at the end of this tick.
    pub now: Seconds,
    /// Grid efficiency settled for this tick.
    pub efficiency: Fixed64,
}

/// The building being updated.
pub(crate) struct Unit<'s> {
    pub position: GridPosition,
    pub rotation: Rotation,
    pub spec: &'s BuildingSpec,
}

impl Unit<'_> {
    fn cycle_done(&self, elapsed: Seconds, efficiency: Fixed64) -> bool {
        cycle_complete(elapsed, self.spec.rate, self.spec.efficiency_factor(efficiency))
    }
}

/// The state a freshly placed building of this spec starts in.
pub(crate) fn initial_state(spec: &BuildingSpec) -> BuildingState {
    match spec.behavior {
        Behavior::Miner { .. } | Behavior::Lab { .. } | Behavior::TimeMachine { .. } => {
            BuildingState::Charging {
                elapsed: Fixed64::ZERO,
            }
        }
        Behavior::Transform(_) | Behavior::Assemble(_) => BuildingState::Idle,
        Behavior::Storage { .. } => BuildingState::Storage {
            queue: VecDeque::new(),
        },
        Behavior::Conveyor { .. } | Behavior::Splitter | Behavior::Submitter | Behavior::Generator => {
            BuildingState::Passive
        }
    }
}

/// Run one tick of `unit`'s rule.
pub(crate) fn update(ctx: &mut TickContext<'_>, unit: &Unit<'_>, state: &mut BuildingState) {
    match &unit.spec.behavior {
        Behavior::Miner { product } => run_miner(ctx, unit, state, *product),
        Behavior::Conveyor { speed } => run_conveyor(ctx, unit, *speed),
        Behavior::Transform(transform) => run_transform(ctx, unit, state, transform),
        Behavior::Assemble(recipe) => run_assembler(ctx, unit, state, recipe),
        Behavior::Splitter => run_splitter(ctx, unit),
        Behavior::Storage { capacity } => run_storage(ctx, unit, state, *capacity),
        Behavior::Lab { points } => run_lab(ctx, unit, state, *points),
        Behavior::Submitter => run_submitter(ctx, unit),
        Behavior::TimeMachine { yields } => run_time_machine(ctx, unit, state, yields),
        // Generators only act in the power pass.
        Behavior::Generator => {}
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Whether an item may be put on `pos`.
pub(crate) fn accepts(grid: &GridIndex, catalog: &Catalog, pos: GridPosition) -> bool {
    if grid.has_item(pos) {
        return false;
    }
    let Some(building) = grid.building_at(pos) else {
        return true;
    };
    match (&catalog.get(building.kind).behavior, &building.state) {
        (Behavior::Storage { capacity }, BuildingState::Storage { queue }) => {
            queue.len() < *capacity as usize
        }
        _ => true,
    }
}

/// Mark `resource` discovered, announcing it the first time.
pub(crate) fn discover(ledger: &mut ResourceLedger, events: &mut Vec<GameEvent>, resource: Resource) {
    if ledger.discover(resource) {
        tracing::info!(?resource, "item discovered");
        events.push(GameEvent::ItemDiscovered { resource });
    }
}

/// Put a new `resource` item on `pos` if it accepts one.
fn emit(ctx: &mut TickContext<'_>, pos: GridPosition, resource: Resource) -> bool {
    if !accepts(ctx.grid, ctx.catalog, pos) || ctx.grid.put_item(pos, Item::new(resource)).is_err() {
        return false;
    }
    discover(ctx.ledger, ctx.events, resource);
    true
}

/// Emit through the first accepting output port, scanning in rotated order.
fn emit_first(ctx: &mut TickContext<'_>, unit: &Unit<'_>, resource: Resource) -> bool {
    unit.spec
        .rotated_outputs(unit.rotation)
        .into_iter()
        .any(|dir| emit(ctx, unit.position.step(dir), resource))
}

/// The first input-port cell holding `resource`, scanning in rotated order.
fn find_input(grid: &GridIndex, unit: &Unit<'_>, resource: Resource) -> Option<GridPosition> {
    unit.spec
        .rotated_inputs(unit.rotation)
        .into_iter()
        .map(|dir| unit.position.step(dir))
        .find(|&pos| grid.item_at(pos).is_some_and(|item| item.resource == resource))
}

/// The charge timer of a rate-gated emitter, repairing a mismatched state.
fn charging(state: &mut BuildingState) -> Option<&mut Seconds> {
    if !matches!(state, BuildingState::Charging { .. }) {
        *state = BuildingState::Charging {
            elapsed: Fixed64::ZERO,
        };
    }
    match state {
        BuildingState::Charging { elapsed } => Some(elapsed),
        _ => None,
    }
}

/// Advance a charge timer by `dt` and report whether a cycle is ready.
fn charge(ctx: &TickContext<'_>, unit: &Unit<'_>, elapsed: &mut Seconds) -> bool {
    *elapsed = elapsed.saturating_add(ctx.dt);
    unit.cycle_done(*elapsed, ctx.efficiency)
}

/// Advance a processor's work timer. Returns the input being worked on
/// once the cycle is complete.
fn work(ctx: &TickContext<'_>, unit: &Unit<'_>, state: &mut BuildingState) -> Option<Resource> {
    let BuildingState::Working { input, elapsed } = state else {
        return None;
    };
    *elapsed = elapsed.saturating_add(ctx.dt);
    unit.cycle_done(*elapsed, ctx.efficiency).then_some(*input)
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

fn run_miner(ctx: &mut TickContext<'_>, unit: &Unit<'_>, state: &mut BuildingState, product: Resource) {
    let Some(elapsed) = charging(state) else {
        return;
    };
    if charge(ctx, unit, elapsed) && emit_first(ctx, unit, product) {
        *elapsed = Fixed64::ZERO;
    }
}

fn run_conveyor(ctx: &mut TickContext<'_>, unit: &Unit<'_>, speed: Fixed64) {
    let pos = unit.position;
    let Some(item) = ctx.grid.item_at_mut(pos) else {
        return;
    };
    // Progress saturates at 1 while the belt is blocked, so a stalled item
    // leaves on the first tick its destination frees up.
    item.progress = item
        .progress
        .saturating_add(speed.saturating_mul(ctx.dt))
        .min(Fixed64::ONE);
    if item.progress < Fixed64::ONE {
        return;
    }
    for dir in unit.spec.rotated_outputs(unit.rotation) {
        let dest = pos.step(dir);
        if accepts(ctx.grid, ctx.catalog, dest) && ctx.grid.move_item(pos, dest).is_ok() {
            return;
        }
    }
}

fn run_transform(
    ctx: &mut TickContext<'_>,
    unit: &Unit<'_>,
    state: &mut BuildingState,
    transform: &Transform,
) {
    let pos = unit.position;
    if !state.is_working() {
        let accepted = ctx
            .grid
            .item_at(pos)
            .map(|item| item.resource)
            .filter(|&r| transform.output_for(r).is_some());
        let Some(input) = accepted else {
            *state = BuildingState::Idle;
            return;
        };
        *state = BuildingState::Working {
            input,
            elapsed: Fixed64::ZERO,
        };
    }

    let Some(input) = work(ctx, unit, state) else {
        return;
    };
    let still_there = ctx.grid.item_at(pos).is_some_and(|item| item.resource == input);
    let Some(output) = transform.output_for(input).filter(|_| still_there) else {
        *state = BuildingState::Idle;
        return;
    };
    if emit_first(ctx, unit, output) {
        ctx.grid.take_item(pos);
        *state = BuildingState::Idle;
    }
}

fn run_assembler(
    ctx: &mut TickContext<'_>,
    unit: &Unit<'_>,
    state: &mut BuildingState,
    recipe: &AssemblyRecipe,
) {
    let pos = unit.position;
    let primary_here = |grid: &GridIndex| {
        grid.item_at(pos)
            .is_some_and(|item| item.resource == recipe.primary)
    };

    if !state.is_working() {
        if !primary_here(ctx.grid) || find_input(ctx.grid, unit, recipe.secondary).is_none() {
            *state = BuildingState::Idle;
            return;
        }
        *state = BuildingState::Working {
            input: recipe.primary,
            elapsed: Fixed64::ZERO,
        };
    }

    if work(ctx, unit, state).is_none() {
        return;
    }
    if !primary_here(ctx.grid) {
        *state = BuildingState::Idle;
        return;
    }
    // Secondary missing: hold until one arrives.
    let Some(secondary) = find_input(ctx.grid, unit, recipe.secondary) else {
        return;
    };
    if emit_first(ctx, unit, recipe.output) {
        ctx.grid.take_item(pos);
        ctx.grid.take_item(secondary);
        *state = BuildingState::Idle;
    }
}

fn run_splitter(ctx: &mut TickContext<'_>, unit: &Unit<'_>) {
    let pos = unit.position;
    let Some(resource) = ctx.grid.item_at(pos).map(|item| item.resource) else {
        return;
    };
    let mut delivered = 0;
    for dir in unit.spec.rotated_outputs(unit.rotation) {
        if emit(ctx, pos.step(dir), resource) {
            delivered += 1;
        }
    }
    if delivered > 0 {
        ctx.grid.take_item(pos);
    }
}

fn run_storage(ctx: &mut TickContext<'_>, unit: &Unit<'_>, state: &mut BuildingState, capacity: u32) {
    if !matches!(state, BuildingState::Storage { .. }) {
        *state = BuildingState::Storage {
            queue: VecDeque::new(),
        };
    }
    let BuildingState::Storage { queue } = state else {
        return;
    };

    let pos = unit.position;
    if queue.len() < capacity as usize {
        if let Some(item) = ctx.grid.take_item(pos) {
            queue.push_back(item.resource);
        }
    }

    let Some(&head) = queue.front() else {
        return;
    };
    for dir in unit.spec.rotated_outputs(unit.rotation) {
        if emit(ctx, pos.step(dir), head) {
            queue.pop_front();
            return;
        }
    }
}

fn run_lab(ctx: &mut TickContext<'_>, unit: &Unit<'_>, state: &mut BuildingState, points: u64) {
    let Some(elapsed) = charging(state) else {
        return;
    };
    if !charge(ctx, unit, elapsed) {
        return;
    }
    *elapsed = Fixed64::ZERO;
    ctx.research.add_progress(points);
    ctx.research.check_advancement(ctx.ledger, ctx.now);
}

fn run_submitter(ctx: &mut TickContext<'_>, unit: &Unit<'_>) {
    let Some(item) = ctx.grid.take_item(unit.position) else {
        return;
    };
    ctx.ledger.credit_units(item.resource, 1);
    discover(ctx.ledger, ctx.events, item.resource);
    ctx.events.push(GameEvent::ItemCollected {
        resource: item.resource,
        position: unit.position,
    });
}

fn run_time_machine(
    ctx: &mut TickContext<'_>,
    unit: &Unit<'_>,
    state: &mut BuildingState,
    yields: &[Resource],
) {
    let Some(elapsed) = charging(state) else {
        return;
    };
    if !charge(ctx, unit, elapsed) {
        return;
    }
    *elapsed = Fixed64::ZERO;
    for &resource in yields {
        ctx.ledger.credit_units(resource, 1);
        discover(ctx.ledger, ctx.events, resource);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridforge_core::id::BuildingKind;
    use gridforge_core::rotation::Direction;
    use gridforge_core::test_utils::fixed;
    use gridforge_spatial::Building;

    struct Harness {
        catalog: Catalog,
        grid: GridIndex,
        ledger: ResourceLedger,
        research: ResearchController,
        events: Vec<GameEvent>,
        now: Seconds,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                catalog: Catalog::standard(),
                grid: GridIndex::new(),
                ledger: ResourceLedger::new(),
                research: ResearchController::default(),
                events: Vec::new(),
                now: Fixed64::ZERO,
            }
        }

        fn place(&mut self, kind: BuildingKind, x: i32, y: i32, rotation: Rotation) {
            let state = initial_state(self.catalog.get(kind));
            self.grid
                .place(Building {
                    kind,
                    position: GridPosition::new(x, y),
                    rotation,
                    state,
                })
                .unwrap();
        }

        fn drop_item(&mut self, x: i32, y: i32, resource: Resource) {
            self.grid.put_item(GridPosition::new(x, y), Item::new(resource)).unwrap();
        }

        fn item(&self, x: i32, y: i32) -> Option<Resource> {
            self.grid.item_at(GridPosition::new(x, y)).map(|i| i.resource)
        }

        fn state(&self, x: i32, y: i32) -> BuildingState {
            self.grid.building_at(GridPosition::new(x, y)).unwrap().state.clone()
        }

        /// One tick over every building, mirroring the engine loop.
        fn tick(&mut self, dt: f64, efficiency: Fixed64) {
            let dt = fixed(dt);
            self.now += dt;
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
                    now: self.now,
                    efficiency,
                };
                update(&mut ctx, &unit, &mut state);
                if let Some(building) = self.grid.get_mut(id) {
                    building.state = state;
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Test 1: Miner emits once per 1/rate seconds
    // -----------------------------------------------------------------------
    #[test]
    fn miner_emits_after_one_period() {
        let mut h = Harness::new();
        h.place(BuildingKind::IronMiner, 0, 0, Rotation::None);
        for _ in 0..3 {
            h.tick(0.25, Fixed64::ONE);
        }
        assert_eq!(h.item(1, 0), None);
        h.tick(0.25, Fixed64::ONE);
        assert_eq!(h.item(1, 0), Some(Resource::Iron));
        assert_eq!(h.state(0, 0), BuildingState::Charging { elapsed: Fixed64::ZERO });
    }

    // -----------------------------------------------------------------------
    // Test 2: Miner holds when blocked and emits the tick the cell frees
    // -----------------------------------------------------------------------
    #[test]
    fn miner_holds_when_blocked() {
        let mut h = Harness::new();
        h.place(BuildingKind::IronMiner, 0, 0, Rotation::Cw90);
        h.drop_item(0, 1, Resource::Copper);
        for _ in 0..12 {
            h.tick(0.25, Fixed64::ONE);
        }
        assert_eq!(h.item(0, 1), Some(Resource::Copper));
        assert_eq!(h.state(0, 0), BuildingState::Charging { elapsed: fixed(3.0) });

        h.grid.take_item(GridPosition::new(0, 1));
        h.tick(0.25, Fixed64::ONE);
        assert_eq!(h.item(0, 1), Some(Resource::Iron));
    }

    // -----------------------------------------------------------------------
    // Test 3: Conveyor moves after 1/speed seconds and stalls in place
    // -----------------------------------------------------------------------
    #[test]
    fn conveyor_moves_then_stalls() {
        let mut h = Harness::new();
        h.place(BuildingKind::Conveyor, 0, 0, Rotation::None);
        h.drop_item(0, 0, Resource::Iron);
        h.drop_item(1, 0, Resource::Gear);

        for _ in 0..8 {
            h.tick(0.25, Fixed64::ONE);
        }
        let stalled = h.grid.item_at(GridPosition::new(0, 0)).copied().unwrap();
        assert_eq!(stalled.resource, Resource::Iron);
        assert_eq!(stalled.progress, Fixed64::ONE);

        h.grid.take_item(GridPosition::new(1, 0));
        h.tick(0.25, Fixed64::ONE);
        assert_eq!(h.item(0, 0), None);
        let moved = h.grid.item_at(GridPosition::new(1, 0)).copied().unwrap();
        assert_eq!(moved, Item::new(Resource::Iron));
    }

    // -----------------------------------------------------------------------
    // Test 4: Conveyor does not push into a full storage
    // -----------------------------------------------------------------------
    #[test]
    fn conveyor_respects_full_storage() {
        let mut h = Harness::new();
        h.place(BuildingKind::Conveyor, 0, 0, Rotation::None);
        h.place(BuildingKind::Storage, 1, 0, Rotation::None);
        if let Some(b) = h.grid.building_at_mut(GridPosition::new(1, 0)) {
            b.state = BuildingState::Storage {
                queue: std::iter::repeat_n(Resource::Iron, 10).collect(),
            };
        }
        // Surround the storage so it cannot unload.
        for (x, y) in [(2, 0), (1, -1), (1, 1)] {
            h.drop_item(x, y, Resource::Gear);
        }
        h.drop_item(0, 0, Resource::Copper);

        for _ in 0..8 {
            h.tick(0.25, Fixed64::ONE);
        }
        assert_eq!(h.item(0, 0), Some(Resource::Copper));
        assert_eq!(h.item(1, 0), None);
    }

    // -----------------------------------------------------------------------
    // Test 5: Roller conserves items and rejects unknown inputs
    // -----------------------------------------------------------------------
    #[test]
    fn roller_converts_one_for_one() {
        let mut h = Harness::new();
        h.place(BuildingKind::Roller, 0, 0, Rotation::None);
        h.drop_item(0, 0, Resource::Copper);

        // rate 0.5: two seconds
        for _ in 0..7 {
            h.tick(0.25, Fixed64::ONE);
        }
        assert_eq!(h.item(0, 0), Some(Resource::Copper));
        assert_eq!(h.item(1, 0), None);
        h.tick(0.25, Fixed64::ONE);
        assert_eq!(h.item(0, 0), None);
        assert_eq!(h.item(1, 0), Some(Resource::CopperRod));
        assert_eq!(h.grid.item_count(), 1);
        assert!(h.ledger.is_discovered(Resource::CopperRod));
    }

    #[test]
    fn roller_ignores_steel() {
        let mut h = Harness::new();
        h.place(BuildingKind::Roller, 0, 0, Rotation::None);
        h.drop_item(0, 0, Resource::Steel);
        for _ in 0..20 {
            h.tick(0.25, Fixed64::ONE);
        }
        assert_eq!(h.state(0, 0), BuildingState::Idle);
        assert_eq!(h.item(0, 0), Some(Resource::Steel));
        assert_eq!(h.item(1, 0), None);
    }

    // -----------------------------------------------------------------------
    // Test 6: Furnace never completes at zero efficiency
    // -----------------------------------------------------------------------
    #[test]
    fn furnace_stalls_without_power() {
        let mut h = Harness::new();
        h.place(BuildingKind::Furnace, 0, 0, Rotation::None);
        h.drop_item(0, 0, Resource::Iron);
        for _ in 0..400 {
            h.tick(0.25, Fixed64::ZERO);
        }
        assert!(h.state(0, 0).is_working());
        assert_eq!(h.item(0, 0), Some(Resource::Iron));
        assert_eq!(h.item(1, 0), None);
    }

    #[test]
    fn stalled_furnace_finishes_when_power_returns() {
        let mut h = Harness::new();
        h.place(BuildingKind::Furnace, 0, 0, Rotation::None);
        h.drop_item(0, 0, Resource::Iron);
        // Four dark seconds, longer than the 3.33 s nominal cycle.
        for _ in 0..16 {
            h.tick(0.25, Fixed64::ZERO);
        }
        assert_eq!(h.item(1, 0), None);

        // The stalled time still counts once the grid is back.
        h.tick(0.25, Fixed64::ONE);
        assert_eq!(h.item(1, 0), Some(Resource::Steel));
        assert_eq!(h.item(0, 0), None);
        assert_eq!(h.state(0, 0), BuildingState::Idle);
    }

    // -----------------------------------------------------------------------
    // Test 7: Held transform keeps its input and timer
    // -----------------------------------------------------------------------
    #[test]
    fn transform_holds_finished_unit() {
        let mut h = Harness::new();
        h.place(BuildingKind::Roller, 0, 0, Rotation::None);
        h.drop_item(0, 0, Resource::Iron);
        h.drop_item(1, 0, Resource::Gear);

        for _ in 0..40 {
            h.tick(0.25, Fixed64::ONE);
        }
        assert_eq!(
            h.state(0, 0),
            BuildingState::Working {
                input: Resource::Iron,
                elapsed: fixed(10.0),
            }
        );
        assert_eq!(h.item(0, 0), Some(Resource::Iron));

        h.grid.take_item(GridPosition::new(1, 0));
        h.tick(0.25, Fixed64::ONE);
        assert_eq!(h.item(1, 0), Some(Resource::IronRod));
        assert_eq!(h.item(0, 0), None);
        assert_eq!(h.state(0, 0), BuildingState::Idle);
    }

    // -----------------------------------------------------------------------
    // Test 8: Assembler needs both inputs and consumes both
    // -----------------------------------------------------------------------
    #[test]
    fn assembler_waits_for_secondary() {
        let mut h = Harness::new();
        h.place(BuildingKind::Assembler, 0, 0, Rotation::None);
        h.drop_item(0, 0, Resource::IronRod);
        for _ in 0..30 {
            h.tick(0.25, Fixed64::ONE);
        }
        assert_eq!(h.state(0, 0), BuildingState::Idle);

        // Up port (rotation 0) is (0, -1).
        h.drop_item(0, -1, Resource::CopperRod);
        // rate 0.2: five seconds
        for _ in 0..20 {
            h.tick(0.25, Fixed64::ONE);
        }
        assert_eq!(h.item(1, 0), Some(Resource::Gear));
        assert_eq!(h.item(0, 0), None);
        assert_eq!(h.item(0, -1), None);
    }

    #[test]
    fn assembler_holds_if_secondary_taken_mid_cycle() {
        let mut h = Harness::new();
        h.place(BuildingKind::Assembler, 0, 0, Rotation::None);
        h.drop_item(0, 0, Resource::IronRod);
        h.drop_item(-1, 0, Resource::CopperRod);
        h.tick(0.25, Fixed64::ONE);
        assert!(h.state(0, 0).is_working());

        h.grid.take_item(GridPosition::new(-1, 0));
        for _ in 0..30 {
            h.tick(0.25, Fixed64::ONE);
        }
        assert!(h.state(0, 0).is_working());
        assert_eq!(h.item(1, 0), None);
        assert_eq!(h.item(0, 0), Some(Resource::IronRod));

        h.drop_item(0, -1, Resource::CopperRod);
        h.tick(0.25, Fixed64::ONE);
        assert_eq!(h.item(1, 0), Some(Resource::Gear));
    }

    #[test]
    fn rotated_assembler_scans_rotated_ports() {
        let mut h = Harness::new();
        // Cw90: inputs left,up -> up,right; output right -> down.
        h.place(BuildingKind::Assembler, 0, 0, Rotation::Cw90);
        h.drop_item(0, 0, Resource::IronRod);
        h.drop_item(1, 0, Resource::CopperRod);
        for _ in 0..20 {
            h.tick(0.25, Fixed64::ONE);
        }
        assert_eq!(h.item(0, 1), Some(Resource::Gear));
        assert_eq!(h.item(1, 0), None);
    }

    // -----------------------------------------------------------------------
    // Test 9: Splitter broadcasts to every free output
    // -----------------------------------------------------------------------
    #[test]
    fn splitter_broadcasts() {
        let mut h = Harness::new();
        h.place(BuildingKind::Splitter, 0, 0, Rotation::None);
        h.drop_item(0, 0, Resource::Gear);
        h.drop_item(0, 1, Resource::Iron);
        h.tick(0.25, Fixed64::ONE);

        assert_eq!(h.item(0, 0), None);
        assert_eq!(h.item(1, 0), Some(Resource::Gear));
        assert_eq!(h.item(0, -1), Some(Resource::Gear));
        assert_eq!(h.item(0, 1), Some(Resource::Iron));
    }

    #[test]
    fn splitter_keeps_item_when_all_blocked() {
        let mut h = Harness::new();
        h.place(BuildingKind::Splitter, 0, 0, Rotation::None);
        h.drop_item(0, 0, Resource::Gear);
        for d in [Direction::Right, Direction::Up, Direction::Down] {
            let p = GridPosition::new(0, 0).step(d);
            h.drop_item(p.x, p.y, Resource::Iron);
        }
        h.tick(0.25, Fixed64::ONE);
        assert_eq!(h.item(0, 0), Some(Resource::Gear));
    }

    // -----------------------------------------------------------------------
    // Test 10: Storage is FIFO and unloads one item per tick
    // -----------------------------------------------------------------------
    #[test]
    fn storage_fifo() {
        let mut h = Harness::new();
        h.place(BuildingKind::Storage, 0, 0, Rotation::None);
        // Block up, down, right; leave left free.
        for (x, y) in [(0, -1), (0, 1), (1, 0)] {
            h.drop_item(x, y, Resource::Coal);
        }
        h.drop_item(0, 0, Resource::Iron);
        h.tick(0.25, Fixed64::ONE);
        assert_eq!(h.item(-1, 0), Some(Resource::Iron));

        h.grid.take_item(GridPosition::new(-1, 0));
        h.drop_item(-1, 0, Resource::Gold);
        h.drop_item(0, 0, Resource::Copper);
        h.tick(0.25, Fixed64::ONE);
        h.drop_item(0, 0, Resource::Steel);
        h.tick(0.25, Fixed64::ONE);
        assert_eq!(
            h.state(0, 0),
            BuildingState::Storage {
                queue: VecDeque::from(vec![Resource::Copper, Resource::Steel])
            }
        );

        h.grid.take_item(GridPosition::new(-1, 0));
        h.tick(0.25, Fixed64::ONE);
        assert_eq!(h.item(-1, 0), Some(Resource::Copper));
    }

    // -----------------------------------------------------------------------
    // Test 11: Submitter credits and announces
    // -----------------------------------------------------------------------
    #[test]
    fn submitter_collects_and_discovers() {
        let mut h = Harness::new();
        h.place(BuildingKind::Submitter, 0, 0, Rotation::None);
        h.drop_item(0, 0, Resource::Gold);
        h.tick(0.25, Fixed64::ONE);

        assert_eq!(h.item(0, 0), None);
        assert_eq!(h.ledger.amount(Resource::Gold), fixed(1.0));
        assert!(h.events.contains(&GameEvent::ItemDiscovered {
            resource: Resource::Gold
        }));
        assert!(h.events.contains(&GameEvent::ItemCollected {
            resource: Resource::Gold,
            position: GridPosition::new(0, 0),
        }));
    }

    // -----------------------------------------------------------------------
    // Test 12: Lab accrues points and triggers advancement
    // -----------------------------------------------------------------------
    #[test]
    fn lab_accrues_and_advances() {
        let mut h = Harness::new();
        h.place(BuildingKind::Lab, 0, 0, Rotation::None);
        h.ledger.credit_units(Resource::Iron, 10);

        // rate 0.1: ten seconds
        for _ in 0..39 {
            h.tick(0.25, Fixed64::ONE);
        }
        assert_eq!(h.research.level(), 0);
        h.tick(0.25, Fixed64::ONE);
        assert_eq!(h.research.level(), 1);
        assert_eq!(h.research.progress(), 0);
        assert_eq!(h.ledger.amount(Resource::Iron), Fixed64::ZERO);
    }

    #[test]
    fn lab_runs_at_half_speed_in_brownout() {
        let mut h = Harness::new();
        h.place(BuildingKind::Lab, 0, 0, Rotation::None);
        for _ in 0..40 {
            h.tick(0.25, fixed(0.5));
        }
        assert_eq!(h.research.progress(), 0);
        for _ in 0..40 {
            h.tick(0.25, fixed(0.5));
        }
        assert_eq!(h.research.progress(), 1);
    }

    #[test]
    fn quantum_lab_adds_ten_points_per_cycle() {
        let mut h = Harness::new();
        h.place(BuildingKind::QuantumLab, 0, 0, Rotation::None);
        // rate 0.01: one cycle per 100 s
        if let Some(b) = h.grid.building_at_mut(GridPosition::new(0, 0)) {
            b.state = BuildingState::Charging { elapsed: fixed(99.5) };
        }
        h.tick(0.25, Fixed64::ONE);
        assert_eq!(h.research.progress(), 0);
        h.tick(0.25, Fixed64::ONE);
        assert_eq!(h.research.progress(), 10);
        assert_eq!(h.state(0, 0), BuildingState::Charging { elapsed: Fixed64::ZERO });
        // Nothing to pay for tier 1, so the points stay on the counter.
        assert_eq!(h.research.level(), 0);
    }

    // -----------------------------------------------------------------------
    // Test 13: Time machine credits every listed resource
    // -----------------------------------------------------------------------
    #[test]
    fn time_machine_credits_everything() {
        let mut h = Harness::new();
        h.place(BuildingKind::TimeMachine, 0, 0, Rotation::None);
        let BuildingState::Charging { .. } = h.state(0, 0) else {
            panic!("time machine should charge");
        };
        // Skip most of the 1000 s period.
        if let Some(b) = h.grid.building_at_mut(GridPosition::new(0, 0)) {
            b.state = BuildingState::Charging { elapsed: fixed(999.75) };
        }
        h.tick(0.25, Fixed64::ONE);
        for r in gridforge_core::catalog::TIME_MACHINE_YIELDS {
            assert_eq!(h.ledger.amount(r), fixed(1.0), "{r:?}");
        }
        assert_eq!(h.ledger.amount(Resource::Coal), Fixed64::ZERO);
    }

    #[test]
    fn mismatched_state_is_repaired() {
        let mut h = Harness::new();
        h.place(BuildingKind::IronMiner, 0, 0, Rotation::None);
        if let Some(b) = h.grid.building_at_mut(GridPosition::new(0, 0)) {
            b.state = BuildingState::Idle;
        }
        h.tick(0.25, Fixed64::ONE);
        assert_eq!(h.state(0, 0), BuildingState::Charging { elapsed: fixed(0.25) });
    }
}
