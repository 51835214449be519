//! The building catalog: immutable per-kind metadata consulted by the
//! simulation but never simulated itself.
//!
//! [`Catalog::standard`] is the shipped table, indexed by kind.

use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, f64_to_fixed64, units};
use crate::id::{BuildingKind, Resource};
use crate::rotation::{Direction, Rotation, rotate_all};

// ---------------------------------------------------------------------------
// Cost
// ---------------------------------------------------------------------------

/// A build cost: one or more whole-unit resource amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cost(pub Vec<(Resource, u32)>);

impl Cost {
    pub fn single(resource: Resource, amount: u32) -> Self {
        Self(vec![(resource, amount)])
    }

    pub fn entries(&self) -> &[(Resource, u32)] {
        &self.0
    }

    /// Half of each component, rounded down. Zero entries are dropped.
    pub fn refund(&self) -> Vec<(Resource, u32)> {
        self.0
            .iter()
            .map(|&(r, n)| (r, n / 2))
            .filter(|&(_, n)| n > 0)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Behaviour
// ---------------------------------------------------------------------------

/// Burned by a generator while it produces power.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fuel {
    pub resource: Resource,
    /// Units burned per second of operation.
    pub per_second: Fixed64,
}

/// Single-input conversion table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transform {
    /// `(input, output)` pairs, checked in order.
    pub conversions: Vec<(Resource, Resource)>,
    /// Output for any input not listed in `conversions`.
    pub fallback: Option<Resource>,
}

impl Transform {
    /// What `input` turns into, or `None` if this transform rejects it.
    pub fn output_for(&self, input: Resource) -> Option<Resource> {
        self.conversions
            .iter()
            .find(|(from, _)| *from == input)
            .map(|&(_, to)| to)
            .or(self.fallback)
    }
}

/// Two-input recipe: `primary` rests on the building's own cell,
/// `secondary` on an adjacent input-port cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyRecipe {
    pub primary: Resource,
    pub secondary: Resource,
    pub output: Resource,
}

/// Which update rule a kind runs each tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    /// Emits one `product` per cycle, no input.
    Miner { product: Resource },
    /// Moves the item on its cell one cell forward every `1 / speed` seconds.
    Conveyor { speed: Fixed64 },
    Transform(Transform),
    Assemble(AssemblyRecipe),
    /// Copies its item to every free output at once.
    Splitter,
    /// FIFO buffer holding up to `capacity` items.
    Storage { capacity: u32 },
    /// Adds `points` research points per cycle.
    Lab { points: u64 },
    /// Collects any item on its cell into the ledger.
    Submitter,
    /// Power producer; handled by the power pass, not the production pass.
    Generator,
    /// Credits one unit of each of `yields` per cycle.
    TimeMachine { yields: Vec<Resource> },
}

// ---------------------------------------------------------------------------
// Building spec
// ---------------------------------------------------------------------------

/// Metadata for one building kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingSpec {
    pub kind: BuildingKind,
    pub name: String,
    pub cost: Cost,
    /// Input ports in canonical orientation, in scan order.
    pub inputs: Vec<Direction>,
    /// Output ports in canonical orientation, in scan order.
    pub outputs: Vec<Direction>,
    /// Units (items, research cycles) per second. Zero for kinds without
    /// a rate gate.
    pub rate: Fixed64,
    pub power_consumption: Option<Fixed64>,
    pub power_production: Option<Fixed64>,
    pub fuel: Option<Fuel>,
    pub behavior: Behavior,
}

impl BuildingSpec {
    /// Whether this kind draws from the power grid.
    pub fn consumes_power(&self) -> bool {
        self.power_consumption.is_some_and(|p| p > Fixed64::ZERO)
    }

    /// The multiplier applied to this kind's rate under the given grid
    /// efficiency. Unpowered kinds always run at full speed.
    pub fn efficiency_factor(&self, grid_efficiency: Fixed64) -> Fixed64 {
        if self.consumes_power() {
            grid_efficiency
        } else {
            Fixed64::ONE
        }
    }

    pub fn rotated_inputs(&self, rotation: Rotation) -> Vec<Direction> {
        rotate_all(&self.inputs, rotation)
    }

    pub fn rotated_outputs(&self, rotation: Rotation) -> Vec<Direction> {
        rotate_all(&self.outputs, rotation)
    }

    /// Resources this kind can put into the world.
    pub fn yields(&self) -> Vec<Resource> {
        match &self.behavior {
            Behavior::Miner { product } => vec![*product],
            Behavior::Transform(t) => {
                let mut out: Vec<Resource> = t.conversions.iter().map(|&(_, to)| to).collect();
                out.extend(t.fallback);
                out.dedup();
                out
            }
            Behavior::Assemble(recipe) => vec![recipe.output],
            Behavior::TimeMachine { yields } => yields.clone(),
            _ => Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable catalog, indexed by [`BuildingKind::index`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    specs: Vec<BuildingSpec>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl Catalog {
    /// The shipped building table.
    pub fn standard() -> Self {
        Self {
            specs: BuildingKind::ALL.iter().map(|&k| standard_spec(k)).collect(),
        }
    }

    pub fn get(&self, kind: BuildingKind) -> &BuildingSpec {
        &self.specs[kind.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuildingSpec> {
        self.specs.iter()
    }
}

// ---------------------------------------------------------------------------
// Standard table
// ---------------------------------------------------------------------------

/// Resources a time machine hands out each cycle.
pub const TIME_MACHINE_YIELDS: [Resource; 10] = [
    Resource::Iron,
    Resource::Copper,
    Resource::IronRod,
    Resource::CopperRod,
    Resource::Steel,
    Resource::Gear,
    Resource::Circuit,
    Resource::Motor,
    Resource::Computer,
    Resource::Robot,
];

const ALL_SIDES: [Direction; 4] = [
    Direction::Left,
    Direction::Up,
    Direction::Down,
    Direction::Right,
];

fn spec(kind: BuildingKind, name: &str, cost: Cost, behavior: Behavior) -> BuildingSpec {
    BuildingSpec {
        kind,
        name: name.to_string(),
        cost,
        inputs: Vec::new(),
        outputs: Vec::new(),
        rate: Fixed64::ZERO,
        power_consumption: None,
        power_production: None,
        fuel: None,
        behavior,
    }
}

fn ports(mut s: BuildingSpec, inputs: &[Direction], outputs: &[Direction]) -> BuildingSpec {
    s.inputs = inputs.to_vec();
    s.outputs = outputs.to_vec();
    s
}

fn rated(mut s: BuildingSpec, rate: f64) -> BuildingSpec {
    s.rate = f64_to_fixed64(rate);
    s
}

fn powered(mut s: BuildingSpec, consumption: u32) -> BuildingSpec {
    s.power_consumption = Some(units(consumption));
    s
}

fn generator(mut s: BuildingSpec, production: u32, fuel: Option<(Resource, f64)>) -> BuildingSpec {
    s.power_production = Some(units(production));
    s.fuel = fuel.map(|(resource, per_second)| Fuel {
        resource,
        per_second: f64_to_fixed64(per_second),
    });
    s
}

fn miner(kind: BuildingKind, name: &str, cost: Cost, product: Resource, rate: f64) -> BuildingSpec {
    rated(
        ports(spec(kind, name, cost, Behavior::Miner { product }), &[], &[Direction::Right]),
        rate,
    )
}

fn assembler(
    kind: BuildingKind,
    name: &str,
    iron: u32,
    inputs: &[Direction],
    (primary, secondary, output): (Resource, Resource, Resource),
    rate: f64,
    power: u32,
) -> BuildingSpec {
    let behavior = Behavior::Assemble(AssemblyRecipe {
        primary,
        secondary,
        output,
    });
    powered(
        rated(
            ports(
                spec(kind, name, Cost::single(Resource::Iron, iron), behavior),
                inputs,
                &[Direction::Right],
            ),
            rate,
        ),
        power,
    )
}

fn standard_spec(kind: BuildingKind) -> BuildingSpec {
    use BuildingKind as K;
    use Direction::{Down, Left, Right, Up};
    use Resource as R;

    match kind {
        K::IronMiner => miner(kind, "Iron Miner", Cost::single(R::Iron, 5), R::Iron, 1.0),
        K::CopperMiner => miner(kind, "Copper Miner", Cost::single(R::Iron, 10), R::Copper, 0.8),
        K::CoalMiner => miner(
            kind,
            "Coal Miner",
            Cost(vec![(R::Iron, 10), (R::Copper, 5)]),
            R::Coal,
            0.5,
        ),
        K::GoldMiner => powered(
            miner(kind, "Gold Miner", Cost(vec![(R::Iron, 20), (R::Copper, 10)]), R::Gold, 0.5),
            2,
        ),
        K::AdvancedMiner => powered(
            miner(kind, "Advanced Miner", Cost::single(R::Iron, 15), R::Iron, 2.0),
            4,
        ),
        K::UraniumMiner => powered(
            miner(
                kind,
                "Uranium Miner",
                Cost(vec![(R::Iron, 20), (R::Steel, 5)]),
                R::Uranium,
                0.2,
            ),
            3,
        ),
        K::Conveyor => ports(
            spec(
                kind,
                "Conveyor Belt",
                Cost::single(R::Iron, 1),
                Behavior::Conveyor { speed: units(1) },
            ),
            &[Left],
            &[Right],
        ),
        K::Roller => rated(
            ports(
                spec(
                    kind,
                    "Roller",
                    Cost::single(R::Copper, 7),
                    Behavior::Transform(Transform {
                        conversions: vec![(R::Iron, R::IronRod), (R::Copper, R::CopperRod)],
                        fallback: None,
                    }),
                ),
                &[Left],
                &[Right],
            ),
            0.5,
        ),
        K::Furnace => powered(
            rated(
                ports(
                    spec(
                        kind,
                        "Furnace",
                        Cost::single(R::Iron, 5),
                        Behavior::Transform(Transform {
                            conversions: vec![(R::Iron, R::Steel)],
                            fallback: None,
                        }),
                    ),
                    &[Left],
                    &[Right],
                ),
                0.3,
            ),
            3,
        ),
        K::Assembler => assembler(
            kind,
            "Assembler",
            8,
            &[Left, Up],
            (R::IronRod, R::CopperRod, R::Gear),
            0.2,
            2,
        ),
        K::Factory => powered(
            rated(
                ports(
                    spec(
                        kind,
                        "Advanced Factory",
                        Cost::single(R::Iron, 25),
                        Behavior::Transform(Transform {
                            conversions: Vec::new(),
                            fallback: Some(R::Gear),
                        }),
                    ),
                    &[Left, Up],
                    &[Right],
                ),
                1.0,
            ),
            5,
        ),
        K::CircuitFactory => assembler(
            kind,
            "Circuit Factory",
            12,
            &[Left, Up],
            (R::Copper, R::Steel, R::Circuit),
            0.3,
            4,
        ),
        K::MotorFactory => assembler(
            kind,
            "Motor Factory",
            15,
            &[Left, Up],
            (R::Steel, R::Gear, R::Motor),
            0.2,
            4,
        ),
        K::ComputerFactory => assembler(
            kind,
            "Computer Factory",
            30,
            &[Left, Up, Down],
            (R::Circuit, R::Motor, R::Computer),
            0.1,
            6,
        ),
        K::RobotFactory => assembler(
            kind,
            "Robot Factory",
            40,
            &[Left, Up, Down],
            (R::Computer, R::Motor, R::Robot),
            0.05,
            8,
        ),
        K::Splitter => ports(
            spec(kind, "Item Splitter", Cost::single(R::Iron, 5), Behavior::Splitter),
            &[Left],
            &[Right, Up, Down],
        ),
        K::Storage => ports(
            spec(
                kind,
                "Storage Container",
                Cost::single(R::Iron, 3),
                Behavior::Storage { capacity: 10 },
            ),
            &ALL_SIDES,
            &ALL_SIDES,
        ),
        K::Submitter => ports(
            spec(kind, "Resource Submitter", Cost::single(R::Iron, 2), Behavior::Submitter),
            &ALL_SIDES,
            &[],
        ),
        K::Lab => powered(
            rated(
                ports(
                    spec(kind, "Research Lab", Cost::single(R::Iron, 20), Behavior::Lab { points: 1 }),
                    &[Left, Up, Down],
                    &[Right],
                ),
                0.1,
            ),
            2,
        ),
        K::QuantumLab => powered(
            rated(
                ports(
                    spec(
                        kind,
                        "Quantum Lab",
                        Cost(vec![(R::Iron, 50), (R::Gold, 10)]),
                        Behavior::Lab { points: 10 },
                    ),
                    &ALL_SIDES,
                    &[],
                ),
                0.01,
            ),
            10,
        ),
        K::TimeMachine => powered(
            rated(
                ports(
                    spec(
                        kind,
                        "Time Machine",
                        Cost(vec![(R::Iron, 100), (R::Gold, 20)]),
                        Behavior::TimeMachine {
                            yields: TIME_MACHINE_YIELDS.to_vec(),
                        },
                    ),
                    &ALL_SIDES,
                    &[],
                ),
                0.001,
            ),
            20,
        ),
        K::CoalGenerator => generator(
            spec(
                kind,
                "Coal Generator",
                Cost(vec![(R::Iron, 15), (R::Copper, 5)]),
                Behavior::Generator,
            ),
            10,
            Some((R::Coal, 0.1)),
        ),
        K::SolarPanel => generator(
            spec(
                kind,
                "Solar Panel",
                Cost(vec![(R::Iron, 10), (R::Copper, 10)]),
                Behavior::Generator,
            ),
            2,
            None,
        ),
        K::NuclearReactor => generator(
            spec(
                kind,
                "Nuclear Reactor",
                Cost(vec![(R::Steel, 20), (R::Gold, 5)]),
                Behavior::Generator,
            ),
            50,
            Some((R::Uranium, 0.01)),
        ),
    }
}
