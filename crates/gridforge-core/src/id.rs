use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a placed building inside the grid index.
    pub struct BuildingId;
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// A resource kind. Every in-transit item and every ledger counter is one
/// of these.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    Iron,
    Copper,
    Gold,
    Coal,
    Uranium,
    IronRod,
    CopperRod,
    Steel,
    Gear,
    Circuit,
    Motor,
    Computer,
    Robot,
}

impl Resource {
    /// All resource kinds in ledger display order.
    pub const ALL: [Resource; 13] = [
        Resource::Iron,
        Resource::Copper,
        Resource::Gold,
        Resource::Coal,
        Resource::Uranium,
        Resource::IronRod,
        Resource::CopperRod,
        Resource::Steel,
        Resource::Gear,
        Resource::Circuit,
        Resource::Motor,
        Resource::Computer,
        Resource::Robot,
    ];

    /// Human-readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            Resource::Iron => "Iron",
            Resource::Copper => "Copper",
            Resource::Gold => "Gold",
            Resource::Coal => "Coal",
            Resource::Uranium => "Uranium",
            Resource::IronRod => "Iron Rod",
            Resource::CopperRod => "Copper Rod",
            Resource::Steel => "Steel",
            Resource::Gear => "Gear",
            Resource::Circuit => "Circuit",
            Resource::Motor => "Motor",
            Resource::Computer => "Computer",
            Resource::Robot => "Robot",
        }
    }

    /// Stable index, used for hashing.
    pub fn index(self) -> u32 {
        self as u32
    }
}

// ---------------------------------------------------------------------------
// Building kinds
// ---------------------------------------------------------------------------

/// A building kind. Per-kind metadata lives in the catalog.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum BuildingKind {
    IronMiner,
    CopperMiner,
    CoalMiner,
    GoldMiner,
    AdvancedMiner,
    UraniumMiner,
    Conveyor,
    Roller,
    Furnace,
    Assembler,
    Factory,
    CircuitFactory,
    MotorFactory,
    ComputerFactory,
    RobotFactory,
    Splitter,
    Storage,
    Submitter,
    Lab,
    QuantumLab,
    TimeMachine,
    CoalGenerator,
    SolarPanel,
    NuclearReactor,
}

impl BuildingKind {
    /// Every building kind, in catalog order.
    pub const ALL: [BuildingKind; 24] = [
        BuildingKind::IronMiner,
        BuildingKind::CopperMiner,
        BuildingKind::CoalMiner,
        BuildingKind::GoldMiner,
        BuildingKind::AdvancedMiner,
        BuildingKind::UraniumMiner,
        BuildingKind::Conveyor,
        BuildingKind::Roller,
        BuildingKind::Furnace,
        BuildingKind::Assembler,
        BuildingKind::Factory,
        BuildingKind::CircuitFactory,
        BuildingKind::MotorFactory,
        BuildingKind::ComputerFactory,
        BuildingKind::RobotFactory,
        BuildingKind::Splitter,
        BuildingKind::Storage,
        BuildingKind::Submitter,
        BuildingKind::Lab,
        BuildingKind::QuantumLab,
        BuildingKind::TimeMachine,
        BuildingKind::CoalGenerator,
        BuildingKind::SolarPanel,
        BuildingKind::NuclearReactor,
    ];

    /// Position of this kind in [`BuildingKind::ALL`] and in the catalog.
    pub fn index(self) -> usize {
        self as usize
    }
}
