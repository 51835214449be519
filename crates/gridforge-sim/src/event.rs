//! Events the engine buffers for the presentation layer.
//!
//! Commands and ticks push [`GameEvent`]s into the engine's buffer; the
//! caller drains them after each frame to play sounds and refresh panels.
//! Power and research events are wrapped as they come out of their
//! subsystems.

use gridforge_core::id::{BuildingKind, Resource};
use gridforge_core::rotation::Rotation;
use gridforge_power::PowerEvent;
use gridforge_research::ResearchEvent;
use gridforge_spatial::GridPosition;

/// Why a placement was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("cell is already occupied")]
    Occupied,
    #[error("{0:?} is not unlocked yet")]
    Locked(BuildingKind),
    #[error("cannot afford {0:?}")]
    Unaffordable(BuildingKind),
    #[error("no building kind is selected")]
    NothingSelected,
}

/// Something the presentation layer may want to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    BuildingPlaced {
        kind: BuildingKind,
        position: GridPosition,
        rotation: Rotation,
    },
    BuildingRemoved {
        kind: BuildingKind,
        position: GridPosition,
        /// Whole units credited back.
        refund: Vec<(Resource, u32)>,
    },
    PlacementRejected {
        kind: Option<BuildingKind>,
        position: GridPosition,
        reason: PlacementError,
    },
    /// A submitter took an item off the grid into the ledger.
    ItemCollected {
        resource: Resource,
        position: GridPosition,
    },
    /// First time this resource was produced or became producible.
    ItemDiscovered { resource: Resource },
    Research(ResearchEvent),
    Power(PowerEvent),
}
