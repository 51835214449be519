//! The grid: integer cells holding at most one building and at most one
//! in-transit item each.
//!
//! Buildings live in a slotmap keyed by [`BuildingId`] with a
//! position -> id tile map beside it, and an insertion-order list so a
//! tick visits buildings in the order they were placed. Items live in a
//! parallel position-keyed map. Every write checks occupancy first; the
//! index never silently overwrites.

use std::collections::{BTreeMap, VecDeque};

use gridforge_core::fixed::{Fixed64, Seconds};
use gridforge_core::id::{BuildingId, BuildingKind, Resource};
use gridforge_core::rotation::{Direction, Rotation};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A position on the 2D grid. `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The adjacent cell in `dir`.
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.offset();
        Self::new(self.x.wrapping_add(dx), self.y.wrapping_add(dy))
    }
}

/// An in-transit unit of one resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub resource: Resource,
    /// Transit completion along a conveyor. Meaningless on other buildings.
    pub progress: Fixed64,
}

impl Item {
    /// A freshly emitted item with zero progress.
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            progress: Fixed64::ZERO,
        }
    }
}

/// Per-building processing state. Which variant a building carries follows
/// from its kind's behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildingState {
    /// No internal state (conveyors, splitters, submitters, generators).
    Passive,
    /// Rate-gated emitter with no input (miners, labs, time machines):
    /// seconds accumulated since the last emission.
    Charging { elapsed: Seconds },
    /// Input-driven processor waiting for input.
    Idle,
    /// Input-driven processor with `input` taken in and `elapsed` seconds
    /// of work done on it.
    Working { input: Resource, elapsed: Seconds },
    /// FIFO buffer contents, head first.
    Storage { queue: VecDeque<Resource> },
}

impl BuildingState {
    pub fn is_working(&self) -> bool {
        matches!(self, BuildingState::Working { .. })
    }
}

/// A placed building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub kind: BuildingKind,
    pub position: GridPosition,
    pub rotation: Rotation,
    pub state: BuildingState,
}

/// Errors from grid writes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("a building already occupies ({}, {})", .0.x, .0.y)]
    BuildingOccupied(GridPosition),
    #[error("an item already occupies ({}, {})", .0.x, .0.y)]
    ItemOccupied(GridPosition),
    #[error("no building at ({}, {})", .0.x, .0.y)]
    NoBuilding(GridPosition),
    #[error("no item at ({}, {})", .0.x, .0.y)]
    NoItem(GridPosition),
}

// ---------------------------------------------------------------------------
// GridIndex
// ---------------------------------------------------------------------------

/// Owns every placed building and every in-transit item.
#[derive(Debug, Default, Clone)]
pub struct GridIndex {
    buildings: SlotMap<BuildingId, Building>,
    tiles: BTreeMap<GridPosition, BuildingId>,
    order: Vec<BuildingId>,
    items: BTreeMap<GridPosition, Item>,
}

impl GridIndex {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Buildings --

    /// Place a building on its own position.
    pub fn place(&mut self, building: Building) -> Result<BuildingId, GridError> {
        let pos = building.position;
        if self.tiles.contains_key(&pos) {
            return Err(GridError::BuildingOccupied(pos));
        }
        let id = self.buildings.insert(building);
        self.tiles.insert(pos, id);
        self.order.push(id);
        Ok(id)
    }

    /// Remove and return the building at `pos`. Items are left alone.
    pub fn remove(&mut self, pos: GridPosition) -> Result<Building, GridError> {
        let id = self.tiles.remove(&pos).ok_or(GridError::NoBuilding(pos))?;
        self.order.retain(|&other| other != id);
        self.buildings.remove(id).ok_or(GridError::NoBuilding(pos))
    }

    pub fn has_building(&self, pos: GridPosition) -> bool {
        self.tiles.contains_key(&pos)
    }

    pub fn building_id_at(&self, pos: GridPosition) -> Option<BuildingId> {
        self.tiles.get(&pos).copied()
    }

    pub fn building_at(&self, pos: GridPosition) -> Option<&Building> {
        self.tiles.get(&pos).and_then(|&id| self.buildings.get(id))
    }

    pub fn building_at_mut(&mut self, pos: GridPosition) -> Option<&mut Building> {
        let id = *self.tiles.get(&pos)?;
        self.buildings.get_mut(id)
    }

    pub fn get(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(id)
    }

    pub fn get_mut(&mut self, id: BuildingId) -> Option<&mut Building> {
        self.buildings.get_mut(id)
    }

    /// Building ids in placement order. The returned list is a snapshot:
    /// mutating the index while walking it is safe.
    pub fn ids_in_order(&self) -> Vec<BuildingId> {
        self.order.clone()
    }

    /// Buildings in placement order.
    pub fn buildings(&self) -> impl Iterator<Item = &Building> + '_ {
        self.order.iter().filter_map(|&id| self.buildings.get(id))
    }

    /// Buildings inside the inclusive rectangle `min..=max`, in
    /// x-then-y order.
    pub fn buildings_in_rect(&self, min: GridPosition, max: GridPosition) -> Vec<&Building> {
        self.tiles
            .range(min..=max)
            .filter(|(pos, _)| pos.y >= min.y && pos.y <= max.y)
            .filter_map(|(_, &id)| self.buildings.get(id))
            .collect()
    }

    pub fn building_count(&self) -> usize {
        self.order.len()
    }

    // -- Items --

    pub fn has_item(&self, pos: GridPosition) -> bool {
        self.items.contains_key(&pos)
    }

    pub fn item_at(&self, pos: GridPosition) -> Option<&Item> {
        self.items.get(&pos)
    }

    pub fn item_at_mut(&mut self, pos: GridPosition) -> Option<&mut Item> {
        self.items.get_mut(&pos)
    }

    /// Put `item` on an empty cell.
    pub fn put_item(&mut self, pos: GridPosition, item: Item) -> Result<(), GridError> {
        if self.items.contains_key(&pos) {
            return Err(GridError::ItemOccupied(pos));
        }
        self.items.insert(pos, item);
        Ok(())
    }

    /// Remove and return the item at `pos`, if any.
    pub fn take_item(&mut self, pos: GridPosition) -> Option<Item> {
        self.items.remove(&pos)
    }

    /// Move the item at `from` onto the empty cell `to`, resetting its
    /// progress. Nothing changes on failure.
    pub fn move_item(&mut self, from: GridPosition, to: GridPosition) -> Result<(), GridError> {
        if self.items.contains_key(&to) {
            return Err(GridError::ItemOccupied(to));
        }
        let item = self.items.remove(&from).ok_or(GridError::NoItem(from))?;
        self.items.insert(to, Item::new(item.resource));
        Ok(())
    }

    /// Items in x-then-y position order.
    pub fn items(&self) -> impl Iterator<Item = (GridPosition, &Item)> + '_ {
        self.items.iter().map(|(&pos, item)| (pos, item))
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Remove every building and item.
    pub fn clear(&mut self) {
        self.buildings.clear();
        self.tiles.clear();
        self.order.clear();
        self.items.clear();
    }
}
