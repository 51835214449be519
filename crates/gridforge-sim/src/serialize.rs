//! Save and load support.
//!
//! A [`GameSnapshot`] carries everything needed to resume a game: the
//! ledger, research, the clock, every building with its full processing
//! state, every in-transit item, and the stored presentation fields. It is
//! encoded with `bitcode` for binary slots or `serde_json` for string
//! slots, behind a magic/version header. Power totals are not saved; the
//! first tick after a load rebuilds them.

use gridforge_core::fixed::Fixed64;
use gridforge_core::id::Resource;
use gridforge_core::ledger::ResourceLedger;
use gridforge_core::sim::{SimClock, StateHash};
use gridforge_power::PowerGrid;
use gridforge_research::ResearchState;
use gridforge_spatial::{Building, BuildingState, GridError, GridIndex, GridPosition, Item};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, GameConfig};
use crate::engine::Engine;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a Gridforge save.
pub const SNAPSHOT_MAGIC: u32 = 0x6F46_0001;

/// Current format version. Increment when breaking the format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("json encoding failed: {0}")]
    Json(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RestoreError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("save from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("json decoding failed: {0}")]
    Json(String),
    #[error("inconsistent grid in save: {0}")]
    Grid(#[from] GridError),
    #[error("last research advance at {last}s is later than the saved clock ({elapsed}s)")]
    ResearchAheadOfClock { last: Fixed64, elapsed: Fixed64 },
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
}

impl SnapshotHeader {
    /// A header for the current format version.
    pub fn new() -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), RestoreError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(RestoreError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(RestoreError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(RestoreError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The persisted portion of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub header: SnapshotHeader,
    pub clock: SimClock,
    pub resources: Vec<(Resource, Fixed64)>,
    pub discovered: Vec<Resource>,
    pub research: ResearchState,
    /// In placement order, so a restored game ticks them in the same order.
    pub buildings: Vec<Building>,
    pub items: Vec<(GridPosition, Item)>,
    pub camera: GridPosition,
    pub spawn: GridPosition,
    pub tutorial_completed: bool,
}

impl Engine {
    /// Capture the persisted state.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            header: SnapshotHeader::new(),
            clock: self.clock,
            resources: self.ledger.snapshot(),
            discovered: self.ledger.discovered().collect(),
            research: self.research.state(),
            buildings: self.grid.buildings().cloned().collect(),
            items: self.grid.items().map(|(pos, item)| (pos, *item)).collect(),
            camera: self.camera,
            spawn: self.config.spawn,
            tutorial_completed: self.tutorial_completed,
        }
    }

    /// Replace the game with `snapshot`. On error the engine is untouched.
    pub fn restore(&mut self, snapshot: GameSnapshot) -> Result<(), RestoreError> {
        snapshot.header.validate()?;
        if let Some(last) = snapshot.research.last_advance
            && last > snapshot.clock.elapsed
        {
            return Err(RestoreError::ResearchAheadOfClock {
                last,
                elapsed: snapshot.clock.elapsed,
            });
        }

        let mut grid = GridIndex::new();
        for building in snapshot.buildings {
            grid.place(building)?;
        }
        for (pos, item) in snapshot.items {
            grid.put_item(pos, item)?;
        }

        let mut ledger = ResourceLedger::new();
        for (resource, amount) in snapshot.resources {
            ledger.set(resource, amount);
        }
        for resource in snapshot.discovered {
            ledger.discover(resource);
        }

        self.grid = grid;
        self.ledger = ledger;
        self.research.restore(snapshot.research);
        self.clock = snapshot.clock;
        self.power = PowerGrid::new();
        self.events.clear();
        self.selection = None;
        self.camera = snapshot.camera;
        self.config.spawn = snapshot.spawn;
        self.tutorial_completed = snapshot.tutorial_completed;
        Ok(())
    }

    /// Encode the current state with bitcode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        bitcode::serialize(&self.snapshot()).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    /// Encode the current state as a JSON string.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(&self.snapshot()).map_err(|e| SnapshotError::Json(e.to_string()))
    }

    pub fn load_bytes(&mut self, data: &[u8]) -> Result<(), RestoreError> {
        let snapshot: GameSnapshot =
            bitcode::deserialize(data).map_err(|e| RestoreError::Decode(e.to_string()))?;
        self.restore(snapshot)?;
        tracing::info!(bytes = data.len(), tick = self.clock.tick, "save loaded");
        Ok(())
    }

    pub fn load_json(&mut self, json: &str) -> Result<(), RestoreError> {
        let snapshot: GameSnapshot =
            serde_json::from_str(json).map_err(|e| RestoreError::Json(e.to_string()))?;
        self.restore(snapshot)?;
        tracing::info!(tick = self.clock.tick, "save loaded");
        Ok(())
    }

    /// A fresh game from `config`, resumed from `data` if it decodes.
    /// Corrupt or incompatible saves are logged and ignored.
    pub fn restore_or_fresh(data: Option<&[u8]>, config: GameConfig) -> Result<Self, ConfigError> {
        let mut engine = Self::new(config)?;
        if let Some(data) = data {
            if let Err(err) = engine.load_bytes(data) {
                tracing::warn!(%err, "ignoring unreadable save, starting a new game");
            }
        }
        Ok(engine)
    }

    /// FNV-1a over everything a tick reads or writes.
    pub fn state_hash(&self) -> u64 {
        let mut h = StateHash::new();
        h.write_u64(self.clock.tick);
        h.write_fixed64(self.clock.elapsed);

        for (resource, amount) in self.ledger.snapshot() {
            h.write_u32(resource.index());
            h.write_fixed64(amount);
        }
        for resource in self.ledger.discovered() {
            h.write_u32(resource.index());
        }

        let research = self.research.state();
        h.write_u32(research.level);
        h.write_u64(research.progress);
        h.write_fixed64(research.last_advance.unwrap_or(Fixed64::MIN));

        for b in self.grid.buildings() {
            h.write_u32(b.kind.index() as u32);
            h.write_i32(b.position.x);
            h.write_i32(b.position.y);
            h.write(&[b.rotation.quarter_turns()]);
            hash_state(&mut h, &b.state);
        }
        for (pos, item) in self.grid.items() {
            h.write_i32(pos.x);
            h.write_i32(pos.y);
            h.write_u32(item.resource.index());
            h.write_fixed64(item.progress);
        }
        h.finish()
    }
}

fn hash_state(h: &mut StateHash, state: &BuildingState) {
    match state {
        BuildingState::Passive => h.write(&[0]),
        BuildingState::Charging { elapsed } => {
            h.write(&[1]);
            h.write_fixed64(*elapsed);
        }
        BuildingState::Idle => h.write(&[2]),
        BuildingState::Working { input, elapsed } => {
            h.write(&[3]);
            h.write_u32(input.index());
            h.write_fixed64(*elapsed);
        }
        BuildingState::Storage { queue } => {
            h.write(&[4]);
            h.write_u32(queue.len() as u32);
            for r in queue {
                h.write_u32(r.index());
            }
        }
    }
}
