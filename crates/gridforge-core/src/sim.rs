//! Simulation clock and state hashing.
//!
//! The clock is the only notion of time the simulation has. It is advanced
//! by the caller-supplied `dt` on every tick, so two runs fed the same
//! `dt` sequence read identical times.

use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, Seconds, Ticks};

// ---------------------------------------------------------------------------
// Simulation clock
// ---------------------------------------------------------------------------

/// Tick counter plus accumulated simulated seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimClock {
    /// Number of ticks run so far.
    pub tick: Ticks,
    /// Sum of every `dt` applied so far.
    pub elapsed: Seconds,
}

impl SimClock {
    /// A clock at tick 0, time 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one tick of `dt` seconds. Negative `dt` counts as zero.
    pub fn advance(&mut self, dt: Seconds) {
        self.tick += 1;
        self.elapsed = self.elapsed.saturating_add(dt.max(Fixed64::ZERO));
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A deterministic hash of simulation state for desync and replay checks.
///
/// FNV-1a (64-bit). Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_fixed64(&mut self, v: Fixed64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
