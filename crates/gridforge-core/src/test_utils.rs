//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::fixed::Fixed64;
use crate::id::Resource;
use crate::ledger::ResourceLedger;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Ledger helpers
// ===========================================================================

/// A ledger holding the given whole-unit amounts, each marked discovered.
pub fn ledger_with(amounts: &[(Resource, u32)]) -> ResourceLedger {
    let mut ledger = ResourceLedger::new();
    for &(resource, n) in amounts {
        ledger.credit_units(resource, n);
        ledger.discover(resource);
    }
    ledger
}

/// A ledger with `n` of every resource.
pub fn rich_ledger(n: u32) -> ResourceLedger {
    let amounts: Vec<(Resource, u32)> = Resource::ALL.iter().map(|&r| (r, n)).collect();
    ledger_with(&amounts)
}
