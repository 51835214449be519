//! Gridforge Core -- shared vocabulary for the factory simulation.
//!
//! This crate holds the pieces every other Gridforge crate depends on:
//! the fixed-point number type used for time and quantities, the resource
//! and building identifiers, the rotation geometry that turns canonical
//! port directions into world directions, the resource ledger, and the
//! static building catalog.
//!
//! Nothing in here is simulated. The grid lives in `gridforge-spatial`,
//! power balancing in `gridforge-power`, research gating in
//! `gridforge-research`, and the tick loop in `gridforge-sim`.
//!
//! # Key Types
//!
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic math.
//! - [`id::Resource`] / [`id::BuildingKind`] -- closed sets of item and
//!   building kinds.
//! - [`rotation::Direction`] / [`rotation::Rotation`] -- port geometry.
//! - [`ledger::ResourceLedger`] -- non-negative counters plus the
//!   discovered-item set.
//! - [`catalog::Catalog`] -- immutable per-kind metadata.
//! - [`sim::SimClock`] / [`sim::StateHash`] -- simulation time and
//!   desync hashing.

pub mod catalog;
pub mod fixed;
pub mod id;
pub mod ledger;
pub mod rotation;
pub mod sim;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
