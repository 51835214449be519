//! Gridforge Sim -- the tick loop, commands and queries of the factory game.
//!
//! [`engine::Engine`] owns every piece of game state and is the only type a
//! presentation layer needs: it places and deletes buildings, advances the
//! simulation by a caller-supplied `dt`, answers read-only queries, buffers
//! [`event::GameEvent`]s, and saves or restores itself.
//!
//! # Tick
//!
//! Every [`engine::Engine::advance`] settles the power balance in its own
//! pass and then runs each building's rule once, in placement order, using
//! that tick's efficiency.
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- game state, tick loop and commands.
//! - [`config::GameConfig`] -- new-game settings, loadable from RON, TOML
//!   or JSON.
//! - [`event::GameEvent`] -- what happened since the last drain.
//! - [`query::BuildingView`] / [`query::ResearchStatus`] /
//!   [`query::PowerStatus`] -- owned views for rendering.
//! - [`serialize::GameSnapshot`] -- the versioned save format.

pub mod config;
pub mod engine;
pub mod event;
pub mod query;
mod rules;
pub mod serialize;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{ConfigError, GameConfig};
pub use engine::{Engine, Selection};
pub use event::{GameEvent, PlacementError};
