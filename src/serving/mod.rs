//! The serving boundary: who plays each seat and where games live.
//!
//! Policies are loaded once into a `PolicyBook` before serving starts;
//! games live in a `GameStore` keyed by `GameId`.

mod agent;
mod store;

pub use agent::{AgentKind, PolicyBook, PolicyPaths, Strategy};
pub use store::{GameStore, GameView, MoveResponse};

/// Identifier of a served game.
pub type GameId = u64;
