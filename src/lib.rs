//! # kitten-rl
//!
//! An Exploding Kittens style card game simulator with tabular learners.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: every game, environment and trainer is driven by a
//!    seeded `GameRng`. Same seed, same trajectory.
//!
//! 2. **N-Player First**: the engine runs 2-8 seats; nothing assumes two.
//!
//! 3. **Tabular**: learners see a bounded state id from a fixed, versioned
//!    hash of a small feature snapshot. Policy files stay valid across runs.
//!
//! ## Architecture
//!
//! - **Engine**: `games::kittens` owns the turn state machine. State uses
//!   `im-rs` so snapshots and clones are cheap.
//!
//! - **Environment seam**: learners only talk to `env::Environment`, so
//!   trainers are tested on toy environments as well as the card game.
//!
//! - **Serving**: `serving` keeps games and preloaded policies behind
//!   locks; `hosting` (feature `server`) exposes them over HTTP.
//!
//! ## Modules
//!
//! - `core`: seats, cards, actions, RNG, configuration, table state
//! - `games`: the kittens engine
//! - `encoding`: canonical state snapshot and state id hashing
//! - `env`: the `Environment` trait and the single/all-seat kittens adapter
//! - `training`: Q-learning, MLE value iteration, Bayesian agent, policy files
//! - `serving`: agent kinds, policy book, game store
//! - `hosting`: HTTP routes (feature `server`)

pub mod core;
pub mod encoding;
pub mod env;
pub mod error;
pub mod games;
pub mod serving;
pub mod training;

#[cfg(feature = "server")]
pub mod hosting;

// Re-export commonly used types
pub use crate::core::{Action, Card, GameConfig, GameRng, GameRngState, GameState, PlayerId, PlayerMap};

pub use crate::encoding::{CanonicalState, HashedEncoder, StateEncoder, StateId, DEFAULT_NUM_STATES};

pub use crate::env::{EnvConfig, Environment, KittensEnv, Observation, Seat, Transition};

pub use crate::error::{Error, Result};

pub use crate::games::kittens::{GameResult, KittensGame, KittensGameBuilder, StepInfo, StepOutcome};

pub use crate::serving::{AgentKind, GameId, GameStore, PolicyBook};

pub use crate::training::{
    BayesianAgent, BayesianConfig, MleConfig, MleTrainer, Policy, QLearningConfig,
    QLearningTrainer, QTable, TrainingReport,
};
