//! The environment seam between learners and the engine.
//!
//! Learners only see `Environment`: encoded observations in, actions out.
//! `KittensEnv` adapts the card game; tests substitute toy environments.

mod behavior;
mod kittens;

pub use behavior::{random_action, Behavior, BASELINE_ATTACK_PROB};
pub use kittens::{EnvConfig, KittensEnv, Seat};

use serde::{Deserialize, Serialize};

use crate::core::{Action, PlayerId};
use crate::encoding::{CanonicalState, StateId};
use crate::games::kittens::StepInfo;

/// What a learner sees at a decision point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub id: StateId,
    pub state: CanonicalState,
}

/// Result of one `Environment::step`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub next: Observation,
    pub reward: f64,
    pub done: bool,
    /// The episode hit its step cap. Implies `done`.
    pub truncated: bool,
    pub info: StepInfo,
    /// Set when the game ended with a last player standing.
    pub winner: Option<PlayerId>,
}

/// An episodic, discrete-action environment over a bounded state space.
pub trait Environment {
    /// Start a new episode.
    fn reset(&mut self) -> Observation;

    /// Apply `action` for the acting player. Not valid after `done`.
    fn step(&mut self, action: Action) -> Transition;

    /// Size of the state id space.
    fn num_states(&self) -> usize;

    /// The seat whose wins a trainer should count, if any.
    fn tracked_seat(&self) -> Option<PlayerId> {
        None
    }
}
