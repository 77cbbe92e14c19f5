//! Core types: seats, cards, actions, RNG, configuration and table state.
//!
//! Everything here is plain data. The turn state machine that mutates
//! `GameState` lives in `games::kittens`.

pub mod action;
pub mod card;
pub mod config;
pub mod player;
pub mod rng;
pub mod state;

pub use action::Action;
pub use card::Card;
pub use config::{check_player_count, GameConfig, MAX_PLAYERS, MIN_PLAYERS};
pub use player::{PlayerId, PlayerMap};
pub use rng::{GameRng, GameRngState};
pub use state::{GameState, Hand};
