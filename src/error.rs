//! Errors raised at the I/O edges: policy files, transition CSVs, belief
//! snapshots and the game store.
//!
//! The engine itself never fails; misuse of it is a programming error.

use thiserror::Error;

use crate::serving::GameId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("policy line {line}: expected an action id in 0..=7, found {content:?}")]
    PolicyParse { line: usize, content: String },

    #[error("policy file is empty")]
    EmptyPolicy,

    #[error("unknown action id {0}")]
    InvalidAction(usize),

    #[error("game {0} not found")]
    GameNotFound(GameId),

    #[error("game {0} is already over")]
    GameOver(GameId),

    #[error("invalid player count {0}, expected 2-8")]
    InvalidPlayerCount(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot encoding error: {0}")]
    Snapshot(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
