//! What a single `step` reports back.

use serde::{Deserialize, Serialize};

use crate::core::{Card, PlayerId};

/// Result of a finished game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    /// Last player standing.
    Winner(PlayerId),
    /// The deck ran out on a draw. Nobody wins.
    Draw,
}

impl GameResult {
    #[must_use]
    pub fn is_winner(&self, player: PlayerId) -> bool {
        matches!(self, GameResult::Winner(p) if *p == player)
    }

    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        match self {
            GameResult::Winner(p) => Some(*p),
            GameResult::Draw => None,
        }
    }
}

/// Why an episode ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    LastPlayerStanding,
    DeckEmpty,
    /// Set by the environment when an episode hits its step cap.
    Truncated,
}

/// Side information about a step. Flags default to false.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInfo {
    /// The current seat was already eliminated; the step only moved the turn on.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skipped_dead: bool,

    /// A play of a card the player did not hold. Treated as a pass.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub invalid_play: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawn: Option<Card>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub defused: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exploded: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<PlayerId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<EndReason>,

    /// Top three cards revealed by SeeFuture. `None` entries lie past the bottom of the deck.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peek: Option<[Option<Card>; 3]>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

/// Reward, termination flag and info for one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// 0 for ordinary moves, -1 for blowing up, +1 for an immediate win.
    pub reward: f64,
    pub done: bool,
    pub info: StepInfo,
}

impl StepOutcome {
    pub(crate) fn ongoing(reward: f64, info: StepInfo) -> Self {
        Self {
            reward,
            done: false,
            info,
        }
    }
}
