//! Card types.
//!
//! Cards carry no identity beyond their type: two Skips are interchangeable,
//! and bombs and defuses are tracked by count once dealt.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Card {
    Skip,
    Attack,
    Shuffle,
    Nope,
    SeeFuture,
    Cat,
    Defuse,
    Bomb,
}

impl Card {
    /// The six fungible action card types that make up the base deck.
    pub const ACTION_CARDS: [Card; 6] = [
        Card::Skip,
        Card::Attack,
        Card::Shuffle,
        Card::Nope,
        Card::SeeFuture,
        Card::Cat,
    ];

    /// Every card type, in a fixed order.
    pub const ALL: [Card; 8] = [
        Card::Skip,
        Card::Attack,
        Card::Shuffle,
        Card::Nope,
        Card::SeeFuture,
        Card::Cat,
        Card::Defuse,
        Card::Bomb,
    ];

    #[must_use]
    pub fn is_action(self) -> bool {
        !matches!(self, Card::Defuse | Card::Bomb)
    }

    /// Stable code used by the state encoder. `0` is reserved for "unknown".
    #[must_use]
    pub fn code(self) -> u64 {
        match self {
            Card::Skip => 1,
            Card::Attack => 2,
            Card::Shuffle => 3,
            Card::Nope => 4,
            Card::SeeFuture => 5,
            Card::Cat => 6,
            Card::Defuse => 7,
            Card::Bomb => 8,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Card::Skip => "Skip",
            Card::Attack => "Attack",
            Card::Shuffle => "Shuffle",
            Card::Nope => "Nope",
            Card::SeeFuture => "SeeFuture",
            Card::Cat => "Cat",
            Card::Defuse => "Defuse",
            Card::Bomb => "Bomb",
        }
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
