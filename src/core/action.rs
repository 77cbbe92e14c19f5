//! The fixed eight-way action space.
//!
//! Every player may choose any action on any turn. Plays of cards the
//! player does not hold are legal inputs; the engine treats them as a pass.
//! Action ids are stable and appear in policy files and transition CSVs.

use serde::{Deserialize, Serialize};

use super::card::Card;

/// One of the eight actions, with ids `0..=7` in declaration order.
///
/// ```
/// use kitten_rl::core::{Action, Card};
///
/// assert_eq!(Action::PlaySkip.index(), 1);
/// assert_eq!(Action::from_index(7), Some(Action::PlayDefuse));
/// assert_eq!(Action::PlayCat.card(), Some(Card::Cat));
/// assert_eq!(Action::Draw.card(), None);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    Draw = 0,
    PlaySkip = 1,
    PlayAttack = 2,
    PlayShuffle = 3,
    PlayNope = 4,
    PlaySeeFuture = 5,
    PlayCat = 6,
    PlayDefuse = 7,
}

impl Action {
    pub const COUNT: usize = 8;

    pub const ALL: [Action; Self::COUNT] = [
        Action::Draw,
        Action::PlaySkip,
        Action::PlayAttack,
        Action::PlayShuffle,
        Action::PlayNope,
        Action::PlaySeeFuture,
        Action::PlayCat,
        Action::PlayDefuse,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Action> {
        Self::ALL.get(index).copied()
    }

    /// The card a play action discards. `None` for Draw.
    #[must_use]
    pub fn card(self) -> Option<Card> {
        match self {
            Action::Draw => None,
            Action::PlaySkip => Some(Card::Skip),
            Action::PlayAttack => Some(Card::Attack),
            Action::PlayShuffle => Some(Card::Shuffle),
            Action::PlayNope => Some(Card::Nope),
            Action::PlaySeeFuture => Some(Card::SeeFuture),
            Action::PlayCat => Some(Card::Cat),
            Action::PlayDefuse => Some(Card::Defuse),
        }
    }

    /// Plays of the six action card types (everything but Draw and PlayDefuse).
    #[must_use]
    pub fn is_action_card_play(self) -> bool {
        self.card().is_some_and(Card::is_action)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Action::Draw => "DRAW",
            Action::PlaySkip => "PLAY_SKIP",
            Action::PlayAttack => "PLAY_ATTACK",
            Action::PlayShuffle => "PLAY_SHUFFLE",
            Action::PlayNope => "PLAY_NOPE",
            Action::PlaySeeFuture => "PLAY_SEE_FUTURE",
            Action::PlayCat => "PLAY_CAT",
            Action::PlayDefuse => "PLAY_DEFUSE",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
