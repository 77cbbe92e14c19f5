//! Table and deck configuration.
//!
//! Defaults reproduce the reference deck: six copies of each of the six
//! action cards, a seven card deal, a pool of six defuses (one per player,
//! up to two extras shuffled back) and a pool of four bombs.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::card::Card;

/// Smallest table the engine plays.
pub const MIN_PLAYERS: usize = 2;

/// Largest table the engine plays.
pub const MAX_PLAYERS: usize = 8;

/// `Ok(count)` when `count` is a playable table size.
pub fn check_player_count(count: usize) -> Result<usize> {
    if (MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
        Ok(count)
    } else {
        Err(Error::InvalidPlayerCount(count))
    }
}

/// Deck construction parameters.
///
/// Deserializing rejects a player count outside 2-8.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedGameConfig")]
pub struct GameConfig {
    /// Seats at the table (2-8).
    pub player_count: usize,

    /// Copies of each action card type in the base deck.
    pub copies_per_action_card: usize,

    /// Regular cards dealt to each player.
    pub hand_size: usize,

    /// Defuse cards available in total. Each player receives one while they last.
    pub defuse_pool: usize,

    /// Leftover defuses shuffled back into the deck after dealing.
    pub extra_defuses: usize,

    /// Bomb cards available. `player_count - 1` are inserted, capped by the pool.
    pub bomb_pool: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_count: 5,
            copies_per_action_card: 6,
            hand_size: 7,
            defuse_pool: 6,
            extra_defuses: 2,
            bomb_pool: 4,
        }
    }
}

/// Wire form of `GameConfig` before the player count is checked.
#[derive(Deserialize)]
#[serde(default)]
struct UncheckedGameConfig {
    player_count: usize,
    copies_per_action_card: usize,
    hand_size: usize,
    defuse_pool: usize,
    extra_defuses: usize,
    bomb_pool: usize,
}

impl Default for UncheckedGameConfig {
    fn default() -> Self {
        let d = GameConfig::default();
        Self {
            player_count: d.player_count,
            copies_per_action_card: d.copies_per_action_card,
            hand_size: d.hand_size,
            defuse_pool: d.defuse_pool,
            extra_defuses: d.extra_defuses,
            bomb_pool: d.bomb_pool,
        }
    }
}

impl TryFrom<UncheckedGameConfig> for GameConfig {
    type Error = Error;

    fn try_from(raw: UncheckedGameConfig) -> Result<Self> {
        Ok(Self {
            player_count: check_player_count(raw.player_count)?,
            copies_per_action_card: raw.copies_per_action_card,
            hand_size: raw.hand_size,
            defuse_pool: raw.defuse_pool,
            extra_defuses: raw.extra_defuses,
            bomb_pool: raw.bomb_pool,
        })
    }
}

impl GameConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Panics outside 2-8. Use `check_player_count` on untrusted input.
    pub fn with_player_count(mut self, count: usize) -> Self {
        assert!(check_player_count(count).is_ok(), "Player count must be 2-8");
        self.player_count = count;
        self
    }

    /// `Err` when the player count is outside 2-8.
    pub fn validate(&self) -> Result<()> {
        check_player_count(self.player_count).map(|_| ())
    }

    pub fn with_copies_per_action_card(mut self, copies: usize) -> Self {
        self.copies_per_action_card = copies;
        self
    }

    pub fn with_hand_size(mut self, size: usize) -> Self {
        self.hand_size = size;
        self
    }

    pub fn with_defuse_pool(mut self, pool: usize) -> Self {
        self.defuse_pool = pool;
        self
    }

    pub fn with_extra_defuses(mut self, extras: usize) -> Self {
        self.extra_defuses = extras;
        self
    }

    pub fn with_bomb_pool(mut self, pool: usize) -> Self {
        self.bomb_pool = pool;
        self
    }

    /// Defuses handed out at the deal.
    #[must_use]
    pub fn dealt_defuses(&self) -> usize {
        self.player_count.min(self.defuse_pool)
    }

    /// Defuses shuffled into the deck after the deal.
    #[must_use]
    pub fn deck_defuses(&self) -> usize {
        self.extra_defuses
            .min(self.defuse_pool - self.dealt_defuses())
    }

    /// Bombs inserted into the deck.
    #[must_use]
    pub fn bombs(&self) -> usize {
        self.player_count.saturating_sub(1).min(self.bomb_pool)
    }

    /// Every card in play after a reset.
    #[must_use]
    pub fn total_cards(&self) -> usize {
        Card::ACTION_CARDS.len() * self.copies_per_action_card
            + self.dealt_defuses()
            + self.deck_defuses()
            + self.bombs()
    }
}
