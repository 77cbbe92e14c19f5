//! Canonical state -> bounded table index.
//!
//! The hash is FxHash (rustc-hash 1.x, 64-bit) over a fixed word sequence:
//!
//! ```text
//! [ENCODING_VERSION, player, hand_size, defuse, deck_size,
//!  alive_count, alive_mask, top3[0], top3[1], top3[2]]
//! ```
//!
//! with cards written as `Card::code()` and `0` for unknown. The 64-bit
//! result is folded (`h ^ h >> 32`) so the low bits see the whole word,
//! masked to 63 bits and reduced modulo the table size.
//!
//! Distinct states may share an id. That aliasing is accepted: a larger
//! table makes collisions rarer but never impossible. Nothing here is
//! seeded per process, so policy files stay valid across runs. Changing any
//! step above must bump `ENCODING_VERSION`.

use std::hash::Hasher;

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

use super::canonical::CanonicalState;

/// Index into a tabular store.
pub type StateId = usize;

/// Bumped whenever the word layout or mixing changes.
pub const ENCODING_VERSION: u64 = 1;

/// Table size used by the reference trainers and serving code.
pub const DEFAULT_NUM_STATES: usize = 100_000;

/// Maps canonical states to table rows.
pub trait StateEncoder: Send + Sync {
    /// Encode into `0..self.num_states()`.
    fn encode(&self, state: &CanonicalState) -> StateId;

    fn num_states(&self) -> usize;
}

/// The hashing encoder described in the module docs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedEncoder {
    num_states: usize,
}

impl HashedEncoder {
    #[must_use]
    pub fn new(num_states: usize) -> Self {
        assert!(num_states > 0, "State table must have at least one row");
        Self { num_states }
    }
}

impl Default for HashedEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_STATES)
    }
}

impl StateEncoder for HashedEncoder {
    fn encode(&self, state: &CanonicalState) -> StateId {
        encode(state, self.num_states)
    }

    fn num_states(&self) -> usize {
        self.num_states
    }
}

fn card_word(card: Option<crate::core::Card>) -> u64 {
    card.map_or(0, |c| c.code())
}

/// The ordered words fed to the hasher.
#[must_use]
pub fn state_words(state: &CanonicalState) -> [u64; 10] {
    [
        ENCODING_VERSION,
        state.player.0 as u64,
        state.hand_size as u64,
        state.defuse as u64,
        state.deck_size as u64,
        state.alive_count as u64,
        state.alive_mask as u64,
        card_word(state.top3[0]),
        card_word(state.top3[1]),
        card_word(state.top3[2]),
    ]
}

/// Non-negative 63-bit hash of a canonical state.
#[must_use]
pub fn state_hash(state: &CanonicalState) -> u64 {
    let mut hasher = FxHasher::default();
    for word in state_words(state) {
        hasher.write_u64(word);
    }
    let h = hasher.finish();
    (h ^ (h >> 32)) & 0x7FFF_FFFF_FFFF_FFFF
}

/// Encode into `0..num_states`.
#[must_use]
pub fn encode(state: &CanonicalState, num_states: usize) -> StateId {
    assert!(num_states > 0, "State table must have at least one row");
    (state_hash(state) % num_states as u64) as StateId
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Card, PlayerId};

    fn sample() -> CanonicalState {
        CanonicalState {
            player: PlayerId::new(0),
            hand_size: 8,
            defuse: 1,
            deck_size: 6,
            alive_count: 5,
            alive_mask: 0b11111,
            top3: [Some(Card::Bomb), Some(Card::Cat), None],
        }
    }

    #[test]
    fn test_encode_is_deterministic() {
        let encoder = HashedEncoder::new(1000);
        assert_eq!(encoder.encode(&sample()), encoder.encode(&sample()));
    }

    #[test]
    fn test_encode_in_range() {
        for n in [1, 2, 7, 1000, DEFAULT_NUM_STATES] {
            assert!(encode(&sample(), n) < n);
        }
        assert_eq!(encode(&sample(), 1), 0);
    }

    #[test]
    fn test_field_order_matters() {
        let a = CanonicalState {
            hand_size: 3,
            defuse: 4,
            ..sample()
        };
        let b = CanonicalState {
            hand_size: 4,
            defuse: 3,
            ..sample()
        };
        assert_ne!(state_hash(&a), state_hash(&b));
    }

    #[test]
    fn test_unknown_differs_from_every_card() {
        let unknown = state_hash(&sample());
        for card in Card::ALL {
            let mut known = sample();
            known.top3[2] = Some(card);
            assert_ne!(state_hash(&known), unknown);
        }
    }

    #[test]
    fn test_words_layout() {
        let words = state_words(&sample());
        assert_eq!(words[0], ENCODING_VERSION);
        assert_eq!(&words[1..7], &[0, 8, 1, 6, 5, 0b11111]);
        assert_eq!(&words[7..], &[8, 6, 0]);
    }

    // Saved policies depend on this exact value.
    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_hash_is_pinned() {
        assert_eq!(state_hash(&sample()), 0x5162_e2d4_d6ec_c1b2);
        assert_eq!(encode(&sample(), DEFAULT_NUM_STATES), 91_538);
    }

    #[test]
    #[should_panic(expected = "at least one row")]
    fn test_zero_states_rejected() {
        let _ = HashedEncoder::new(0);
    }
}
