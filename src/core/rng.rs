//! Deterministic random source shared by the engine and the learners.
//!
//! Every shuffle, bomb placement and exploration coin flip goes through a
//! `GameRng`, so a seed plus an action sequence reproduces an episode.
//!
//! ```
//! use kitten_rl::core::GameRng;
//!
//! let mut a = GameRng::new(7);
//! let mut b = GameRng::new(7);
//! assert_eq!(a.gen_range_usize(0..100), b.gen_range_usize(0..100));
//!
//! // A fork is a fresh stream, reproducible from the parent's seed.
//! let mut game = a.fork();
//! let _ = game.gen_bool(0.5);
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Seedable, forkable ChaCha8 stream.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
    fork_counter: u64,
}

impl GameRng {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            fork_counter: 0,
        }
    }

    /// Derive an independent stream.
    ///
    /// The n-th fork of a given seed is always the same stream.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.fork_counter += 1;
        let fork_seed = self
            .seed
            .wrapping_add(self.fork_counter.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        Self::new(fork_seed)
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    /// Uniform position in `0..=len`, used for inserting into a pile of `len` cards.
    pub fn gen_position(&mut self, len: usize) -> usize {
        self.inner.gen_range(0..=len)
    }

    pub fn gen_bool(&mut self, probability: f64) -> bool {
        self.inner.gen_bool(probability.clamp(0.0, 1.0))
    }

    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.inner);
    }

    /// Capture the stream position for persistence.
    #[must_use]
    pub fn state(&self) -> GameRngState {
        GameRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
            fork_counter: self.fork_counter,
        }
    }

    #[must_use]
    pub fn from_state(state: &GameRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
            fork_counter: state.fork_counter,
        }
    }
}

/// Serializable position of a `GameRng`.
///
/// The ChaCha word position makes capture O(1) no matter how far the stream advanced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRngState {
    pub seed: u64,
    pub word_pos: u128,
    pub fork_counter: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let mut rng1 = GameRng::new(42);
        let mut rng2 = GameRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.gen_range_usize(0..1000), rng2.gen_range_usize(0..1000));
        }
    }

    #[test]
    fn test_fork_is_deterministic_and_distinct() {
        let mut rng1 = GameRng::new(42);
        let mut rng2 = GameRng::new(42);

        let mut f1 = rng1.fork();
        let mut f2 = rng2.fork();
        assert_eq!(f1.seed(), f2.seed());

        let second = rng1.fork();
        assert_ne!(f1.seed(), second.seed());

        let a: Vec<_> = (0..10).map(|_| f1.gen_range_usize(0..1000)).collect();
        let b: Vec<_> = (0..10).map(|_| f2.gen_range_usize(0..1000)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_gen_position_is_inclusive() {
        let mut rng = GameRng::new(3);
        let mut seen_end = false;
        for _ in 0..500 {
            let pos = rng.gen_position(2);
            assert!(pos <= 2);
            seen_end |= pos == 2;
        }
        assert!(seen_end);
        assert_eq!(rng.gen_position(0), 0);
    }

    #[test]
    fn test_shuffle_keeps_elements() {
        let mut rng = GameRng::new(42);
        let mut data: Vec<u32> = (1..=10).collect();
        rng.shuffle(&mut data);
        assert_ne!(data, (1..=10).collect::<Vec<_>>());
        data.sort_unstable();
        assert_eq!(data, (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_state_restore_continues_stream() {
        let mut rng = GameRng::new(42);
        for _ in 0..100 {
            rng.gen_bool(0.5);
        }

        let state = rng.state();
        let expected: Vec<_> = (0..10).map(|_| rng.gen_range_usize(0..1000)).collect();

        let mut restored = GameRng::from_state(&state);
        let actual: Vec<_> = (0..10).map(|_| restored.gen_range_usize(0..1000)).collect();

        assert_eq!(expected, actual);
    }

    #[test]
    fn test_state_serde() {
        let state = GameRngState {
            seed: 42,
            word_pos: 12345,
            fork_counter: 5,
        };

        let json = serde_json::to_string(&state).unwrap();
        let deserialized: GameRngState = serde_json::from_str(&json).unwrap();

        assert_eq!(state, deserialized);
    }
}
