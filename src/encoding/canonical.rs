//! Observer-relative feature snapshot of a table.

use serde::{Deserialize, Serialize};

use crate::core::{Card, GameState, PlayerId};

/// The small set of features learners key their tables on.
///
/// Derived on demand from `GameState`; never stored by the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalState {
    /// Observing seat.
    pub player: PlayerId,
    /// Cards in the observer's hand.
    pub hand_size: u32,
    /// Defuses held by the observer.
    pub defuse: u32,
    pub deck_size: u32,
    pub alive_count: u32,
    /// Bit `i` set while seat `i` is alive.
    pub alive_mask: u32,
    /// Top three deck cards, `None` past the bottom.
    pub top3: [Option<Card>; 3],
}

impl CanonicalState {
    /// Snapshot `state` as seen by `observer`.
    #[must_use]
    pub fn observe(state: &GameState, observer: PlayerId) -> Self {
        Self {
            player: observer,
            hand_size: state.hand(observer).len() as u32,
            defuse: state.defuse_counts[observer],
            deck_size: state.deck.len() as u32,
            alive_count: state.alive_count() as u32,
            alive_mask: state.alive.bitmask(|a| *a),
            top3: state.top_cards(),
        }
    }
}
