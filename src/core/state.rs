//! Mutable table state owned by the engine.
//!
//! ## Piles
//!
//! - `hands`: one per seat, unordered in play but kept in arrival order
//! - `deck`: the shared hidden draw pile, front = top
//! - `discard`: append-only
//! - `graveyard`: cards taken out of play by an explosion (the bomb itself
//!   and the eliminated player's hand)
//!
//! Cards only ever move between these piles, so their total is constant
//! from one reset to the next.
//!
//! ## Defuse counts
//!
//! `defuse_counts[p]` is the authoritative count consulted when a bomb is
//! drawn. Hand mutations go through `add_to_hand`/`take_from_hand`, which
//! keep it equal to the number of Defuse cards in `hands[p]`.

use im::Vector;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::card::Card;
use super::player::{PlayerId, PlayerMap};

/// A player's hand. Deals are seven cards and rarely grow past sixteen.
pub type Hand = SmallVec<[Card; 16]>;

/// Full table state.
///
/// Uses `im::Vector` for the deck so snapshots clone in O(1).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    // === Per-seat ===
    pub hands: PlayerMap<Hand>,
    pub defuse_counts: PlayerMap<u32>,
    pub alive: PlayerMap<bool>,

    // === Shared piles ===
    pub deck: Vector<Card>,
    pub discard: Vec<Card>,
    pub graveyard: Vec<Card>,

    // === Turn ===
    /// Seat to act next.
    pub turn: PlayerId,

    /// Pending extra draws set by Attack. Recorded only; nothing forces the draws.
    pub attack_counter: u32,
}

impl GameState {
    /// Empty table: no cards anywhere, everyone alive, seat 0 to act.
    #[must_use]
    pub fn new(player_count: usize) -> Self {
        Self {
            hands: PlayerMap::with_default(player_count),
            defuse_counts: PlayerMap::with_value(player_count, 0),
            alive: PlayerMap::with_value(player_count, true),
            deck: Vector::new(),
            discard: Vec::new(),
            graveyard: Vec::new(),
            turn: PlayerId::new(0),
            attack_counter: 0,
        }
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.alive.player_count()
    }

    // === Players ===

    #[must_use]
    pub fn is_alive(&self, player: PlayerId) -> bool {
        self.alive[player]
    }

    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.alive.count_where(|a| *a)
    }

    /// The sole survivor, once only one player is left.
    #[must_use]
    pub fn last_alive(&self) -> Option<PlayerId> {
        if self.alive_count() == 1 {
            self.alive.find(|a| *a)
        } else {
            None
        }
    }

    /// Next alive seat strictly after `from`, wrapping around.
    ///
    /// Returns `from` itself only when it is the sole survivor. Callers must
    /// not ask when nobody is alive; the search would never end.
    #[must_use]
    pub fn next_alive(&self, from: PlayerId) -> PlayerId {
        debug_assert!(self.alive_count() > 0, "next_alive on a table with no survivors");
        let count = self.player_count();
        let mut seat = from.successor(count);
        while !self.alive[seat] {
            seat = seat.successor(count);
        }
        seat
    }

    /// Move `turn` to the next alive seat.
    pub fn advance_turn(&mut self) {
        self.turn = self.next_alive(self.turn);
    }

    /// Remove a player from the game. Their hand goes to the graveyard.
    pub fn eliminate(&mut self, player: PlayerId) {
        self.graveyard.extend(self.hands[player].drain(..));
        self.defuse_counts[player] = 0;
        self.alive[player] = false;
    }

    // === Hands ===

    #[must_use]
    pub fn hand(&self, player: PlayerId) -> &[Card] {
        &self.hands[player]
    }

    #[must_use]
    pub fn has_card(&self, player: PlayerId, card: Card) -> bool {
        self.hands[player].contains(&card)
    }

    pub fn add_to_hand(&mut self, player: PlayerId, card: Card) {
        self.hands[player].push(card);
        if card == Card::Defuse {
            self.defuse_counts[player] += 1;
        }
    }

    /// Remove one copy of `card` from a hand. Returns false when none is held.
    pub fn take_from_hand(&mut self, player: PlayerId, card: Card) -> bool {
        match self.hands[player].iter().position(|&c| c == card) {
            Some(pos) => {
                self.hands[player].remove(pos);
                if card == Card::Defuse {
                    self.defuse_counts[player] = self.defuse_counts[player].saturating_sub(1);
                }
                true
            }
            None => false,
        }
    }

    // === Deck ===

    /// The top `N` cards, `None` past the bottom of the deck.
    #[must_use]
    pub fn top_cards<const N: usize>(&self) -> [Option<Card>; N] {
        std::array::from_fn(|i| self.deck.get(i).copied())
    }

    // === Invariants ===

    /// Cards across hands, deck, discard and graveyard.
    #[must_use]
    pub fn total_cards(&self) -> usize {
        self.hands.values().map(|h| h.len()).sum::<usize>()
            + self.deck.len()
            + self.discard.len()
            + self.graveyard.len()
    }

    /// Whether every defuse count matches the Defuse cards in that hand.
    #[must_use]
    pub fn defuse_counts_consistent(&self) -> bool {
        self.hands.iter().all(|(p, hand)| {
            hand.iter().filter(|&&c| c == Card::Defuse).count() == self.defuse_counts[p] as usize
        })
    }

    /// How many copies of `card` exist anywhere on the table.
    #[must_use]
    pub fn count_everywhere(&self, card: Card) -> usize {
        let in_hands: usize = self
            .hands
            .values()
            .map(|h| h.iter().filter(|&&c| c == card).count())
            .sum();
        in_hands
            + self.deck.iter().filter(|&&c| c == card).count()
            + self.discard.iter().filter(|&&c| c == card).count()
            + self.graveyard.iter().filter(|&&c| c == card).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_alive_skips_dead() {
        let mut state = GameState::new(4);
        state.alive[PlayerId::new(1)] = false;
        state.alive[PlayerId::new(2)] = false;

        assert_eq!(state.next_alive(PlayerId::new(0)), PlayerId::new(3));
        assert_eq!(state.next_alive(PlayerId::new(3)), PlayerId::new(0));
    }

    #[test]
    fn test_next_alive_sole_survivor_returns_self() {
        let mut state = GameState::new(3);
        state.alive[PlayerId::new(0)] = false;
        state.alive[PlayerId::new(2)] = false;

        assert_eq!(state.next_alive(PlayerId::new(1)), PlayerId::new(1));
        assert_eq!(state.last_alive(), Some(PlayerId::new(1)));
    }

    #[test]
    fn test_hand_tracks_defuses() {
        let mut state = GameState::new(2);
        let p = PlayerId::new(0);

        state.add_to_hand(p, Card::Defuse);
        state.add_to_hand(p, Card::Cat);
        state.add_to_hand(p, Card::Defuse);
        assert_eq!(state.defuse_counts[p], 2);

        assert!(state.take_from_hand(p, Card::Defuse));
        assert_eq!(state.defuse_counts[p], 1);
        assert!(!state.take_from_hand(p, Card::Skip));
        assert!(state.defuse_counts_consistent());
    }

    #[test]
    fn test_eliminate_moves_hand_to_graveyard() {
        let mut state = GameState::new(2);
        let p = PlayerId::new(1);
        state.add_to_hand(p, Card::Skip);
        state.add_to_hand(p, Card::Defuse);

        state.eliminate(p);

        assert!(state.hand(p).is_empty());
        assert_eq!(state.defuse_counts[p], 0);
        assert!(!state.is_alive(p));
        assert_eq!(state.graveyard.len(), 2);
        assert_eq!(state.total_cards(), 2);
    }

    #[test]
    fn test_top_cards_pads_with_none() {
        let mut state = GameState::new(2);
        state.deck.push_back(Card::Bomb);
        state.deck.push_back(Card::Cat);

        let top: [Option<Card>; 3] = state.top_cards();
        assert_eq!(top, [Some(Card::Bomb), Some(Card::Cat), None]);
    }
}
