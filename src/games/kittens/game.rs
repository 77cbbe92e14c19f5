//! The turn state machine.

use serde::{Deserialize, Serialize};

use crate::core::{Action, Card, GameConfig, GameRng, GameRngState, GameState, PlayerId};
use crate::encoding::CanonicalState;

use super::outcome::{EndReason, GameResult, StepInfo, StepOutcome};

/// Extra draws an Attack asks of the next player. Recorded, not enforced.
pub const ATTACK_DRAWS: u32 = 2;

/// The engine: owns the table and its random source.
#[derive(Clone, Debug)]
pub struct KittensGame {
    config: GameConfig,
    state: GameState,
    rng: GameRng,
    result: Option<GameResult>,
    steps: u64,
}

/// Builder for a `KittensGame`.
pub struct KittensGameBuilder {
    config: GameConfig,
}

impl Default for KittensGameBuilder {
    fn default() -> Self {
        Self {
            config: GameConfig::default(),
        }
    }
}

impl KittensGameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player_count(mut self, count: usize) -> Self {
        self.config = self.config.with_player_count(count);
        self
    }

    pub fn config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the engine and deal the first game.
    pub fn build(self, seed: u64) -> KittensGame {
        KittensGame::new(self.config, GameRng::new(seed))
    }
}

impl KittensGame {
    /// Create an engine drawing all randomness from `rng`, and deal.
    pub fn new(config: GameConfig, rng: GameRng) -> Self {
        assert!(config.validate().is_ok(), "Player count must be 2-8");
        let mut game = Self {
            state: GameState::new(config.player_count),
            config,
            rng,
            result: None,
            steps: 0,
        };
        game.reset();
        game
    }

    // === Lifecycle ===

    /// Shuffle a fresh deck and deal.
    ///
    /// Builds `copies_per_action_card` of each action card, deals
    /// `hand_size` rounds round-robin, gives each player one Defuse while
    /// the pool lasts, shuffles the leftover extras back in and inserts
    /// `player_count - 1` bombs at independent random positions.
    pub fn reset(&mut self) {
        let players = self.config.player_count;

        let mut state = GameState::new(players);

        let mut deck: Vec<Card> = (0..self.config.copies_per_action_card)
            .flat_map(|_| Card::ACTION_CARDS)
            .collect();
        self.rng.shuffle(&mut deck);

        // The discard is empty at deal time, so a deck too short for the
        // table simply leaves later seats with fewer cards.
        for _ in 0..self.config.hand_size {
            for player in PlayerId::all(players) {
                if let Some(card) = deck.pop() {
                    state.add_to_hand(player, card);
                }
            }
        }

        for player in PlayerId::all(players).take(self.config.dealt_defuses()) {
            state.add_to_hand(player, Card::Defuse);
        }

        for _ in 0..self.config.deck_defuses() {
            let pos = self.rng.gen_position(deck.len());
            deck.insert(pos, Card::Defuse);
        }

        for _ in 0..self.config.bombs() {
            let pos = self.rng.gen_position(deck.len());
            deck.insert(pos, Card::Bomb);
        }

        state.deck = deck.into_iter().collect();
        self.state = state;
        self.result = None;
        self.steps = 0;

        log::trace!(
            "dealt {} players, deck of {}",
            players,
            self.state.deck.len()
        );
    }

    /// Execute one action for the current player.
    ///
    /// Always makes progress: invalid plays pass the turn instead of
    /// stalling. Must not be called once `done` has been reported.
    pub fn step(&mut self, action: Action) -> StepOutcome {
        let player = self.state.turn;
        self.steps += 1;

        if !self.state.is_alive(player) {
            self.state.advance_turn();
            return StepOutcome::ongoing(
                0.0,
                StepInfo {
                    skipped_dead: true,
                    ..StepInfo::default()
                },
            );
        }

        let mut outcome = match action.card() {
            None => self.draw(player),
            Some(card) => self.play(player, action, card),
        };

        if outcome.info.reason == Some(EndReason::DeckEmpty) {
            self.result = Some(GameResult::Draw);
            return outcome;
        }

        if let Some(winner) = self.state.last_alive() {
            outcome.done = true;
            outcome.info.winner = Some(winner);
            outcome.info.reason = Some(EndReason::LastPlayerStanding);
            if winner == player && outcome.reward == 0.0 {
                outcome.reward = 1.0;
            }
            self.result = Some(GameResult::Winner(winner));
        }

        outcome
    }

    fn draw(&mut self, player: PlayerId) -> StepOutcome {
        let Some(card) = self.state.deck.pop_front() else {
            return StepOutcome {
                reward: 0.0,
                done: true,
                info: StepInfo {
                    reason: Some(EndReason::DeckEmpty),
                    ..StepInfo::default()
                },
            };
        };

        let mut info = StepInfo {
            drawn: Some(card),
            ..StepInfo::default()
        };
        let mut reward = 0.0;

        match card {
            Card::Bomb if self.state.defuse_counts[player] > 0 => {
                let consumed = self.state.take_from_hand(player, Card::Defuse);
                debug_assert!(consumed, "defuse count without a Defuse card");
                self.state.discard.push(Card::Defuse);

                let pos = self.rng.gen_position(self.state.deck.len());
                self.state.deck.insert(pos, Card::Bomb);
                info.defused = true;
                self.state.advance_turn();
            }
            Card::Bomb => {
                self.state.eliminate(player);
                self.state.graveyard.push(Card::Bomb);
                reward = -1.0;
                info.exploded = true;
                if self.state.alive_count() > 1 {
                    self.state.advance_turn();
                }
                log::trace!("{} exploded, {} left", player, self.state.alive_count());
            }
            other => {
                self.state.add_to_hand(player, other);
                self.state.advance_turn();
            }
        }

        StepOutcome::ongoing(reward, info)
    }

    fn play(&mut self, player: PlayerId, action: Action, card: Card) -> StepOutcome {
        let mut info = StepInfo::default();

        if self.state.take_from_hand(player, card) {
            self.state.discard.push(card);
            match action {
                Action::PlayAttack => self.state.attack_counter = ATTACK_DRAWS,
                Action::PlayShuffle => self.shuffle_deck(),
                Action::PlaySeeFuture => info.peek = Some(self.state.top_cards()),
                // Skip, Nope, Cat and a proactive Defuse only pass the turn.
                _ => {}
            }
        } else {
            info.invalid_play = true;
        }

        self.state.advance_turn();
        StepOutcome::ongoing(0.0, info)
    }

    fn shuffle_deck(&mut self) {
        let mut cards: Vec<Card> = self.state.deck.iter().copied().collect();
        self.rng.shuffle(&mut cards);
        self.state.deck = cards.into_iter().collect();
    }

    /// Pass the turn to the next alive player without acting.
    pub fn end_turn(&mut self) -> PlayerId {
        self.state.advance_turn();
        self.state.turn
    }

    // === Queries ===

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.config.player_count
    }

    #[must_use]
    pub fn current_player(&self) -> PlayerId {
        self.state.turn
    }

    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.state.alive_count()
    }

    #[must_use]
    pub fn is_alive(&self, player: PlayerId) -> bool {
        self.state.is_alive(player)
    }

    /// Next alive seat after `from`. At least one player must be alive.
    #[must_use]
    pub fn next_alive(&self, from: PlayerId) -> PlayerId {
        self.state.next_alive(from)
    }

    #[must_use]
    pub fn hand(&self, player: PlayerId) -> &[Card] {
        self.state.hand(player)
    }

    #[must_use]
    pub fn defuse_count(&self, player: PlayerId) -> u32 {
        self.state.defuse_counts[player]
    }

    /// Seat to act next. Same as `current_player`.
    #[must_use]
    pub fn turn(&self) -> PlayerId {
        self.state.turn
    }

    /// Draw pile, top first.
    #[must_use]
    pub fn deck(&self) -> &im::Vector<Card> {
        &self.state.deck
    }

    #[must_use]
    pub fn discard(&self) -> &[Card] {
        &self.state.discard
    }

    #[must_use]
    pub fn deck_len(&self) -> usize {
        self.state.deck.len()
    }

    #[must_use]
    pub fn attack_counter(&self) -> u32 {
        self.state.attack_counter
    }

    /// Set once the game has ended.
    #[must_use]
    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }

    /// `step` calls since the last reset.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Feature snapshot for `observer`.
    #[must_use]
    pub fn canonical_state(&self, observer: PlayerId) -> CanonicalState {
        CanonicalState::observe(&self.state, observer)
    }

    // === Persistence ===

    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            config: self.config.clone(),
            state: self.state.clone(),
            rng: self.rng.state(),
            result: self.result,
            steps: self.steps,
        }
    }

    #[must_use]
    pub fn from_snapshot(snapshot: GameSnapshot) -> Self {
        Self {
            config: snapshot.config,
            state: snapshot.state,
            rng: GameRng::from_state(&snapshot.rng),
            result: snapshot.result,
            steps: snapshot.steps,
        }
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }
}

/// Everything needed to resume a game exactly where it stopped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub config: GameConfig,
    pub state: GameState,
    pub rng: GameRngState,
    pub result: Option<GameResult>,
    pub steps: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Hand;

    fn game(players: usize) -> KittensGame {
        KittensGameBuilder::new().player_count(players).build(42)
    }

    /// Replace the table with hand-made piles.
    fn rig(game: &mut KittensGame, hands: Vec<Vec<Card>>, deck: Vec<Card>) {
        let state = game.state_mut();
        for (i, cards) in hands.into_iter().enumerate() {
            let p = PlayerId::new(i as u8);
            state.hands[p] = Hand::new();
            state.defuse_counts[p] = 0;
            for card in cards {
                state.add_to_hand(p, card);
            }
        }
        state.deck = deck.into_iter().collect();
        state.discard.clear();
        state.graveyard.clear();
        state.turn = PlayerId::new(0);
    }

    #[test]
    fn test_reset_five_players() {
        let game = game(5);
        let state = game.state();

        assert_eq!(state.hands.player_count(), 5);
        assert_eq!(state.defuse_counts.values().sum::<u32>(), 5);
        assert_eq!(game.alive_count(), 5);
        assert_eq!(game.deck_len(), 36 - 35 + 1 + 4);
        assert_eq!(state.count_everywhere(Card::Bomb), 4);
        assert_eq!(state.total_cards(), game.config().total_cards());
        for p in PlayerId::all(5) {
            assert_eq!(game.hand(p).len(), 8);
            assert_eq!(game.defuse_count(p), 1);
        }
        assert_eq!(game.current_player(), PlayerId::new(0));
        assert!(state.discard.is_empty());
    }

    #[test]
    fn test_reset_large_table_deals_short() {
        let game = game(6);
        let dealt: usize = PlayerId::all(6).map(|p| game.hand(p).len()).sum();
        // Six hands of seven exhaust the 36 action cards; only bombs are left.
        assert_eq!(dealt, 36 + 6);
        assert_eq!(game.deck_len(), 4);
    }

    #[test]
    fn test_draw_regular_card() {
        let mut game = game(3);
        rig(&mut game, vec![vec![], vec![], vec![]], vec![Card::Cat, Card::Bomb]);

        let out = game.step(Action::Draw);

        assert_eq!(out.reward, 0.0);
        assert!(!out.done);
        assert_eq!(out.info.drawn, Some(Card::Cat));
        assert_eq!(game.hand(PlayerId::new(0)), &[Card::Cat]);
        assert_eq!(game.current_player(), PlayerId::new(1));
    }

    #[test]
    fn test_draw_defuse_updates_count() {
        let mut game = game(2);
        rig(&mut game, vec![vec![], vec![]], vec![Card::Defuse]);

        game.step(Action::Draw);

        assert_eq!(game.defuse_count(PlayerId::new(0)), 1);
        assert!(game.state().defuse_counts_consistent());
    }

    #[test]
    fn test_bomb_defused_and_reinserted() {
        let mut game = game(3);
        rig(
            &mut game,
            vec![vec![Card::Defuse, Card::Skip], vec![], vec![]],
            vec![Card::Bomb, Card::Cat, Card::Cat],
        );

        let out = game.step(Action::Draw);

        assert!(out.info.defused);
        assert!(!out.done);
        assert_eq!(out.reward, 0.0);
        assert_eq!(game.defuse_count(PlayerId::new(0)), 0);
        assert_eq!(game.hand(PlayerId::new(0)), &[Card::Skip]);
        assert_eq!(game.state().discard, vec![Card::Defuse]);
        assert_eq!(game.deck_len(), 3);
        assert_eq!(game.state().count_everywhere(Card::Bomb), 1);
        assert_eq!(game.current_player(), PlayerId::new(1));
    }

    #[test]
    fn test_bomb_without_defuse_eliminates() {
        let mut game = game(3);
        rig(
            &mut game,
            vec![vec![Card::Cat, Card::Skip], vec![], vec![]],
            vec![Card::Bomb, Card::Cat],
        );

        let out = game.step(Action::Draw);

        assert_eq!(out.reward, -1.0);
        assert!(out.info.exploded);
        assert!(!out.done);
        assert!(!game.is_alive(PlayerId::new(0)));
        assert!(game.hand(PlayerId::new(0)).is_empty());
        assert_eq!(game.current_player(), PlayerId::new(1));
        assert_eq!(game.state().graveyard.len(), 3);
    }

    #[test]
    fn test_last_explosion_declares_winner() {
        let mut game = game(5);
        rig(
            &mut game,
            vec![vec![], vec![], vec![], vec![], vec![]],
            vec![Card::Bomb],
        );
        for seat in [1, 2, 3] {
            game.state_mut().eliminate(PlayerId::new(seat));
        }

        let out = game.step(Action::Draw);

        assert!(out.done);
        assert_eq!(out.reward, -1.0);
        assert_eq!(out.info.winner, Some(PlayerId::new(4)));
        assert_eq!(out.info.reason, Some(EndReason::LastPlayerStanding));
        assert_eq!(game.result(), Some(GameResult::Winner(PlayerId::new(4))));
        // Terminal: the turn stays put.
        assert_eq!(game.current_player(), PlayerId::new(0));
    }

    #[test]
    fn test_empty_deck_ends_in_draw() {
        let mut game = game(2);
        rig(&mut game, vec![vec![], vec![]], vec![]);

        let out = game.step(Action::Draw);

        assert!(out.done);
        assert_eq!(out.reward, 0.0);
        assert_eq!(out.info.reason, Some(EndReason::DeckEmpty));
        assert_eq!(out.info.winner, None);
        assert_eq!(game.result(), Some(GameResult::Draw));
        assert_eq!(game.current_player(), PlayerId::new(0));
    }

    #[test]
    fn test_invalid_play_passes_turn() {
        let mut game = game(3);
        rig(&mut game, vec![vec![Card::Cat], vec![], vec![]], vec![Card::Cat]);

        let out = game.step(Action::PlaySkip);

        assert!(out.info.invalid_play);
        assert_eq!(out.reward, 0.0);
        assert_eq!(game.current_player(), PlayerId::new(1));
        assert_eq!(game.hand(PlayerId::new(0)), &[Card::Cat]);
    }

    #[test]
    fn test_play_skip_discards() {
        let mut game = game(2);
        rig(&mut game, vec![vec![Card::Skip], vec![]], vec![Card::Cat]);

        let out = game.step(Action::PlaySkip);

        assert!(!out.info.invalid_play);
        assert_eq!(game.state().discard, vec![Card::Skip]);
        assert_eq!(game.deck_len(), 1);
        assert_eq!(game.current_player(), PlayerId::new(1));
    }

    #[test]
    fn test_attack_sets_counter() {
        let mut game = game(2);
        rig(&mut game, vec![vec![Card::Attack], vec![]], vec![Card::Cat]);

        game.step(Action::PlayAttack);

        assert_eq!(game.attack_counter(), ATTACK_DRAWS);
        assert_eq!(game.current_player(), PlayerId::new(1));
    }

    #[test]
    fn test_see_future_pads_peek() {
        let mut game = game(2);
        rig(
            &mut game,
            vec![vec![Card::SeeFuture], vec![]],
            vec![Card::Bomb, Card::Nope],
        );

        let out = game.step(Action::PlaySeeFuture);

        assert_eq!(out.info.peek, Some([Some(Card::Bomb), Some(Card::Nope), None]));
    }

    #[test]
    fn test_shuffle_keeps_deck_contents() {
        let mut game = game(2);
        let deck = vec![
            Card::Bomb,
            Card::Cat,
            Card::Nope,
            Card::Skip,
            Card::Attack,
            Card::Defuse,
        ];
        rig(&mut game, vec![vec![Card::Shuffle], vec![]], deck.clone());

        game.step(Action::PlayShuffle);

        let mut after: Vec<Card> = game.state().deck.iter().copied().collect();
        let mut before = deck;
        after.sort();
        before.sort();
        assert_eq!(after, before);
    }

    #[test]
    fn test_proactive_defuse_advances_turn() {
        let mut game = game(2);
        rig(&mut game, vec![vec![Card::Defuse], vec![]], vec![Card::Cat]);

        let out = game.step(Action::PlayDefuse);

        assert!(!out.info.invalid_play);
        assert_eq!(game.defuse_count(PlayerId::new(0)), 0);
        assert_eq!(game.state().discard, vec![Card::Defuse]);
        assert_eq!(game.current_player(), PlayerId::new(1));
    }

    #[test]
    fn test_dead_seat_is_skipped() {
        let mut game = game(3);
        game.state_mut().eliminate(PlayerId::new(0));

        let out = game.step(Action::Draw);

        assert!(out.info.skipped_dead);
        assert!(!out.done);
        assert_eq!(game.current_player(), PlayerId::new(1));
    }

    #[test]
    fn test_end_turn_skips_dead() {
        let mut game = game(3);
        game.state_mut().eliminate(PlayerId::new(1));

        assert_eq!(game.end_turn(), PlayerId::new(2));
        assert_eq!(game.end_turn(), PlayerId::new(0));
    }

    #[test]
    #[should_panic(expected = "Player count must be 2-8")]
    fn test_rejects_single_seat_table() {
        let config = GameConfig {
            player_count: 1,
            ..GameConfig::default()
        };
        let _ = KittensGame::new(config, GameRng::new(0));
    }

    #[test]
    fn test_snapshot_resumes_identically() {
        let mut original = game(4);
        for _ in 0..3 {
            original.step(Action::Draw);
        }

        let mut resumed = KittensGame::from_snapshot(original.snapshot());
        for _ in 0..10 {
            if original.is_over() {
                break;
            }
            assert_eq!(original.step(Action::PlayShuffle), resumed.step(Action::PlayShuffle));
            assert_eq!(original.step(Action::Draw), resumed.step(Action::Draw));
        }
        assert_eq!(original.state(), resumed.state());
    }
}
