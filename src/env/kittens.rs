//! `Environment` adapter over `KittensGame`.

use serde::{Deserialize, Serialize};

use crate::core::{Action, GameConfig, GameRng, PlayerId};
use crate::encoding::{HashedEncoder, StateEncoder, DEFAULT_NUM_STATES};
use crate::games::kittens::{EndReason, KittensGame, StepInfo, StepOutcome};

use super::behavior::Behavior;
use super::{Environment, Observation, Transition};

/// Consecutive deals `reset` may discard before giving up on the table setup.
pub const MAX_REDEALS: usize = 1000;

/// Which seats the learner controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "player", rename_all = "snake_case")]
pub enum Seat {
    /// One seat; everyone else follows the opponent `Behavior`.
    Single(PlayerId),
    /// Whoever is to act (self-play).
    All,
}

/// Configuration for `KittensEnv`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    pub game: GameConfig,

    /// Rows in the state table.
    pub num_states: usize,

    /// Engine steps per episode before truncation. Opponent moves count.
    pub max_steps: usize,

    /// Reward replacing the last step's reward on truncation.
    pub truncation_penalty: f64,

    pub seat: Seat,

    /// Policy for seats the learner does not control.
    pub opponent: Behavior,

    pub seed: u64,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            num_states: DEFAULT_NUM_STATES,
            max_steps: 1000,
            truncation_penalty: -1.0,
            seat: Seat::Single(PlayerId::new(0)),
            opponent: Behavior::Baseline,
            seed: 0,
        }
    }
}

impl EnvConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_game(mut self, game: GameConfig) -> Self {
        self.game = game;
        self
    }

    pub fn with_player_count(mut self, count: usize) -> Self {
        self.game = self.game.with_player_count(count);
        self
    }

    pub fn with_num_states(mut self, num_states: usize) -> Self {
        self.num_states = num_states;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_truncation_penalty(mut self, penalty: f64) -> Self {
        self.truncation_penalty = penalty;
        self
    }

    pub fn with_seat(mut self, seat: Seat) -> Self {
        self.seat = seat;
        self
    }

    pub fn with_opponent(mut self, opponent: Behavior) -> Self {
        self.opponent = opponent;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Card game environment.
///
/// With `Seat::Single(p)` an episode is `p`'s game: it ends when `p` is
/// eliminated, when someone wins, on an empty deck or at the step cap.
/// Observations are always taken from `p`'s view at `p`'s next turn, and a
/// win by `p` that happens while opponents move is credited as +1.
///
/// With `Seat::All` every step is taken by the current player and the next
/// observation is from the view of whoever acts next.
pub struct KittensEnv {
    config: EnvConfig,
    game: KittensGame,
    encoder: HashedEncoder,
    /// Opponent decisions.
    rng: GameRng,
    steps: usize,
    redeals: u64,
}

impl KittensEnv {
    pub fn new(config: EnvConfig) -> Self {
        if let Seat::Single(p) = config.seat {
            assert!(
                p.index() < config.game.player_count,
                "Learner seat {} out of range",
                p.index()
            );
        }
        let mut rng = GameRng::new(config.seed);
        let game = KittensGame::new(config.game.clone(), rng.fork());
        Self {
            encoder: HashedEncoder::new(config.num_states),
            config,
            game,
            rng,
            steps: 0,
            redeals: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    #[must_use]
    pub fn game(&self) -> &KittensGame {
        &self.game
    }

    /// Engine steps taken this episode. Opponent moves made during `reset`
    /// are not counted.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Deals thrown away because opponents finished the game before the
    /// learner's first turn.
    #[must_use]
    pub fn redeals(&self) -> u64 {
        self.redeals
    }

    /// The seat the next observation belongs to.
    fn observer(&self) -> PlayerId {
        match self.config.seat {
            Seat::Single(p) => p,
            Seat::All => self.game.current_player(),
        }
    }

    fn observe(&self) -> Observation {
        let state = self.game.canonical_state(self.observer());
        Observation {
            id: self.encoder.encode(&state),
            state,
        }
    }

    fn opponent_step(&mut self) -> StepOutcome {
        let seat = self.game.current_player();
        let action = self.config.opponent.choose(self.game.hand(seat), &mut self.rng);
        self.steps += 1;
        self.game.step(action)
    }

    /// Let opponents act until the learner is up or the game ends.
    /// Returns `(game_ended, step_cap_hit)`.
    fn run_opponents(&mut self, learner: PlayerId) -> (bool, bool) {
        while self.game.current_player() != learner {
            if self.steps >= self.config.max_steps {
                return (false, true);
            }
            let outcome = self.opponent_step();
            if outcome.done {
                return (true, false);
            }
        }
        (false, false)
    }

    /// Opponents seated before the learner move first. Returns whether they
    /// finished the game on their own.
    ///
    /// The learner stays alive while others move, so this reaches the
    /// learner's turn within one lap of the table.
    fn open(&mut self, learner: PlayerId) -> bool {
        while self.game.current_player() != learner {
            if self.opponent_step().done {
                return true;
            }
        }
        false
    }

    fn truncate(&self, mut info: StepInfo) -> Transition {
        info.truncated = true;
        info.reason = Some(EndReason::Truncated);
        log::debug!("episode truncated after {} steps", self.steps);
        Transition {
            next: self.observe(),
            reward: self.config.truncation_penalty,
            done: true,
            truncated: true,
            info,
            winner: None,
        }
    }

    fn finish(&self, reward: f64, done: bool, info: StepInfo) -> Transition {
        Transition {
            next: self.observe(),
            reward,
            done,
            truncated: false,
            info,
            winner: self.game.result().and_then(|r| r.winner()),
        }
    }

    fn step_single(&mut self, learner: PlayerId, action: Action) -> Transition {
        self.steps += 1;
        let outcome = self.game.step(action);
        let mut reward = outcome.reward;

        if outcome.done || !self.game.is_alive(learner) {
            return self.finish(reward, true, outcome.info);
        }
        if self.steps >= self.config.max_steps {
            return self.truncate(outcome.info);
        }

        let (ended, capped) = self.run_opponents(learner);
        if capped {
            return self.truncate(outcome.info);
        }
        if ended {
            if self.game.result().is_some_and(|r| r.is_winner(learner)) {
                reward += 1.0;
            }
            return self.finish(reward, true, outcome.info);
        }
        self.finish(reward, false, outcome.info)
    }

    fn step_all(&mut self, action: Action) -> Transition {
        self.steps += 1;
        let outcome = self.game.step(action);
        if !outcome.done && self.steps >= self.config.max_steps {
            return self.truncate(outcome.info);
        }
        self.finish(outcome.reward, outcome.done, outcome.info)
    }
}

impl Environment for KittensEnv {
    fn reset(&mut self) -> Observation {
        for attempt in 0.. {
            assert!(
                attempt < MAX_REDEALS,
                "opponents ended {} deals in a row before the learner acted",
                MAX_REDEALS
            );
            self.game.reset();
            if let Seat::Single(learner) = self.config.seat {
                if self.open(learner) {
                    self.redeals += 1;
                    log::debug!("game ended before {} acted, redealing", learner);
                    continue;
                }
            }
            break;
        }
        self.steps = 0;
        self.observe()
    }

    fn step(&mut self, action: Action) -> Transition {
        match self.config.seat {
            Seat::Single(learner) => self.step_single(learner, action),
            Seat::All => self.step_all(action),
        }
    }

    fn num_states(&self) -> usize {
        self.encoder.num_states()
    }

    fn tracked_seat(&self) -> Option<PlayerId> {
        match self.config.seat {
            Seat::Single(p) => Some(p),
            Seat::All => Some(PlayerId::new(0)),
        }
    }
}
