//! Observed `(s, a, r, s')` transitions: collection, counting and CSV files.
//!
//! The CSV layout is one header row `s,a,r,sp` followed by one row per
//! transition, with the action written as its integer id.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{Action, GameConfig, GameRng};
use crate::encoding::{HashedEncoder, StateEncoder, StateId, DEFAULT_NUM_STATES};
use crate::env::Behavior;
use crate::error::{Error, Result};
use crate::games::kittens::KittensGame;

/// One row of a transition file.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub s: StateId,
    pub a: usize,
    pub r: f64,
    pub sp: StateId,
}

impl TransitionRecord {
    #[must_use]
    pub fn new(s: StateId, action: Action, r: f64, sp: StateId) -> Self {
        Self {
            s,
            a: action.index(),
            r,
            sp,
        }
    }

    pub fn action(&self) -> Result<Action> {
        Action::from_index(self.a).ok_or(Error::InvalidAction(self.a))
    }
}

pub fn write_csv<W: Write>(writer: W, records: &[TransitionRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read records, rejecting unknown action ids.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<TransitionRecord>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: TransitionRecord = row?;
        record.action()?;
        records.push(record);
    }
    Ok(records)
}

pub fn save_csv(path: impl AsRef<Path>, records: &[TransitionRecord]) -> Result<()> {
    write_csv(File::create(path)?, records)
}

pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<TransitionRecord>> {
    read_csv(File::open(path)?)
}

/// Simulation settings for generating transitions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    pub game: GameConfig,
    pub games: usize,
    /// Steps per game before it is abandoned.
    pub max_steps: usize,
    /// Policy every seat follows.
    pub behavior: Behavior,
    pub num_states: usize,
    pub seed: u64,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            games: 1000,
            max_steps: 1000,
            behavior: Behavior::Baseline,
            num_states: DEFAULT_NUM_STATES,
            seed: 0,
        }
    }
}

impl CollectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_game(mut self, game: GameConfig) -> Self {
        self.game = game;
        self
    }

    pub fn with_games(mut self, games: usize) -> Self {
        self.games = games;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn with_num_states(mut self, num_states: usize) -> Self {
        self.num_states = num_states;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Play whole games and record every seat's moves.
///
/// `s` and `sp` are both taken from the acting player's view, before and
/// after its own step.
pub fn collect_transitions(config: &CollectionConfig) -> Vec<TransitionRecord> {
    let encoder = HashedEncoder::new(config.num_states);
    let mut rng = GameRng::new(config.seed);
    let mut game = KittensGame::new(config.game.clone(), rng.fork());
    let mut records = Vec::new();

    for index in 0..config.games {
        if index > 0 {
            game.reset();
        }
        let mut steps = 0;
        while !game.is_over() && steps < config.max_steps {
            let player = game.current_player();
            let s = encoder.encode(&game.canonical_state(player));
            let action = config.behavior.choose(game.hand(player), &mut rng);
            let outcome = game.step(action);
            let sp = encoder.encode(&game.canonical_state(player));
            records.push(TransitionRecord::new(s, action, outcome.reward, sp));
            steps += 1;
        }
    }

    log::info!(
        "{:<32}{:<32}",
        "collected transitions",
        format!("{} from {} games", records.len(), config.games)
    );
    records
}

/// Counts for one `(state, action)` pair.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionCounts {
    pub next: FxHashMap<StateId, u64>,
    pub reward_sum: f64,
    pub visits: u64,
}

impl ActionCounts {
    /// Mean observed reward.
    #[must_use]
    pub fn mean_reward(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.reward_sum / self.visits as f64
        }
    }

    /// Shannon entropy (nats) of the empirical next-state distribution.
    #[must_use]
    pub fn entropy(&self) -> f64 {
        let total = self.visits as f64;
        self.next
            .values()
            .map(|&n| n as f64 / total)
            .filter(|&p| p > 0.0)
            .map(|p| -p * p.ln())
            .sum()
    }
}

/// Sparse `N[s][a][s']`, `Rsum[s][a]` and `Rcount[s][a]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransitionCounts {
    pairs: FxHashMap<(StateId, Action), ActionCounts>,
}

impl TransitionCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, s: StateId, action: Action, reward: f64, sp: StateId) {
        let counts = self.pairs.entry((s, action)).or_default();
        *counts.next.entry(sp).or_insert(0) += 1;
        counts.reward_sum += reward;
        counts.visits += 1;
    }

    pub fn from_records(records: &[TransitionRecord]) -> Result<Self> {
        let mut counts = Self::new();
        counts.extend(records)?;
        Ok(counts)
    }

    pub fn extend(&mut self, records: &[TransitionRecord]) -> Result<()> {
        for record in records {
            self.record(record.s, record.action()?, record.r, record.sp);
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, s: StateId, action: Action) -> Option<&ActionCounts> {
        self.pairs.get(&(s, action))
    }

    #[must_use]
    pub fn visits(&self, s: StateId, action: Action) -> u64 {
        self.get(s, action).map_or(0, |c| c.visits)
    }

    /// `None` for pairs never observed.
    #[must_use]
    pub fn entropy(&self, s: StateId, action: Action) -> Option<f64> {
        self.get(s, action).map(ActionCounts::entropy)
    }

    /// Distinct `(state, action)` pairs seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Total transitions recorded.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.pairs.values().map(|c| c.visits).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StateId, Action, &ActionCounts)> {
        self.pairs.iter().map(|(&(s, a), c)| (s, a, c))
    }
}
