//! Q-learning with a belief state.
//!
//! The agent keeps Beta beliefs over "the next card I draw is a Bomb" and
//! "... is a Defuse", a Dirichlet over deck composition, and the same
//! transition counts the MLE planner uses. Action values are the Q row plus
//! heuristic adjustments driven by those beliefs; both action selection and
//! the bootstrap target use the adjusted values.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{Action, Card, GameRng};
use crate::encoding::{CanonicalState, StateId};
use crate::env::{random_action, Environment, Observation, Transition};
use crate::error::Result;

use super::policy::Policy;
use super::q_table::{argmax, QTable};
use super::report::{EpisodeStats, ProgressConfig, TrainingReport};
use super::schedule::EpsilonSchedule;
use super::transitions::TransitionCounts;

/// Defuses at which drawing is no longer penalised.
pub const DEFUSE_SATURATION: f64 = 3.0;

/// Hands larger than this favour playing cards.
pub const LARGE_HAND: u32 = 5;

/// Bonus for each action-card play when the hand is large.
pub const PLAY_BONUS: f64 = 0.1;

/// Bomb belief above which a held Defuse is worth playing.
pub const DEFUSE_BONUS_THRESHOLD: f64 = 0.2;

pub const DEFUSE_BONUS_SCALE: f64 = 0.5;

/// Prior share of each card type in the deck.
pub const DECK_PRIOR: [(Card, f64); 8] = [
    (Card::Bomb, 0.10),
    (Card::Defuse, 0.15),
    (Card::Skip, 0.15),
    (Card::Attack, 0.15),
    (Card::Shuffle, 0.10),
    (Card::Nope, 0.10),
    (Card::SeeFuture, 0.10),
    (Card::Cat, 0.15),
];

/// Beta-Bernoulli belief over one event.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BetaBelief {
    pub alpha: f64,
    pub beta: f64,
}

impl BetaBelief {
    /// A prior with the given mean worth `strength` pseudo-observations.
    #[must_use]
    pub fn with_mean(mean: f64, strength: f64) -> Self {
        Self {
            alpha: mean * strength,
            beta: (1.0 - mean) * strength,
        }
    }

    /// Posterior mean.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    pub fn observe(&mut self, happened: bool) {
        if happened {
            self.alpha += 1.0;
        } else {
            self.beta += 1.0;
        }
    }
}

/// Beliefs about the next draw.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Beliefs {
    pub bomb: BetaBelief,
    pub defuse: BetaBelief,
}

impl Beliefs {
    #[must_use]
    pub fn bomb_probability(&self) -> f64 {
        self.bomb.mean()
    }

    #[must_use]
    pub fn defuse_probability(&self) -> f64 {
        self.defuse.mean()
    }

    /// Update from a card this agent drew.
    pub fn observe_draw(&mut self, card: Card) {
        self.bomb.observe(card == Card::Bomb);
        self.defuse.observe(card == Card::Defuse);
    }
}

/// Dirichlet pseudo-counts over card types in the deck.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeckComposition {
    counts: BTreeMap<Card, f64>,
}

impl DeckComposition {
    /// `DECK_PRIOR` scaled to `strength` pseudo-observations.
    #[must_use]
    pub fn prior(strength: f64) -> Self {
        Self {
            counts: DECK_PRIOR.iter().map(|&(c, p)| (c, p * strength)).collect(),
        }
    }

    pub fn observe(&mut self, card: Card) {
        *self.counts.entry(card).or_insert(0.0) += 1.0;
    }

    /// Posterior mean share of `card`.
    #[must_use]
    pub fn probability(&self, card: Card) -> f64 {
        let total: f64 = self.counts.values().sum();
        if total <= 0.0 {
            return 0.0;
        }
        self.counts.get(&card).copied().unwrap_or(0.0) / total
    }

    #[must_use]
    pub fn probabilities(&self) -> BTreeMap<Card, f64> {
        self.counts.keys().map(|&c| (c, self.probability(c))).collect()
    }
}

/// The belief state saved beside a policy file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeliefSnapshot {
    pub beliefs: Beliefs,
    #[serde(alias = "deck_composition_prior")]
    pub deck_composition: DeckComposition,
    pub exploration: f64,
}

impl BeliefSnapshot {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// `dir/stem.txt` -> `dir/stem_beliefs.json`.
#[must_use]
pub fn belief_path(policy_path: &Path) -> PathBuf {
    let stem = policy_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    policy_path.with_file_name(format!("{stem}_beliefs.json"))
}

/// Configuration for `BayesianAgent`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BayesianConfig {
    pub alpha: f64,
    pub gamma: f64,
    pub exploration: EpsilonSchedule,

    /// Prior mean for drawing a Bomb.
    pub bomb_prior: f64,
    /// Prior mean for drawing a Defuse.
    pub defuse_prior: f64,
    /// Pseudo-observations behind each Beta prior.
    pub prior_strength: f64,
    /// Pseudo-observations behind the deck composition prior.
    pub deck_prior_strength: f64,

    /// Apply belief updates and value adjustments. Off reduces the agent
    /// to plain Q-learning.
    pub use_belief_update: bool,

    pub max_episode_steps: usize,
    pub progress: ProgressConfig,
    pub seed: u64,
}

impl Default for BayesianConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.99,
            exploration: EpsilonSchedule::Exponential {
                start: 0.3,
                end: 0.01,
                decay: 0.9995,
            },
            bomb_prior: 0.15,
            defuse_prior: 0.1,
            prior_strength: 2.0,
            deck_prior_strength: 10.0,
            use_belief_update: true,
            max_episode_steps: 1000,
            progress: ProgressConfig::default().with_early_stop(Some(0.95)),
            seed: 0,
        }
    }
}

impl BayesianConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_exploration(mut self, exploration: EpsilonSchedule) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn with_priors(mut self, bomb: f64, defuse: f64) -> Self {
        self.bomb_prior = bomb;
        self.defuse_prior = defuse;
        self
    }

    pub fn with_belief_update(mut self, enabled: bool) -> Self {
        self.use_belief_update = enabled;
        self
    }

    pub fn with_max_episode_steps(mut self, steps: usize) -> Self {
        self.max_episode_steps = steps;
        self
    }

    pub fn with_progress(mut self, progress: ProgressConfig) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Belief-augmented Q-learner.
pub struct BayesianAgent {
    config: BayesianConfig,
    q: QTable,
    beliefs: Beliefs,
    deck: DeckComposition,
    counts: TransitionCounts,
    /// First canonical state seen for each id, used for policy extraction.
    representatives: FxHashMap<StateId, CanonicalState>,
    exploration: f64,
    rng: GameRng,
}

impl BayesianAgent {
    pub fn new(config: BayesianConfig, num_states: usize) -> Self {
        Self {
            q: QTable::new(num_states),
            beliefs: Beliefs {
                bomb: BetaBelief::with_mean(config.bomb_prior, config.prior_strength),
                defuse: BetaBelief::with_mean(config.defuse_prior, config.prior_strength),
            },
            deck: DeckComposition::prior(config.deck_prior_strength),
            counts: TransitionCounts::new(),
            representatives: FxHashMap::default(),
            exploration: config.exploration.start(),
            rng: GameRng::new(config.seed),
            config,
        }
    }

    // === Accessors ===

    #[must_use]
    pub fn config(&self) -> &BayesianConfig {
        &self.config
    }

    #[must_use]
    pub fn q_table(&self) -> &QTable {
        &self.q
    }

    #[must_use]
    pub fn beliefs(&self) -> &Beliefs {
        &self.beliefs
    }

    #[must_use]
    pub fn deck_composition(&self) -> &DeckComposition {
        &self.deck
    }

    #[must_use]
    pub fn counts(&self) -> &TransitionCounts {
        &self.counts
    }

    #[must_use]
    pub fn exploration(&self) -> f64 {
        self.exploration
    }

    // === Acting ===

    /// Q row plus belief-driven adjustments.
    #[must_use]
    pub fn calculate_action_values(&self, obs: &Observation) -> [f64; Action::COUNT] {
        let mut values = [0.0; Action::COUNT];
        values.copy_from_slice(self.q.row(obs.id));

        if !self.config.use_belief_update {
            return values;
        }

        let p_bomb = self.beliefs.bomb_probability();
        let defuse = obs.state.defuse;

        if p_bomb > 0.0 {
            let cover = (f64::from(defuse) / DEFUSE_SATURATION).min(1.0);
            values[Action::Draw.index()] -= p_bomb * (1.0 - cover);
        }

        if obs.state.hand_size > LARGE_HAND {
            for action in Action::ALL.into_iter().filter(|a| a.is_action_card_play()) {
                values[action.index()] += PLAY_BONUS;
            }
        }

        if p_bomb > DEFUSE_BONUS_THRESHOLD && defuse > 0 {
            values[Action::PlayDefuse.index()] += p_bomb * DEFUSE_BONUS_SCALE;
        }

        // Predictable actions earn a bonus that fades with exploration.
        for action in Action::ALL {
            if let Some(entropy) = self.counts.entropy(obs.id, action) {
                values[action.index()] += self.exploration / (1.0 + entropy);
            }
        }

        values
    }

    /// Epsilon-greedy over the adjusted values.
    pub fn select_action(&mut self, obs: &Observation) -> Action {
        if self.rng.gen_bool(self.exploration) {
            random_action(&mut self.rng)
        } else {
            Action::ALL[argmax(&self.calculate_action_values(obs))]
        }
    }

    // === Learning ===

    /// Fold one transition into beliefs and counts.
    pub fn observe(&mut self, obs: &Observation, action: Action, t: &Transition) {
        if self.config.use_belief_update {
            if action == Action::Draw {
                if let Some(card) = t.info.drawn {
                    self.beliefs.observe_draw(card);
                    self.deck.observe(card);
                }
            }
            for card in t.info.peek.iter().flatten().flatten() {
                self.deck.observe(*card);
            }
        }

        self.counts.record(obs.id, action, t.reward, t.next.id);
        self.representatives.entry(obs.id).or_insert(obs.state);
        self.representatives.entry(t.next.id).or_insert(t.next.state);
    }

    /// TD update bootstrapping from the adjusted values of `next`.
    /// Returns the TD error.
    pub fn update_q_value(
        &mut self,
        obs: &Observation,
        action: Action,
        reward: f64,
        next: &Observation,
        done: bool,
    ) -> f64 {
        let target = if done {
            reward
        } else {
            let best = self
                .calculate_action_values(next)
                .into_iter()
                .fold(f64::NEG_INFINITY, f64::max);
            reward + self.config.gamma * best
        };
        let current = self.q.get(obs.id, action);
        let error = target - current;
        self.q.set(obs.id, action, current + self.config.alpha * error);
        error
    }

    pub fn run_episode<E: Environment>(&mut self, env: &mut E) -> EpisodeStats {
        let mut obs = env.reset();
        let mut stats = EpisodeStats {
            reward: 0.0,
            length: 0,
            won: false,
            truncated: false,
        };

        while stats.length < self.config.max_episode_steps {
            let action = self.select_action(&obs);
            let t = env.step(action);
            self.observe(&obs, action, &t);
            self.update_q_value(&obs, action, t.reward, &t.next, t.done);

            stats.reward += t.reward;
            stats.length += 1;
            obs = t.next;

            if t.done {
                stats.truncated = t.truncated;
                stats.won = t.winner.is_some() && t.winner == env.tracked_seat();
                break;
            }
        }
        stats
    }

    /// Train for up to `episodes`, stopping early on the configured win rate.
    pub fn train<E: Environment>(&mut self, env: &mut E, episodes: usize) -> TrainingReport {
        let mut report = TrainingReport::new(self.config.progress);

        for episode in 0..episodes {
            self.exploration = self.config.exploration.value(episode, episodes);
            let stats = self.run_episode(env);
            let stop = report.record(stats);

            if report.should_log() {
                log::info!(
                    "episode {:>7}  reward {:>7.3}  win rate {:>5.1}%  exploration {:.4}  p(bomb) {:.3}",
                    report.episodes(),
                    report.rolling_reward(),
                    report.rolling_win_rate() * 100.0,
                    self.exploration,
                    self.beliefs.bomb_probability()
                );
            }
            if stop {
                break;
            }
        }
        report
    }

    /// Greedy policy. States with a remembered canonical state use the
    /// adjusted values; the rest fall back to the raw Q row.
    #[must_use]
    pub fn policy(&self) -> Policy {
        (0..self.q.num_states())
            .map(|id| match self.representatives.get(&id) {
                Some(&state) => {
                    Action::ALL[argmax(&self.calculate_action_values(&Observation { id, state }))]
                }
                None => self.q.best_action(id),
            })
            .collect()
    }

    // === Persistence ===

    #[must_use]
    pub fn snapshot(&self) -> BeliefSnapshot {
        BeliefSnapshot {
            beliefs: self.beliefs,
            deck_composition: self.deck.clone(),
            exploration: self.exploration,
        }
    }

    pub fn restore(&mut self, snapshot: BeliefSnapshot) {
        self.beliefs = snapshot.beliefs;
        self.deck = snapshot.deck_composition;
        self.exploration = snapshot.exploration;
    }

    /// Write the policy to `path` and the belief snapshot beside it.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        self.policy().save(path)?;
        let beliefs = belief_path(path);
        self.snapshot().save(&beliefs)?;
        Ok(beliefs)
    }
}
