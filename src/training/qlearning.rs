//! Online tabular Q-learning.

use serde::{Deserialize, Serialize};

use crate::core::{Action, GameRng};
use crate::encoding::StateId;
use crate::env::{random_action, Environment};

use super::policy::Policy;
use super::q_table::QTable;
use super::report::{EpisodeStats, ProgressConfig, TrainingReport};
use super::schedule::EpsilonSchedule;

/// Configuration for `QLearningTrainer`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QLearningConfig {
    /// Learning rate.
    pub alpha: f64,

    /// Discount factor.
    pub gamma: f64,

    pub epsilon: EpsilonSchedule,

    /// Steps after which an episode is abandoned without a terminal update.
    pub max_episode_steps: usize,

    pub progress: ProgressConfig,

    /// Seeds exploration.
    pub seed: u64,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.95,
            epsilon: EpsilonSchedule::Linear {
                start: 0.3,
                end: 0.05,
            },
            max_episode_steps: 2000,
            progress: ProgressConfig::default(),
            seed: 0,
        }
    }
}

impl QLearningConfig {
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

    pub fn with_epsilon(mut self, epsilon: EpsilonSchedule) -> Self {
        self.epsilon = epsilon;
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

/// Epsilon-greedy Q-learning over an `Environment`.
pub struct QLearningTrainer {
    config: QLearningConfig,
    q: QTable,
    rng: GameRng,
    epsilon: f64,
}

impl QLearningTrainer {
    pub fn new(config: QLearningConfig, num_states: usize) -> Self {
        Self {
            epsilon: config.epsilon.start(),
            rng: GameRng::new(config.seed),
            q: QTable::new(num_states),
            config,
        }
    }

    #[must_use]
    pub fn q_table(&self) -> &QTable {
        &self.q
    }

    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Uniform action with probability epsilon, greedy otherwise.
    pub fn select_action(&mut self, state: StateId) -> Action {
        if self.rng.gen_bool(self.epsilon) {
            random_action(&mut self.rng)
        } else {
            self.q.best_action(state)
        }
    }

    /// One TD update. Terminal transitions do not bootstrap.
    /// Returns the TD error.
    pub fn update(&mut self, s: StateId, action: Action, reward: f64, sp: StateId, done: bool) -> f64 {
        let target = if done {
            reward
        } else {
            reward + self.config.gamma * self.q.max_value(sp)
        };
        let current = self.q.get(s, action);
        let error = target - current;
        self.q.set(s, action, current + self.config.alpha * error);
        error
    }

    /// Play and learn from one episode.
    pub fn run_episode<E: Environment>(&mut self, env: &mut E) -> EpisodeStats {
        let mut obs = env.reset();
        let mut stats = EpisodeStats {
            reward: 0.0,
            length: 0,
            won: false,
            truncated: false,
        };

        while stats.length < self.config.max_episode_steps {
            let action = self.select_action(obs.id);
            let t = env.step(action);
            self.update(obs.id, action, t.reward, t.next.id, t.done);

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

    /// Train for up to `episodes`, decaying epsilon per the schedule.
    pub fn train<E: Environment>(&mut self, env: &mut E, episodes: usize) -> TrainingReport {
        let mut report = TrainingReport::new(self.config.progress);

        for episode in 0..episodes {
            self.epsilon = self.config.epsilon.value(episode, episodes);
            let stats = self.run_episode(env);
            let stop = report.record(stats);

            if report.should_log() {
                log::info!(
                    "episode {:>7}  reward {:>7.3}  win rate {:>5.1}%  epsilon {:.3}",
                    report.episodes(),
                    report.rolling_reward(),
                    report.rolling_win_rate() * 100.0,
                    self.epsilon
                );
            }
            if stop {
                break;
            }
        }
        report
    }

    /// Greedy policy over every state id.
    #[must_use]
    pub fn policy(&self) -> Policy {
        self.q.policy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::CanonicalState;
    use crate::env::{Observation, Transition};
    use crate::games::kittens::StepInfo;

    /// Two states; PlaySkip in state 0 ends the episode with reward 1, anything else stays put.
    struct Corridor;

    fn obs(id: StateId) -> Observation {
        Observation {
            id,
            state: CanonicalState::default(),
        }
    }

    impl Environment for Corridor {
        fn reset(&mut self) -> Observation {
            obs(0)
        }

        fn step(&mut self, action: Action) -> Transition {
            let done = action == Action::PlaySkip;
            Transition {
                next: obs(usize::from(done)),
                reward: if done { 1.0 } else { 0.0 },
                done,
                truncated: false,
                info: StepInfo::default(),
                winner: None,
            }
        }

        fn num_states(&self) -> usize {
            2
        }
    }

    #[test]
    fn test_update_terminal_ignores_next_state() {
        let mut trainer = QLearningTrainer::new(QLearningConfig::new().with_alpha(0.5), 2);
        trainer.q.set(1, Action::Draw, 100.0);

        trainer.update(0, Action::Draw, 1.0, 1, true);
        assert_eq!(trainer.q_table().get(0, Action::Draw), 0.5);

        trainer.update(0, Action::PlayCat, 1.0, 1, false);
        let expected = 0.5 * (1.0 + 0.95 * 100.0);
        assert!((trainer.q_table().get(0, Action::PlayCat) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_learns_corridor() {
        let config = QLearningConfig::new()
            .with_epsilon(EpsilonSchedule::Fixed { epsilon: 0.5 })
            .with_seed(1);
        let mut trainer = QLearningTrainer::new(config, 2);
        let report = trainer.train(&mut Corridor, 300);

        assert_eq!(report.episodes(), 300);
        assert_eq!(trainer.policy().get(0), Some(Action::PlaySkip));
        assert!((trainer.q_table().get(0, Action::PlaySkip) - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_epsilon_follows_schedule() {
        let config = QLearningConfig::new().with_epsilon(EpsilonSchedule::Linear {
            start: 0.4,
            end: 0.0,
        });
        let mut trainer = QLearningTrainer::new(config, 2);
        assert_eq!(trainer.epsilon(), 0.4);

        trainer.train(&mut Corridor, 4);
        assert!((trainer.epsilon() - 0.1).abs() < 1e-12);
    }
}
