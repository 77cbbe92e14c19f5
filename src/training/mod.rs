//! Tabular learners and their file formats.
//!
//! - `QLearningTrainer`: online epsilon-greedy Q-learning
//! - `MleTrainer`: count transitions, estimate an MDP, value iteration
//! - `BayesianAgent`: Q-learning over belief-adjusted action values
//!
//! All three produce a `Policy`, written one action id per line.
//!
//! ## Usage
//!
//! ```no_run
//! use kitten_rl::env::{EnvConfig, Environment, KittensEnv};
//! use kitten_rl::training::{QLearningConfig, QLearningTrainer};
//!
//! let mut env = KittensEnv::new(EnvConfig::default());
//! let mut trainer = QLearningTrainer::new(QLearningConfig::default(), env.num_states());
//! let report = trainer.train(&mut env, 2000);
//! println!("mean reward {:.3}", report.mean_reward());
//! trainer.policy().save("policy_q.txt")?;
//! # Ok::<(), kitten_rl::Error>(())
//! ```

pub mod bayesian;
pub mod mle;
pub mod policy;
pub mod q_table;
pub mod qlearning;
pub mod report;
pub mod schedule;
pub mod transitions;

pub use bayesian::{
    belief_path, BayesianAgent, BayesianConfig, BeliefSnapshot, Beliefs, BetaBelief,
    DeckComposition,
};
pub use mle::{value_iteration, ActionModel, MdpModel, MleConfig, MleTrainer, ValueFunction, ValueIterationReport};
pub use policy::Policy;
pub use q_table::{argmax, QTable};
pub use qlearning::{QLearningConfig, QLearningTrainer};
pub use report::{EpisodeStats, ProgressConfig, TrainingReport};
pub use schedule::EpsilonSchedule;
pub use transitions::{
    collect_transitions, load_csv, read_csv, save_csv, write_csv, ActionCounts, CollectionConfig,
    TransitionCounts, TransitionRecord,
};
