//! Training binary.
//!
//! ```text
//! kitten-train qlearning --episodes 5000 --players 5 --out policy_q.txt
//! kitten-train mle --simulate --games 2000 --transitions-out transitions.csv --out policy_mle.txt
//! kitten-train mle --in transitions.csv --out policy_mle.txt
//! kitten-train bayesian --episodes 20000 --out policies/bayesian_final_policy.txt
//! kitten-train transitions --games 1000 --out transitions.csv
//! ```
//!
//! Every subcommand accepts `--config <json>` with optional `env`,
//! `qlearning`, `mle` and `bayesian` sections; flags override the file.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use kitten_rl::core::check_player_count;
use kitten_rl::env::{EnvConfig, KittensEnv, Seat};
use kitten_rl::training::{
    collect_transitions, load_csv, save_csv, BayesianAgent, BayesianConfig, CollectionConfig,
    EpsilonSchedule, MleConfig, MleTrainer, QLearningConfig, QLearningTrainer, TrainingReport,
};

#[derive(Parser)]
#[command(author, version, about = "Train tabular policies for the kittens game", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Online tabular Q-learning against baseline opponents", alias = "q")]
    Qlearning {
        #[command(flatten)]
        common: Common,
        #[command(flatten)]
        learning: Learning,
        #[arg(long, default_value = "policy_q.txt")]
        out: PathBuf,
    },
    #[command(about = "Count transitions, estimate an MDP and solve it")]
    Mle {
        #[command(flatten)]
        common: Common,
        /// Simulate games instead of reading a transition file
        #[arg(long)]
        simulate: bool,
        /// Transition CSV to learn from
        #[arg(long = "in")]
        input: Option<PathBuf>,
        /// Games to simulate
        #[arg(long)]
        games: Option<usize>,
        /// Also write simulated transitions here
        #[arg(long)]
        transitions_out: Option<PathBuf>,
        #[arg(long)]
        gamma: Option<f64>,
        #[arg(long, default_value = "policy_mle.txt")]
        out: PathBuf,
    },
    #[command(about = "Belief-augmented Q-learning in self-play", alias = "bayes")]
    Bayesian {
        #[command(flatten)]
        common: Common,
        #[command(flatten)]
        learning: Learning,
        #[arg(long)]
        epsilon_decay: Option<f64>,
        #[arg(long)]
        log_interval: Option<usize>,
        #[arg(long, default_value = "bayesian_policy.txt")]
        out: PathBuf,
    },
    #[command(about = "Simulate baseline games and write their transitions")]
    Transitions {
        #[command(flatten)]
        common: Common,
        #[arg(long, default_value_t = 1000)]
        games: usize,
        #[arg(long, default_value = "transitions.csv")]
        out: PathBuf,
    },
}

#[derive(Args)]
struct Common {
    /// JSON file with config sections
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    players: Option<usize>,
    #[arg(long)]
    num_states: Option<usize>,
    #[arg(long, default_value_t = 2000)]
    episodes: usize,
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct Learning {
    #[arg(long)]
    alpha: Option<f64>,
    #[arg(long)]
    gamma: Option<f64>,
    #[arg(long)]
    epsilon_start: Option<f64>,
    #[arg(long)]
    epsilon_end: Option<f64>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    env: EnvConfig,
    qlearning: QLearningConfig,
    mle: MleConfig,
    bayesian: BayesianConfig,
}

impl Common {
    fn file_config(&self) -> anyhow::Result<FileConfig> {
        match &self.config {
            Some(path) => {
                let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
                serde_json::from_reader(BufReader::new(file))
                    .with_context(|| format!("parsing {}", path.display()))
            }
            None => Ok(FileConfig::default()),
        }
    }

    /// `--players`, checked before it reaches the engine.
    fn players(&self) -> anyhow::Result<Option<usize>> {
        self.players
            .map(check_player_count)
            .transpose()
            .context("bad --players")
    }

    fn env(&self, mut env: EnvConfig) -> anyhow::Result<EnvConfig> {
        if let Some(players) = self.players()? {
            env = env.with_player_count(players);
        }
        if let Some(num_states) = self.num_states {
            env = env.with_num_states(num_states);
        }
        if let Some(seed) = self.seed {
            env = env.with_seed(seed);
        }
        Ok(env)
    }
}

impl Learning {
    /// Override `start`/`end` of whichever schedule is configured.
    fn epsilon(&self, schedule: EpsilonSchedule) -> EpsilonSchedule {
        match schedule {
            EpsilonSchedule::Fixed { epsilon } => EpsilonSchedule::Fixed {
                epsilon: self.epsilon_start.unwrap_or(epsilon),
            },
            EpsilonSchedule::Linear { start, end } => EpsilonSchedule::Linear {
                start: self.epsilon_start.unwrap_or(start),
                end: self.epsilon_end.unwrap_or(end),
            },
            EpsilonSchedule::Exponential { start, end, decay } => EpsilonSchedule::Exponential {
                start: self.epsilon_start.unwrap_or(start),
                end: self.epsilon_end.unwrap_or(end),
                decay,
            },
        }
    }
}

fn summarize(name: &str, report: &TrainingReport) {
    log::info!("{:<32}{:<32}", name, format!("{} episodes", report.episodes()));
    log::info!("{:<32}{:<32.3}", "mean reward", report.mean_reward());
    log::info!("{:<32}{:<32.1}", "mean length", report.mean_length());
    log::info!("{:<32}{:<32}", "wins", report.wins);
    log::info!("{:<32}{:<32}", "truncated", report.truncations);
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
            .with_context(|| format!("creating {}", dir.display())),
        _ => Ok(()),
    }
}

fn qlearning(common: Common, learning: Learning, out: PathBuf) -> anyhow::Result<()> {
    let file = common.file_config()?;
    let env_config = common.env(file.env)?;
    let mut config = file.qlearning;
    config.alpha = learning.alpha.unwrap_or(config.alpha);
    config.gamma = learning.gamma.unwrap_or(config.gamma);
    config.epsilon = learning.epsilon(config.epsilon);
    config.seed = common.seed.unwrap_or(config.seed);

    let mut env = KittensEnv::new(env_config);
    let mut trainer = QLearningTrainer::new(config, env.config().num_states);
    let report = trainer.train(&mut env, common.episodes);
    summarize("q-learning", &report);

    ensure_parent(&out)?;
    trainer
        .policy()
        .save(&out)
        .with_context(|| format!("writing {}", out.display()))?;
    log::info!("saved policy to {}", out.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn mle(
    common: Common,
    simulate: bool,
    input: Option<PathBuf>,
    games: Option<usize>,
    transitions_out: Option<PathBuf>,
    gamma: Option<f64>,
    out: PathBuf,
) -> anyhow::Result<()> {
    let file = common.file_config()?;
    let mut config = file.mle;
    config.gamma = gamma.unwrap_or(config.gamma);
    if let Some(players) = common.players()? {
        config.collection.game = config.collection.game.with_player_count(players);
    }
    if let Some(games) = games {
        config.collection.games = games;
    }
    if let Some(seed) = common.seed {
        config.collection.seed = seed;
    }
    if let Some(num_states) = common.num_states {
        config = config.with_num_states(num_states);
    }

    let mut trainer = MleTrainer::new(config);
    match (input, simulate) {
        (Some(path), _) => {
            let records = load_csv(&path).with_context(|| format!("reading {}", path.display()))?;
            log::info!("read {} transitions from {}", records.len(), path.display());
            trainer.ingest(&records)?;
        }
        (None, true) => {
            let records = trainer.collect();
            if let Some(path) = transitions_out {
                ensure_parent(&path)?;
                save_csv(&path, &records)?;
                log::info!("wrote transitions to {}", path.display());
            }
        }
        (None, false) => anyhow::bail!("no transitions: pass --in <csv> or --simulate"),
    }

    let report = trainer.solve();
    log::info!(
        "{:<32}{:<32}",
        "value iteration",
        format!("{} sweeps, residual {:.3e}", report.iterations, report.residual)
    );

    ensure_parent(&out)?;
    trainer.policy().save(&out)?;
    log::info!("saved policy to {}", out.display());
    Ok(())
}

fn bayesian(
    common: Common,
    learning: Learning,
    epsilon_decay: Option<f64>,
    log_interval: Option<usize>,
    out: PathBuf,
) -> anyhow::Result<()> {
    let file = common.file_config()?;
    let env_config = common.env(file.env.with_seat(Seat::All))?;
    let mut config = file.bayesian;
    config.alpha = learning.alpha.unwrap_or(config.alpha);
    config.gamma = learning.gamma.unwrap_or(config.gamma);
    config.exploration = learning.epsilon(config.exploration);
    if let (Some(rate), EpsilonSchedule::Exponential { decay, .. }) =
        (epsilon_decay, &mut config.exploration)
    {
        *decay = rate;
    }
    if let Some(interval) = log_interval {
        config.progress = config.progress.with_log_interval(interval);
    }
    config.seed = common.seed.unwrap_or(config.seed);

    let mut env = KittensEnv::new(env_config);
    let mut agent = BayesianAgent::new(config, env.config().num_states);
    let report = agent.train(&mut env, common.episodes);
    summarize("bayesian", &report);
    if report.stopped_early {
        log::info!("stopped early at episode {}", report.episodes());
    }

    ensure_parent(&out)?;
    let beliefs = agent.save(&out)?;
    log::info!("saved policy to {} and beliefs to {}", out.display(), beliefs.display());
    Ok(())
}

fn transitions(common: Common, games: usize, out: PathBuf) -> anyhow::Result<()> {
    let file = common.file_config()?;
    let mut config = CollectionConfig::new()
        .with_game(file.env.game)
        .with_num_states(common.num_states.unwrap_or(file.env.num_states))
        .with_games(games)
        .with_seed(common.seed.unwrap_or(file.env.seed));
    if let Some(players) = common.players()? {
        config.game = config.game.with_player_count(players);
    }

    let records = collect_transitions(&config);
    ensure_parent(&out)?;
    save_csv(&out, &records)?;
    log::info!("wrote {} transitions to {}", records.len(), out.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Qlearning { common, learning, out } => qlearning(common, learning, out),
        Command::Mle {
            common,
            simulate,
            input,
            games,
            transitions_out,
            gamma,
            out,
        } => mle(common, simulate, input, games, transitions_out, gamma, out),
        Command::Bayesian {
            common,
            learning,
            epsilon_decay,
            log_interval,
            out,
        } => bayesian(common, learning, epsilon_decay, log_interval, out),
        Command::Transitions { common, games, out } => transitions(common, games, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn common(args: &[&str]) -> Common {
        let argv = ["kitten-train", "transitions"].iter().chain(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Transitions { common, .. } => common,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_players_flag_is_checked() {
        assert_eq!(common(&["--players", "3"]).players().unwrap(), Some(3));
        assert_eq!(common(&[]).players().unwrap(), None);

        for bad in ["1", "9"] {
            let common = common(&["--players", bad]);
            assert!(common.players().is_err());
            assert!(common.env(EnvConfig::default()).is_err());
        }
    }

    #[test]
    fn test_config_file_player_count_is_checked() {
        let ok: FileConfig = serde_json::from_str(r#"{"env": {"game": {"player_count": 4}}}"#).unwrap();
        assert_eq!(ok.env.game.player_count, 4);

        let bad = serde_json::from_str::<FileConfig>(r#"{"env": {"game": {"player_count": 1}}}"#);
        assert!(bad.is_err());
    }
}
