//! Game server binary.
//!
//! Loads the policy book once, then serves the game API until stopped.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use kitten_rl::core::GameConfig;
use kitten_rl::encoding::DEFAULT_NUM_STATES;
use kitten_rl::hosting::Server;
use kitten_rl::serving::{GameStore, PolicyBook, PolicyPaths};

#[derive(Parser)]
#[command(author, version, about = "Serve kittens games over HTTP", long_about = None)]
struct Cli {
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: String,
    #[arg(long, default_value = "policy_q.txt")]
    qlearning_policy: PathBuf,
    #[arg(long, default_value = "policy_mle.txt")]
    mle_policy: PathBuf,
    /// Refuse to start unless every policy loads
    #[arg(long)]
    strict: bool,
    #[arg(long, default_value_t = DEFAULT_NUM_STATES)]
    num_states: usize,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let paths = PolicyPaths {
        qlearning: Some(cli.qlearning_policy),
        mle: Some(cli.mle_policy),
    };
    let book = if cli.strict {
        PolicyBook::load(&paths).context("loading policies")?
    } else {
        PolicyBook::load_or_empty(&paths)
    };
    let store = GameStore::new(GameConfig::default(), cli.num_states);

    Server::run(&cli.bind, store, book)
        .await
        .with_context(|| format!("serving on {}", cli.bind))
}
