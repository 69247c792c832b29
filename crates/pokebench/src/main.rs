//! PokeBench CLI - benchmark multimodal chat models on Pokémon sprite classification.
//!
//! # Usage
//!
//! ```bash
//! # Build the Generation 1 benchmark assets
//! pokebench build --gen 1
//!
//! # Collect predictions for a window of images
//! pokebench run --model openai/gpt-4o-mini --images gen1/images.json \
//!     --labels gen1/labels.txt --out predictions.json --limit 20 --progress
//!
//! # Score them
//! pokebench score --ground-truth gen1/ground_truth.jsonl --predictions predictions.json
//!
//! # Run, score and record on the leaderboard in one go
//! pokebench bench --bench gen1 --model openai/gpt-4o-mini
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// PokeBench - benchmark multimodal chat models on sprite classification.
#[derive(Parser, Debug)]
#[command(name = "pokebench")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "POKEBENCH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Build benchmark assets for a generation
    Build(cli::build::BuildArgs),

    /// Classify images and write a predictions file
    Run(cli::run::RunArgs),

    /// Score a predictions file against ground truth
    Score(cli::score::ScoreArgs),

    /// Run, score and record a benchmark on the leaderboard
    Bench(cli::bench::BenchArgs),

    /// Show per-model leaderboard averages
    Leaderboard(cli::leaderboard::LeaderboardArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(pokebench_core::Config::default_path);
    let config = match cli::load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `pokebench config path`."
            );
            pokebench_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("PokeBench v{}", pokebench_core::VERSION);

    match cli.command {
        Commands::Build(args) => cli::build::execute(args, config).await,
        Commands::Run(args) => cli::run::execute(args, config).await,
        Commands::Score(args) => cli::score::execute(args, config).await,
        Commands::Bench(args) => cli::bench::execute(args, config).await,
        Commands::Leaderboard(args) => cli::leaderboard::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, &config_path).await,
    }
}
