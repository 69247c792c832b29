//! The `pokebench score` command.

use std::path::PathBuf;

use clap::Args;
use pokebench_core::scoring::{score_files, ScoreInputs};
use pokebench_core::Config;

/// Arguments for the `score` command.
#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Ground truth, JSONL or JSON array of {image_id, class}
    #[arg(long)]
    pub ground_truth: PathBuf,

    /// Predictions snapshot, bare entry list, or JSONL
    #[arg(long)]
    pub predictions: PathBuf,

    /// Label vocabulary, used to break ties between equal probabilities
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// Metrics destination; `-` prints to stdout
    #[arg(short, long, default_value = "-")]
    pub out: String,

    /// Wall-clock duration of the run, recorded alongside the metrics
    #[arg(long)]
    pub duration_ms: Option<u64>,
}

/// Execute the score command.
pub async fn execute(args: ScoreArgs, config: Config) -> anyhow::Result<()> {
    let report = score_files(
        ScoreInputs {
            ground_truth: &args.ground_truth,
            predictions: &args.predictions,
            labels: args.labels.as_deref(),
            duration_ms: args.duration_ms,
        },
        &config.scoring,
    )?;

    if args.out == "-" {
        println!("{}", report.to_json()?);
    } else {
        let out = PathBuf::from(&args.out);
        report.write_to(&out)?;
        tracing::info!("Metrics written to {}", out.display());
    }
    Ok(())
}
