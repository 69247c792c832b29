//! The `pokebench bench` command: run, score and record one model on one benchmark.

use clap::Args;
use pokebench_core::leaderboard::{benchmark_name, UpsertOutcome};
use pokebench_core::scoring::{score_files, ScoreInputs};
use pokebench_core::{
    load_images, Config, Generation, LabelVocabulary, PokeBench, RunOptions, RunOutput, Submission,
};

use super::progress::RunProgress;
use super::{apply_run_overrides, resolve_model, ImageModeArg};

/// Arguments for the `bench` command.
#[derive(Args, Debug)]
pub struct BenchArgs {
    /// Benchmark to run: gen1 through gen9
    #[arg(short, long)]
    pub bench: String,

    /// Model identifier (defaults to provider.model)
    #[arg(short, long)]
    pub model: Option<String>,

    /// How images reach the provider
    #[arg(long, value_enum)]
    pub image_mode: Option<ImageModeArg>,

    /// Accept any vocabulary label mentioned in a non-JSON answer
    #[arg(long)]
    pub tolerant: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub quiet: bool,
}

/// Execute the bench command.
pub async fn execute(args: BenchArgs, mut config: Config) -> anyhow::Result<()> {
    let generation: Generation = args.bench.parse()?;
    apply_run_overrides(&mut config, args.image_mode, args.tolerant);
    let model = resolve_model(args.model, &config)?;

    let bench = PokeBench::new(config);
    let paths = bench.benchmark_paths(generation);
    if !paths.exists() {
        anyhow::bail!(
            "Benchmark folder not found: {}\nBuild it first with `pokebench build --gen {}`.",
            paths.dir.display(),
            generation.number()
        );
    }

    let images = load_images(&paths.images, bench.config().run.image_mode)?;
    let vocabulary = LabelVocabulary::load(&paths.labels)?;
    let predictions_path = paths.predictions(&model);
    let runner = bench.runner(&model, RunOptions::from_config(bench.config()))?;

    eprintln!("Running {generation} ({} images) with {model}", images.len());
    let progress = RunProgress::new(!args.quiet);
    let report = runner
        .run(&images, &vocabulary, &predictions_path, |event| {
            progress.observe(event)
        })
        .await?;
    progress.finish();

    check_predictions(&report.output)?;
    if let Some(error) = &report.halted {
        tracing::warn!(
            "Run stopped early ({error}); scoring {} of {} images",
            report.output.entries.len(),
            report.window.len()
        );
    }

    let duration_ms = report.duration_ms();
    let metrics = score_files(
        ScoreInputs {
            ground_truth: &paths.ground_truth,
            predictions: &predictions_path,
            labels: Some(&paths.labels),
            duration_ms: Some(duration_ms),
        },
        &bench.config().scoring,
    )?;
    let scores_path = paths.scores(&model);
    metrics.write_to(&scores_path)?;

    let usage = report.output.usage;
    let submission = Submission {
        benchmark: benchmark_name(generation, vocabulary.len()),
        model: &model,
        metrics: &metrics.metrics,
        duration_ms,
        usage: (!usage.is_empty()).then_some(usage),
    };
    let leaderboard = bench.leaderboard();
    match leaderboard.upsert(&submission)? {
        UpsertOutcome::Inserted => {
            tracing::info!("Added {model} to {}", leaderboard.path().display())
        }
        UpsertOutcome::Updated => {
            tracing::info!("Updated {model} in {}", leaderboard.path().display())
        }
    }

    eprintln!("Predictions: {}", predictions_path.display());
    eprintln!("Scores:      {}", scores_path.display());
    println!(
        "{}",
        summary_line(
            metrics.metrics.top(1),
            metrics.metrics.top(5),
            metrics.metrics.get("macro_f1"),
            duration_ms,
            usage.prompt_tokens,
            usage.completion_tokens,
        )
    );
    Ok(())
}

/// Refuse to score a run that produced nothing usable.
fn check_predictions(output: &RunOutput) -> anyhow::Result<()> {
    if output.entries.is_empty() {
        anyhow::bail!(
            "No predictions were produced. Check that the model accepts image input \
             and that the API key is valid."
        );
    }
    if output.non_empty_entries() == 0 {
        anyhow::bail!(
            "All {} predictions are empty. The model's answers didn't name any known label; \
             try --tolerant or a stronger vision model.",
            output.entries.len()
        );
    }
    Ok(())
}

fn percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}%", v * 100.0),
        None => "n/a".to_string(),
    }
}

fn summary_line(
    top1: Option<f64>,
    top5: Option<f64>,
    macro_f1: Option<f64>,
    duration_ms: u64,
    prompt_tokens: u64,
    completion_tokens: u64,
) -> String {
    format!(
        "Done. Top1 {}  Top5 {}  F1 {}  Duration {duration_ms}ms  Tokens {prompt_tokens}/{completion_tokens}",
        percent(top1),
        percent(top5),
        percent(macro_f1),
    )
}
