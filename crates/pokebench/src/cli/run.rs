//! The `pokebench run` command: classify a window of images into a predictions file.

use std::path::{Path, PathBuf};

use clap::Args;
use pokebench_core::{load_images, Config, LabelVocabulary, PokeBench, RunOptions};

use super::progress::RunProgress;
use super::{apply_run_overrides, resolve_model, ImageModeArg};

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Model identifier, e.g. openai/gpt-4o-mini (defaults to provider.model)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Image list (JSON array of {image_id, url | b64, mime})
    #[arg(long)]
    pub images: PathBuf,

    /// Label vocabulary, one label per line
    #[arg(long)]
    pub labels: PathBuf,

    /// Predictions snapshot, rewritten after every image
    #[arg(short, long, default_value = "predictions.json")]
    pub out: PathBuf,

    /// Index of the first image to classify
    #[arg(long, default_value = "0")]
    pub start: usize,

    /// Maximum number of images to classify
    #[arg(long)]
    pub limit: Option<usize>,

    /// Show a progress bar with ETA
    #[arg(long)]
    pub progress: bool,

    /// How images reach the provider
    #[arg(long, value_enum)]
    pub image_mode: Option<ImageModeArg>,

    /// Accept any vocabulary label mentioned in a non-JSON answer
    #[arg(long)]
    pub tolerant: bool,
}

/// Execute the run command.
pub async fn execute(args: RunArgs, mut config: Config) -> anyhow::Result<()> {
    apply_run_overrides(&mut config, args.image_mode, args.tolerant);
    let model = resolve_model(args.model, &config)?;

    let bench = PokeBench::new(config);
    let image_mode = bench.config().run.image_mode;
    let images = load_images(&args.images, image_mode)?;
    let vocabulary = LabelVocabulary::load(&args.labels)?;

    let options = RunOptions {
        start: args.start,
        limit: args.limit,
        ..RunOptions::from_config(bench.config())
    };
    let runner = bench.runner(&model, options)?;

    tracing::debug!(
        "Loaded {} images and {} labels",
        images.len(),
        vocabulary.len()
    );

    let progress = RunProgress::new(args.progress);
    let report = runner
        .run(&images, &vocabulary, &args.out, |event| progress.observe(event))
        .await?;
    progress.finish();

    println!(
        "{}",
        written_line(&args.out, report.output.entries.len(), report.duration_ms())
    );

    if let Some(error) = report.halted {
        anyhow::bail!(
            "Run stopped after {} of {} images: {error}",
            report.output.entries.len(),
            report.window.len()
        );
    }
    Ok(())
}

fn written_line(out: &Path, entries: usize, duration_ms: u64) -> String {
    format!("Wrote {} ({entries} entries) in {duration_ms} ms", out.display())
}
