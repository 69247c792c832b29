//! Scoring predictions against ground truth.
//!
//! - **metrics**: Join, ranking with tie-breaks, top-k accuracy and macro F1
//! - **files**: Ground truth / predictions loaders and the metrics report

pub mod files;
pub mod metrics;

use std::path::Path;

use crate::config::ScoringConfig;
use crate::error::Result;
use crate::labels::LabelVocabulary;

pub use files::{load_ground_truth, load_predictions, MetricsReport, Predictions};
pub use metrics::{macro_f1, GroundTruth, Metrics, Scorer};

/// Inputs of a scoring pass.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInputs<'a> {
    pub ground_truth: &'a Path,
    pub predictions: &'a Path,
    /// Optional label list; used to break confidence ties
    pub labels: Option<&'a Path>,
    pub duration_ms: Option<u64>,
}

/// Load both files, score, and build the report.
pub fn score_files(inputs: ScoreInputs<'_>, config: &ScoringConfig) -> Result<MetricsReport> {
    let ground_truth = load_ground_truth(inputs.ground_truth)?;
    let predictions = load_predictions(inputs.predictions)?;

    let mut scorer = Scorer::new(config.top_k.clone());
    if let Some(labels) = inputs.labels {
        scorer = scorer.with_vocabulary(LabelVocabulary::load(labels)?);
    }

    let metrics = scorer.score(&ground_truth, &predictions.entries);
    tracing::info!(
        "Scored {} of {} ground truth rows against {} predictions",
        metrics.matched,
        ground_truth.len(),
        predictions.entries.len()
    );

    Ok(MetricsReport {
        task: config.task.clone(),
        metrics,
        usage: predictions.usage,
        duration_ms: inputs.duration_ms,
    })
}
