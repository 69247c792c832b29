//! Ground truth and predictions loaders, and the metrics report.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use super::metrics::{GroundTruth, Metrics};
use crate::error::{BenchError, Result};
use crate::output::{self, OutputFormat};
use crate::types::{ClassificationResult, Probs, UsageTotals};

/// Load ground truth: JSON Lines for `.jsonl`, otherwise a JSON array.
pub fn load_ground_truth(path: &Path) -> Result<Vec<GroundTruth>> {
    let rows: Vec<GroundTruth> = output::read_records(path, "ground truth")?;
    tracing::debug!("Loaded {} ground truth rows from {:?}", rows.len(), path);
    Ok(rows)
}

/// A predictions file as read back for scoring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predictions {
    pub entries: Vec<ClassificationResult>,
    /// Usage recorded by the run, when the file carries it
    pub usage: Option<UsageTotals>,
}

/// Load predictions.
///
/// `.jsonl` files hold one entry per line. Other files hold either a run
/// snapshot (`{"entries": [...], "usage": {...}}`) or a bare array of entries.
/// Entries with a `label` but no `probs` count as certain of that label.
pub fn load_predictions(path: &Path) -> Result<Predictions> {
    let predictions = match OutputFormat::from_path(path) {
        OutputFormat::JsonLines => {
            let entries: Vec<EntryWire> = output::read_records(path, "predictions")?;
            Predictions {
                entries: entries.into_iter().map(EntryWire::into_result).collect(),
                usage: None,
            }
        }
        OutputFormat::Json => match output::read_json(path, "predictions")? {
            PredictionsWire::Snapshot { entries, usage } => Predictions {
                entries: entries.into_iter().map(EntryWire::into_result).collect(),
                usage: usage.map(|u| UsageTotals::from_provider(Some(&u))),
            },
            PredictionsWire::Bare(entries) => Predictions {
                entries: entries.into_iter().map(EntryWire::into_result).collect(),
                usage: None,
            },
        },
    };
    tracing::debug!(
        "Loaded {} predictions from {:?}",
        predictions.entries.len(),
        path
    );
    Ok(predictions)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PredictionsWire {
    Snapshot {
        entries: Vec<EntryWire>,
        #[serde(default)]
        usage: Option<Value>,
    },
    Bare(Vec<EntryWire>),
}

#[derive(Deserialize)]
struct EntryWire {
    image_id: String,
    #[serde(default)]
    probs: Option<Map<String, Value>>,
    #[serde(default)]
    label: Option<Value>,
}

impl EntryWire {
    fn into_result(self) -> ClassificationResult {
        let probs = match (self.probs, self.label) {
            (Some(raw), _) => raw
                .into_iter()
                .filter_map(|(label, value)| value.as_f64().map(|c| (label, c)))
                .collect(),
            (None, Some(Value::String(label))) => Probs::from([(label, 1.0)]),
            (None, Some(Value::Number(n))) => Probs::from([(n.to_string(), 1.0)]),
            (None, _) => Probs::new(),
        };
        ClassificationResult {
            image_id: self.image_id,
            probs,
        }
    }
}

/// Scoring output: `{"task": "T1", "metrics": {...}, "usage"?, "duration_ms"?}`.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub task: String,
    pub metrics: Metrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageTotals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl MetricsReport {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(BenchError::from)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        output::write_json(path, self, false)
    }
}
