//! The shared leaderboard file and per-model averages.
//!
//! The file is a JSON array of result rows, one per (benchmark, model) pair.
//! It is the only file several benchmark runs write to, so every update holds
//! an exclusive lock while it reads, modifies and rewrites it.

use chrono::{Local, NaiveDate};
use fs2::FileExt as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::dataset::Generation;
use crate::error::{BenchError, Result};
use crate::scoring::Metrics;
use crate::types::UsageTotals;

const SERIES: &str = "PokeBench v1";

/// Leaderboard name of a benchmark, e.g. `PokeBench v1 (Gen1 151)`.
pub fn benchmark_name(generation: Generation, label_count: usize) -> String {
    format!("{SERIES} (Gen{} {label_count})", generation.number())
}

/// File-name-safe model id: lowercase, non-alphanumeric runs become `-`.
pub fn model_slug(model: &str) -> String {
    let mut slug = String::with_capacity(model.len());
    for c in model.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Headline metrics stored per row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RowMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top5: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macro_f1: Option<f64>,
}

impl RowMetrics {
    /// Missing metrics are recorded as 0; values are rounded to 4 places.
    pub fn from_metrics(metrics: &Metrics) -> Self {
        let pick = |name: &str| Some(round4(metrics.get(name).unwrap_or(0.0)));
        Self {
            top1: pick("top1"),
            top5: pick("top5"),
            macro_f1: pick("macro_f1"),
        }
    }
}

/// One leaderboard entry.
///
/// Fields this code doesn't know about are kept as-is on rewrite. Rows
/// written by other tools may carry `null` durations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardRow {
    pub team: String,
    pub model: String,
    pub benchmark: String,
    pub task: String,
    pub metrics: RowMetrics,
    pub date: String,
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageTotals>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A finished, scored run to record.
#[derive(Debug, Clone)]
pub struct Submission<'a> {
    pub benchmark: String,
    pub model: &'a str,
    pub metrics: &'a Metrics,
    pub duration_ms: u64,
    pub usage: Option<UsageTotals>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Mean metrics of one model across its rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelAverage {
    pub model: String,
    pub avg_top1: Option<f64>,
    pub avg_top5: Option<f64>,
    pub avg_macro_f1: Option<f64>,
    pub count: usize,
}

/// Per-model averages, best average top-1 first; models without top-1 go last.
pub fn model_averages(rows: &[LeaderboardRow]) -> Vec<ModelAverage> {
    fn mean(values: &[f64]) -> Option<f64> {
        (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
    }

    // (model, top1s, top5s, f1s, count) in first-seen order
    let mut groups: Vec<(&str, Vec<f64>, Vec<f64>, Vec<f64>, usize)> = Vec::new();
    for row in rows {
        let idx = match groups.iter().position(|g| g.0 == row.model) {
            Some(idx) => idx,
            None => {
                groups.push((row.model.as_str(), Vec::new(), Vec::new(), Vec::new(), 0));
                groups.len() - 1
            }
        };
        let group = &mut groups[idx];
        group.1.extend(row.metrics.top1);
        group.2.extend(row.metrics.top5);
        group.3.extend(row.metrics.macro_f1);
        group.4 += 1;
    }

    let mut averages: Vec<ModelAverage> = groups
        .into_iter()
        .map(|(model, top1, top5, f1, count)| ModelAverage {
            model: model.to_string(),
            avg_top1: mean(&top1),
            avg_top5: mean(&top5),
            avg_macro_f1: mean(&f1),
            count,
        })
        .collect();
    averages.sort_by(|a, b| match (a.avg_top1, b.avg_top1) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    averages
}

/// Handle on the leaderboard file.
pub struct Leaderboard {
    path: PathBuf,
    team: String,
}

impl Leaderboard {
    pub fn new(path: impl Into<PathBuf>, team: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            team: team.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.leaderboard_path(), config.leaderboard.team.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all rows. A missing or unreadable file is an empty leaderboard.
    pub fn rows(&self) -> Result<Vec<LeaderboardRow>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(parse_values(&raw, &self.path)
                .iter()
                .filter_map(|value| match LeaderboardRow::deserialize(value) {
                    Ok(row) => Some(row),
                    Err(e) => {
                        tracing::warn!("Skipping malformed leaderboard row in {:?}: {e}", self.path);
                        None
                    }
                })
                .collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(BenchError::File {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Record a submission dated today.
    pub fn upsert(&self, submission: &Submission<'_>) -> Result<UpsertOutcome> {
        self.upsert_on(submission, Local::now().date_naive())
    }

    /// Insert or update the row for (benchmark, model) under an exclusive lock.
    pub fn upsert_on(
        &self,
        submission: &Submission<'_>,
        date: NaiveDate,
    ) -> Result<UpsertOutcome> {
        let file_error = |source: std::io::Error| BenchError::File {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(file_error)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(file_error)?;
        file.lock_exclusive().map_err(file_error)?;

        let mut raw = String::new();
        file.read_to_string(&mut raw).map_err(file_error)?;
        // Rows are edited as raw JSON so entries this code can't type survive the rewrite.
        let mut rows = parse_values(&raw, &self.path);

        let metrics = serde_json::to_value(RowMetrics::from_metrics(submission.metrics))?;
        let date = date.format("%Y-%m-%d").to_string();
        let existing = rows.iter_mut().filter_map(Value::as_object_mut).find(|row| {
            row.get("benchmark").and_then(Value::as_str) == Some(submission.benchmark.as_str())
                && row.get("model").and_then(Value::as_str) == Some(submission.model)
        });
        let outcome = match existing {
            Some(row) => {
                row.insert("metrics".into(), metrics);
                row.insert("date".into(), Value::from(date));
                row.insert("duration_ms".into(), Value::from(submission.duration_ms));
                if let Some(usage) = submission.usage.filter(|u| !u.is_empty()) {
                    row.insert("usage".into(), serde_json::to_value(usage)?);
                }
                UpsertOutcome::Updated
            }
            None => {
                rows.push(serde_json::to_value(LeaderboardRow {
                    team: self.team.clone(),
                    model: submission.model.to_string(),
                    benchmark: submission.benchmark.clone(),
                    task: "T1".to_string(),
                    metrics: RowMetrics::from_metrics(submission.metrics),
                    date,
                    duration_ms: Some(submission.duration_ms),
                    usage: submission.usage.filter(|u| !u.is_empty()),
                    extra: Map::new(),
                })?);
                UpsertOutcome::Inserted
            }
        };

        let body = serde_json::to_string_pretty(&rows)?;
        file.set_len(0).map_err(file_error)?;
        file.seek(SeekFrom::Start(0)).map_err(file_error)?;
        file.write_all(body.as_bytes()).map_err(file_error)?;
        file.sync_all().map_err(file_error)?;
        // Lock released when file is dropped

        tracing::info!(
            "Leaderboard {:?}: {:?} {} on {}",
            self.path,
            outcome,
            submission.model,
            submission.benchmark
        );
        Ok(outcome)
    }
}

/// The file's rows as raw JSON; anything but an array reads as empty.
fn parse_values(raw: &str, path: &Path) -> Vec<Value> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str(raw) {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!("Ignoring unreadable leaderboard {:?}: {e}", path);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn metrics(top1: f64, top5: f64, f1: f64) -> Metrics {
        Metrics {
            top_k: vec![(1, top1), (5, top5)],
            macro_f1: f1,
            matched: 10,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
    }

    fn row(model: &str, top1: Option<f64>) -> LeaderboardRow {
        LeaderboardRow {
            model: model.into(),
            metrics: RowMetrics {
                top1,
                top5: top1,
                macro_f1: None,
            },
            ..LeaderboardRow::default()
        }
    }

    #[test]
    fn test_model_slug() {
        assert_eq!(model_slug("openai/gpt-4o-mini"), "openai-gpt-4o-mini");
        assert_eq!(
            model_slug("anthropic/claude-3.7-sonnet:thinking"),
            "anthropic-claude-3-7-sonnet-thinking"
        );
        assert_eq!(model_slug("  Google//Gemini 2.0  "), "google-gemini-2-0");
        assert_eq!(model_slug("---"), "");
    }

    #[test]
    fn test_benchmark_name() {
        let gen1 = Generation::new(1).unwrap();
        assert_eq!(benchmark_name(gen1, 151), "PokeBench v1 (Gen1 151)");
    }

    #[test]
    fn test_upsert_inserts_then_updates() {
        let dir = tempdir().unwrap();
        let board = Leaderboard::new(dir.path().join("data/leaderboard.json"), "PokeBenchAI");
        let first = metrics(0.123456, 0.5, 0.1);
        let usage = UsageTotals {
            prompt_tokens: 10,
            completion_tokens: 2,
            total_tokens: 12,
            input_images: 1,
        };

        let outcome = board
            .upsert_on(
                &Submission {
                    benchmark: "PokeBench v1 (Gen1 151)".into(),
                    model: "openai/gpt-4o-mini",
                    metrics: &first,
                    duration_ms: 1000,
                    usage: Some(usage),
                },
                date(),
            )
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);

        let second = metrics(0.9, 0.95, 0.85);
        let outcome = board
            .upsert_on(
                &Submission {
                    benchmark: "PokeBench v1 (Gen1 151)".into(),
                    model: "openai/gpt-4o-mini",
                    metrics: &second,
                    duration_ms: 2000,
                    usage: None,
                },
                date(),
            )
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);

        let rows = board.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].team, "PokeBenchAI");
        assert_eq!(rows[0].task, "T1");
        assert_eq!(rows[0].date, "2025-09-01");
        assert_eq!(rows[0].metrics.top1, Some(0.9));
        assert_eq!(rows[0].duration_ms, Some(2000));
        // usage kept from the first run because the update carried none
        assert_eq!(rows[0].usage, Some(usage));
    }

    #[test]
    fn test_metrics_rounded_to_four_places() {
        let m = RowMetrics::from_metrics(&metrics(0.123456, 2.0 / 3.0, 0.0));
        assert_eq!(m.top1, Some(0.1235));
        assert_eq!(m.top5, Some(0.6667));
        assert_eq!(m.macro_f1, Some(0.0));
    }

    #[test]
    fn test_other_benchmarks_and_unknown_fields_survive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("leaderboard.json");
        fs::write(
            &path,
            r#"[{"team":"Other","model":"m","benchmark":"PokeBench v1 (Gen2 100)","task":"T1",
                "metrics":{"top1":0.5},"date":"2025-01-01","duration_ms":5,"notes":"keep me"}]"#,
        )
        .unwrap();
        let board = Leaderboard::new(&path, "PokeBenchAI");
        let m = metrics(0.7, 0.8, 0.6);
        board
            .upsert_on(
                &Submission {
                    benchmark: "PokeBench v1 (Gen1 151)".into(),
                    model: "m",
                    metrics: &m,
                    duration_ms: 1,
                    usage: None,
                },
                date(),
            )
            .unwrap();

        let rows = board.rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].extra.get("notes"), Some(&Value::from("keep me")));
        assert_eq!(rows[1].benchmark, "PokeBench v1 (Gen1 151)");
    }

    #[test]
    fn test_loosely_typed_rows_survive_upsert() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("leaderboard.json");
        fs::write(
            &path,
            r#"[{"team":"Other","model":"old/a","benchmark":"PokeBench v1 (Gen1 151)","task":"T1",
                 "metrics":{"top1":0.4},"date":"2025-01-01","duration_ms":null,"usage":{}},
                {"team":"Other","model":"old/b","benchmark":"PokeBench v1 (Gen1 151)","task":"T1",
                 "metrics":"n/a","date":null}]"#,
        )
        .unwrap();
        let board = Leaderboard::new(&path, "PokeBenchAI");

        // The null duration parses; the row with a string `metrics` is skipped, not fatal
        let before = board.rows().unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(before[0].model, "old/a");
        assert_eq!(before[0].duration_ms, None);

        let m = metrics(0.7, 0.8, 0.6);
        board
            .upsert_on(
                &Submission {
                    benchmark: "PokeBench v1 (Gen1 151)".into(),
                    model: "new/c",
                    metrics: &m,
                    duration_ms: 10,
                    usage: None,
                },
                date(),
            )
            .unwrap();

        let raw: Vec<Value> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let models: Vec<_> = raw.iter().map(|r| r["model"].as_str().unwrap()).collect();
        assert_eq!(models, ["old/a", "old/b", "new/c"]);
        assert_eq!(raw[1]["metrics"], Value::from("n/a"));
        assert_eq!(board.rows().unwrap().len(), 2);
    }

    #[test]
    fn test_update_keeps_fields_of_matching_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("leaderboard.json");
        fs::write(
            &path,
            r#"[{"team":"Other","model":"m","benchmark":"B","task":"T1","duration_ms":null,"notes":"x"}]"#,
        )
        .unwrap();
        let board = Leaderboard::new(&path, "PokeBenchAI");
        let m = metrics(0.5, 0.5, 0.5);
        let outcome = board
            .upsert_on(
                &Submission {
                    benchmark: "B".into(),
                    model: "m",
                    metrics: &m,
                    duration_ms: 42,
                    usage: None,
                },
                date(),
            )
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);

        let rows = board.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].team, "Other");
        assert_eq!(rows[0].duration_ms, Some(42));
        assert_eq!(rows[0].metrics.top1, Some(0.5));
        assert_eq!(rows[0].extra.get("notes"), Some(&Value::from("x")));
    }

    #[test]
    fn test_unreadable_file_treated_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("leaderboard.json");
        fs::write(&path, "{not json").unwrap();
        let board = Leaderboard::new(&path, "PokeBenchAI");
        assert!(board.rows().unwrap().is_empty());

        let m = metrics(1.0, 1.0, 1.0);
        let outcome = board
            .upsert_on(
                &Submission {
                    benchmark: "b".into(),
                    model: "m",
                    metrics: &m,
                    duration_ms: 0,
                    usage: None,
                },
                date(),
            )
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);
        assert_eq!(board.rows().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let board = Leaderboard::new("/nonexistent/leaderboard.json", "t");
        assert!(board.rows().unwrap().is_empty());
    }

    #[test]
    fn test_model_averages_sorted() {
        let rows = vec![
            row("a", Some(0.5)),
            row("b", None),
            row("a", Some(0.7)),
            row("c", Some(0.9)),
        ];
        let averages = model_averages(&rows);
        let order: Vec<_> = averages.iter().map(|a| a.model.as_str()).collect();
        assert_eq!(order, ["c", "a", "b"]);
        assert!((averages[1].avg_top1.unwrap() - 0.6).abs() < 1e-12);
        assert_eq!(averages[1].count, 2);
        assert_eq!(averages[2].avg_top1, None);
        assert_eq!(averages[1].avg_macro_f1, None);
    }
}
