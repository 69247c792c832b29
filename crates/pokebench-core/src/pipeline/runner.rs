//! Batch runner: classifies a window of images and checkpoints after each one.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::fetch::ImageFetcher;
use crate::config::{Config, ImageMode};
use crate::error::{BenchError, Result};
use crate::labels::LabelVocabulary;
use crate::llm::Classifier;
use crate::output;
use crate::types::{ClassificationResult, ImageInput, RunOutput, UsageTotals};

/// Options for a single run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Index of the first image to classify
    pub start: usize,
    /// Maximum number of images to classify
    pub limit: Option<usize>,
    /// Send URL images as-is or download and inline them
    pub image_mode: ImageMode,
    /// Download timeout for inlined images
    pub fetch_timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            start: 0,
            limit: None,
            image_mode: ImageMode::Base64,
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

impl RunOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            image_mode: config.run.image_mode,
            fetch_timeout: Duration::from_millis(config.run.fetch_timeout_ms),
            ..Self::default()
        }
    }

    /// The slice of `len` images this run covers.
    pub fn window(&self, len: usize) -> Range<usize> {
        let start = self.start.min(len);
        let end = match self.limit {
            Some(limit) => start.saturating_add(limit).min(len),
            None => len,
        };
        start..end
    }
}

/// Per-item progress notification.
///
/// `index` is 1-based within the window. Events are emitted after the
/// snapshot for that item has been persisted.
#[derive(Debug)]
pub enum RunEvent<'a> {
    Started {
        total: usize,
    },
    Classified {
        index: usize,
        total: usize,
        image_id: &'a str,
        eta: Duration,
    },
    Failed {
        index: usize,
        total: usize,
        image_id: &'a str,
        error: &'a BenchError,
    },
}

/// Outcome of a run.
#[derive(Debug)]
pub struct RunReport {
    pub output: RunOutput,
    pub window: Range<usize>,
    pub elapsed: Duration,
    /// The error that stopped the run early, if any
    pub halted: Option<BenchError>,
}

impl RunReport {
    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn is_complete(&self) -> bool {
        self.halted.is_none()
    }
}

/// Remaining-time estimate from the average time per completed item.
pub fn estimate_remaining(elapsed: Duration, completed: usize, total: usize) -> Duration {
    if completed == 0 {
        return Duration::ZERO;
    }
    let per_item = elapsed.as_secs_f64() / completed as f64;
    Duration::from_secs_f64(per_item * total.saturating_sub(completed) as f64)
}

/// Drives the classifier over a window of images, one at a time.
pub struct BatchRunner {
    classifier: Classifier,
    fetcher: ImageFetcher,
    options: RunOptions,
}

impl BatchRunner {
    pub fn new(classifier: Classifier, options: RunOptions) -> Self {
        Self {
            fetcher: ImageFetcher::new(options.fetch_timeout),
            classifier,
            options,
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Classify the configured window of `images`, persisting to `out_path`.
    ///
    /// The snapshot at `out_path` is rewritten before the first request and
    /// after every image. A provider or fetch error stops the run; it is
    /// returned inside the report alongside the partial output. Only failure
    /// to write the snapshot is returned as `Err`.
    pub async fn run<F>(
        &self,
        images: &[ImageInput],
        vocabulary: &LabelVocabulary,
        out_path: &Path,
        mut on_event: F,
    ) -> Result<RunReport>
    where
        F: FnMut(RunEvent<'_>),
    {
        let window = self.options.window(images.len());
        let total = window.len();
        let checkpoint = Checkpoint::new(out_path);
        let started = Instant::now();

        tracing::info!(
            "Classifying {total} images [{}..{}) with {} ({} mode)",
            window.start,
            window.end,
            self.classifier.model(),
            self.options.image_mode
        );

        let mut output = RunOutput::default();
        checkpoint.persist(&output)?;
        on_event(RunEvent::Started { total });

        let mut halted = None;
        for (i, image) in images[window.clone()].iter().enumerate() {
            let index = i + 1;
            match self.classify_item(image, vocabulary).await {
                Ok((result, usage)) => {
                    output.entries.push(result);
                    output.usage.add(&usage);
                    checkpoint.persist(&output)?;
                    on_event(RunEvent::Classified {
                        index,
                        total,
                        image_id: &image.image_id,
                        eta: estimate_remaining(started.elapsed(), index, total),
                    });
                }
                Err(error) => {
                    checkpoint.persist(&output)?;
                    tracing::error!("Stopping at {} ({index}/{total}): {error}", image.image_id);
                    on_event(RunEvent::Failed {
                        index,
                        total,
                        image_id: &image.image_id,
                        error: &error,
                    });
                    halted = Some(error);
                    break;
                }
            }
        }

        let elapsed = started.elapsed();
        tracing::info!(
            "Run finished: {} entries in {:?}{}",
            output.entries.len(),
            elapsed,
            if halted.is_some() { " (halted)" } else { "" }
        );

        Ok(RunReport {
            output,
            window,
            elapsed,
            halted,
        })
    }

    async fn classify_item(
        &self,
        image: &ImageInput,
        vocabulary: &LabelVocabulary,
    ) -> Result<(ClassificationResult, UsageTotals)> {
        let image = match self.options.image_mode {
            ImageMode::Base64 => self.fetcher.inline(image).await?,
            ImageMode::Url => image.clone(),
        };
        Ok(self.classifier.classify_one(&image, vocabulary).await?)
    }
}

/// The on-disk predictions snapshot of a run.
struct Checkpoint {
    path: PathBuf,
}

impl Checkpoint {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn persist(&self, output: &RunOutput) -> Result<()> {
        output::write_json(&self.path, output, false)?;
        tracing::trace!("Checkpointed {} entries", output.entries.len());
        Ok(())
    }
}
