//! PokeBench Core - benchmark harness for multimodal Pokémon classification.
//!
//! Builds per-generation sprite benchmarks, collects predictions from a
//! chat-completions provider, and scores them with top-k accuracy and macro F1.
//!
//! # Architecture
//!
//! ```text
//! images.json + labels.txt → BatchRunner → Classifier (per image)
//!     → extract_text → normalize_prediction → predictions.json
//!     → Scorer → metrics → Leaderboard
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use pokebench_core::{Config, PokeBench, RunOptions};
//!
//! #[tokio::main]
//! async fn main() -> pokebench_core::Result<()> {
//!     let bench = PokeBench::new(Config::load()?);
//!     let images = pokebench_core::load_images("gen1/images.json".as_ref(), bench.config().run.image_mode)?;
//!     let labels = pokebench_core::LabelVocabulary::load("gen1/labels.txt".as_ref())?;
//!
//!     let runner = bench.runner("openai/gpt-4o-mini", RunOptions::from_config(bench.config()))?;
//!     let report = runner.run(&images, &labels, "predictions.json".as_ref(), |_| {}).await?;
//!     println!("{} entries", report.output.entries.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod labels;
pub mod leaderboard;
pub mod llm;
pub mod output;
pub mod pipeline;
pub mod scoring;
pub mod types;

pub use config::{Config, ImageMode};
pub use dataset::{BenchmarkPaths, DatasetBuilder, Generation};
pub use error::{BenchError, ConfigError, DatasetError, ProviderError, Result};
pub use labels::LabelVocabulary;
pub use leaderboard::{Leaderboard, Submission};
pub use llm::{Classifier, ClassifyOptions, OpenRouterProvider};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::{load_images, BatchRunner, RunEvent, RunOptions, RunReport};
pub use scoring::{MetricsReport, Scorer};
pub use types::{ClassificationResult, ImageInput, ImageSpec, RunOutput, UsageTotals};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Entry point wiring configuration into the harness components.
pub struct PokeBench {
    config: Config,
}

impl PokeBench {
    pub fn new(config: Config) -> Self {
        tracing::debug!("Initializing PokeBench v{}", VERSION);
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A classifier for `model` backed by the configured OpenRouter endpoint.
    ///
    /// Fails if the API key can't be resolved, before any request is made.
    pub fn classifier(&self, model: &str) -> Result<Classifier> {
        let api_key = self.config.api_key()?;
        let provider = OpenRouterProvider::new(&api_key, &self.config.provider);
        Ok(Classifier::new(
            Box::new(provider),
            model,
            ClassifyOptions::from_config(&self.config),
        ))
    }

    pub fn runner(&self, model: &str, options: RunOptions) -> Result<BatchRunner> {
        Ok(BatchRunner::new(self.classifier(model)?, options))
    }

    pub fn dataset_builder(&self) -> DatasetBuilder {
        DatasetBuilder::new(&self.config.dataset)
    }

    pub fn leaderboard(&self) -> Leaderboard {
        Leaderboard::from_config(&self.config)
    }

    pub fn benchmark_paths(&self, generation: Generation) -> BenchmarkPaths {
        BenchmarkPaths::new(&self.config.benchmarks_dir(), generation)
    }
}
