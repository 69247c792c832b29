//! Builds a generation's benchmark folder from the species API and sprite repository.

use serde::Deserialize;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{BenchmarkPaths, Generation};
use crate::config::DatasetConfig;
use crate::error::{DatasetError, Result};
use crate::output;
use crate::scoring::GroundTruth;
use crate::types::ImageSpec;

/// Everything written to a benchmark folder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkAssets {
    pub images: Vec<ImageSpec>,
    pub labels: Vec<String>,
    pub ground_truth: Vec<GroundTruth>,
    /// Ids whose name lookup failed and got a placeholder label
    pub fallbacks: Vec<u32>,
}

/// What a build produced.
#[derive(Debug, Clone)]
pub struct DatasetSummary {
    pub generation: Generation,
    pub paths: BenchmarkPaths,
    pub count: usize,
    pub fallbacks: Vec<u32>,
}

impl DatasetSummary {
    pub fn files(&self) -> [&PathBuf; 3] {
        [&self.paths.images, &self.paths.labels, &self.paths.ground_truth]
    }
}

#[derive(Deserialize)]
struct SpeciesWire {
    name: String,
}

/// Fetches species names and writes benchmark folders.
pub struct DatasetBuilder {
    client: reqwest::Client,
    species_endpoint: String,
    sprite_base_url: String,
    request_delay: Duration,
    lookup_timeout: Duration,
}

impl DatasetBuilder {
    pub fn new(config: &DatasetConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            species_endpoint: config.species_endpoint.trim_end_matches('/').to_string(),
            sprite_base_url: config.sprite_base_url.trim_end_matches('/').to_string(),
            request_delay: Duration::from_millis(config.request_delay_ms),
            lookup_timeout: Duration::from_millis(config.lookup_timeout_ms),
        }
    }

    pub fn sprite_url(&self, id: u32) -> String {
        format!("{}/{id}.png", self.sprite_base_url)
    }

    /// Look up a species name; hyphens become spaces (`mr-mime` -> `mr mime`).
    pub async fn species_name(&self, id: u32) -> std::result::Result<String, DatasetError> {
        let lookup_error = |message: String| DatasetError::SpeciesLookup { id, message };

        let species: SpeciesWire = self
            .client
            .get(format!("{}/{id}", self.species_endpoint))
            .timeout(self.lookup_timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| lookup_error(e.to_string()))?
            .json()
            .await
            .map_err(|e| lookup_error(e.to_string()))?;

        Ok(species.name.replace('-', " "))
    }

    /// Gather image specs and labels for a range of dex ids.
    ///
    /// A failed name lookup is not fatal: the label becomes `pokemon-<id>`.
    pub async fn collect(&self, ids: RangeInclusive<u32>) -> BenchmarkAssets {
        let mut assets = BenchmarkAssets::default();
        let last = *ids.end();

        for id in ids {
            let image_id = format!("{id}.png");
            let label = match self.species_name(id).await {
                Ok(name) => {
                    tracing::info!("{id}: {name}");
                    name
                }
                Err(e) => {
                    tracing::warn!("{e}; using placeholder label");
                    assets.fallbacks.push(id);
                    format!("pokemon-{id}")
                }
            };

            assets.images.push(ImageSpec::remote(&image_id, self.sprite_url(id)));
            assets.ground_truth.push(GroundTruth {
                image_id,
                label: label.clone(),
            });
            assets.labels.push(label);

            if id != last && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
        }
        assets
    }

    /// Build the folder for `generation` under `root`.
    pub async fn build(&self, generation: Generation, root: &Path) -> Result<DatasetSummary> {
        let range = generation.dex_range();
        let paths = BenchmarkPaths::new(root, generation);
        tracing::info!(
            "Building {generation} (Pokémon {}-{}) into {:?}",
            range.start(),
            range.end(),
            paths.dir
        );

        let assets = self.collect(range).await;
        write_assets(&assets, &paths)?;

        if !assets.fallbacks.is_empty() {
            tracing::warn!(
                "{} species lookups failed: {:?}",
                assets.fallbacks.len(),
                assets.fallbacks
            );
        }
        Ok(DatasetSummary {
            generation,
            count: assets.images.len(),
            fallbacks: assets.fallbacks,
            paths,
        })
    }
}

/// Write `images.json`, `labels.txt` and `ground_truth.jsonl`.
pub fn write_assets(assets: &BenchmarkAssets, paths: &BenchmarkPaths) -> Result<()> {
    output::write_records(&paths.images, &assets.images, true)?;
    output::write_atomic(&paths.labels, |w| {
        use std::io::Write;
        for label in &assets.labels {
            writeln!(w, "{label}")?;
        }
        w.flush()
    })?;
    output::write_records(&paths.ground_truth, &assets.ground_truth, false)?;
    tracing::debug!("Wrote {} assets to {:?}", assets.images.len(), paths.dir);
    Ok(())
}
