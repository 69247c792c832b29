//! CLI command implementations.

pub mod bench;
pub mod build;
pub mod config;
pub mod leaderboard;
pub mod progress;
pub mod run;
pub mod score;

use std::path::Path;

use clap::ValueEnum;
use pokebench_core::{Config, ConfigError, ImageMode};

/// Load the config at `path`, or defaults if there is no file yet.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        Config::load_from(path)
    } else {
        Ok(Config::default())
    }
}

/// Image delivery mode for the provider request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImageModeArg {
    /// Download remote images and inline them as data URLs
    Base64,
    /// Send remote URLs as-is
    Url,
}

impl From<ImageModeArg> for ImageMode {
    fn from(arg: ImageModeArg) -> Self {
        match arg {
            ImageModeArg::Base64 => ImageMode::Base64,
            ImageModeArg::Url => ImageMode::Url,
        }
    }
}

impl std::fmt::Display for ImageModeArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        ImageMode::from(*self).fmt(f)
    }
}

/// Apply run-shaping CLI flags on top of the loaded config.
pub fn apply_run_overrides(config: &mut Config, image_mode: Option<ImageModeArg>, tolerant: bool) {
    if let Some(mode) = image_mode {
        config.run.image_mode = mode.into();
    }
    if tolerant {
        config.run.tolerant = true;
    }
}

/// The model to use: the flag if given, else the configured default.
pub fn resolve_model(flag: Option<String>, config: &Config) -> anyhow::Result<String> {
    match flag.filter(|m| !m.trim().is_empty()) {
        Some(model) => Ok(model),
        None if !config.provider.model.trim().is_empty() => Ok(config.provider.model.clone()),
        None => anyhow::bail!("No model given. Pass --model or set provider.model in the config."),
    }
}
