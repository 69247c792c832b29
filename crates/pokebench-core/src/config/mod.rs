//! Configuration management for PokeBench.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section implements `Default`, so a missing file or a
//! partial file both work.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for PokeBench.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Classification provider settings
    pub provider: ProviderConfig,

    /// Retry policy for provider calls
    pub retry: RetryConfig,

    /// Batch run defaults
    pub run: RunConfig,

    /// Dataset builder settings
    pub dataset: DatasetConfig,

    /// Scoring settings
    pub scoring: ScoringConfig,

    /// Leaderboard settings
    pub leaderboard: LeaderboardConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// - macOS: ~/Library/Application Support/ai.pokebench.pokebench/config.toml
    /// - Linux: ~/.config/pokebench/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\pokebench\config\config.toml
    ///
    /// Falls back to ~/.pokebench/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("ai", "pokebench", "pokebench")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".pokebench").join("config.toml")
            })
    }

    /// Resolve the provider API key, expanding `${ENV_VAR}` references.
    ///
    /// A missing key is fatal and must be reported before any request.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        resolve_env_var(&self.provider.api_key).ok_or_else(|| {
            let name = env_var_name(&self.provider.api_key).unwrap_or("provider.api_key");
            ConfigError::MissingCredential(name.to_string())
        })
    }

    /// Get the benchmarks root (with ~ expansion).
    pub fn benchmarks_dir(&self) -> PathBuf {
        expand_path(&self.dataset.benchmarks_dir)
    }

    /// Get the leaderboard file path (with ~ expansion).
    pub fn leaderboard_path(&self) -> PathBuf {
        expand_path(&self.leaderboard.path)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
///
/// Empty strings and unset or empty variables resolve to `None`.
pub fn resolve_env_var(value: &str) -> Option<String> {
    match env_var_name(value) {
        Some(name) => std::env::var(name).ok().filter(|v| !v.is_empty()),
        None if value.is_empty() => None,
        None => Some(value.to_string()),
    }
}

fn env_var_name(value: &str) -> Option<&str> {
    value
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}
