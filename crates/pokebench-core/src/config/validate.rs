//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.endpoint.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "provider.endpoint must not be empty".into(),
            ));
        }
        if self.provider.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "provider.max_tokens must be > 0".into(),
            ));
        }
        if self.provider.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "provider.timeout_ms must be > 0".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be > 0".into(),
            ));
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(ConfigError::ValidationError(
                "retry.max_delay_ms must be >= retry.base_delay_ms".into(),
            ));
        }
        if self.run.fetch_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "run.fetch_timeout_ms must be > 0".into(),
            ));
        }
        if self.dataset.lookup_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "dataset.lookup_timeout_ms must be > 0".into(),
            ));
        }
        if self.scoring.top_k.is_empty() || self.scoring.top_k.contains(&0) {
            return Err(ConfigError::ValidationError(
                "scoring.top_k must list at least one cut-off, all > 0".into(),
            ));
        }
        Ok(())
    }
}
