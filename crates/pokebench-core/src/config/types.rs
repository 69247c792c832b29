//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Classification provider settings (OpenRouter-compatible chat completions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Chat-completions endpoint
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Default model id, overridable per run
    pub model: String,

    /// Completion budget per image
    pub max_tokens: u32,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Sent as `HTTP-Referer` for provider attribution
    pub referer: String,

    /// Sent as `X-Title` for provider attribution
    pub title: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            api_key: "${OPENROUTER_API_KEY}".to_string(),
            model: "openai/gpt-4o-mini".to_string(),
            max_tokens: 128,
            timeout_ms: 120_000,
            referer: "https://pokebenchai.test/".to_string(),
            title: "PokeBenchAI".to_string(),
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Retry settings for provider calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per image, including the first
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds
    pub base_delay_ms: u64,

    /// Upper bound on any single delay in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 8000,
        }
    }
}

/// How images are handed to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMode {
    /// Inline `data:` URL; remote images are downloaded first
    #[default]
    Base64,
    /// Pass remote URLs through untouched
    Url,
}

impl std::fmt::Display for ImageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageMode::Base64 => write!(f, "base64"),
            ImageMode::Url => write!(f, "url"),
        }
    }
}

/// Batch run defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// How images are delivered to the provider
    pub image_mode: ImageMode,

    /// Accept free-text answers by substring matching
    pub tolerant: bool,

    /// Timeout for downloading an image before inlining it, in milliseconds
    pub fetch_timeout_ms: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            image_mode: ImageMode::Base64,
            tolerant: false,
            fetch_timeout_ms: 30_000,
        }
    }
}

/// Dataset builder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Species API base; `/{id}` is appended
    pub species_endpoint: String,

    /// Sprite base URL; `/{id}.png` is appended
    pub sprite_base_url: String,

    /// Pause between species lookups in milliseconds
    pub request_delay_ms: u64,

    /// Timeout for a single species lookup in milliseconds
    pub lookup_timeout_ms: u64,

    /// Root folder holding one directory per generation
    pub benchmarks_dir: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            species_endpoint: "https://pokeapi.co/api/v2/pokemon".to_string(),
            sprite_base_url:
                "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon"
                    .to_string(),
            request_delay_ms: 100,
            lookup_timeout_ms: 20_000,
            benchmarks_dir: "public/benchmarks".to_string(),
        }
    }
}

/// Scoring settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Task identifier written into metrics reports
    pub task: String,

    /// Cut-offs reported as `top<k>`
    pub top_k: Vec<usize>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            task: "T1".to_string(),
            top_k: vec![1, 5],
        }
    }
}

/// Leaderboard file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    /// Leaderboard JSON file
    pub path: String,

    /// Team name recorded on new rows
    pub team: String,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            path: "resources/data/leaderboard.json".to_string(),
            team: "PokeBenchAI".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
