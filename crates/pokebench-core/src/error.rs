//! Error types for the PokeBench harness.
//!
//! Errors are split by the stage that raises them so callers can tell a
//! configuration problem (abort before any request) from a provider failure
//! (abort the run after flushing partial progress).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for PokeBench operations.
#[derive(Error, Debug)]
pub enum BenchError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Classification provider errors (after retries were exhausted)
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Dataset building errors
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Downloading an image to inline it failed
    #[error("Failed to fetch image {image_id} from {url}: {message}")]
    ImageFetch {
        image_id: String,
        url: String,
        message: String,
    },

    /// Reading or writing an input/output file failed
    #[error("File error for {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A data file could not be decoded
    #[error("Malformed {kind} file {path}: {message}")]
    Format {
        kind: &'static str,
        path: PathBuf,
        message: String,
    },

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// The provider API key could not be resolved
    #[error("Missing API key: set {0}")]
    MissingCredential(String),

    /// An image record carries neither a URL nor an inline payload
    #[error("Image spec for {image_id} has neither url nor b64")]
    InvalidImageSpec { image_id: String },

    /// Two labels collapse to the same comparison key
    #[error("Labels {first:?} and {second:?} are indistinguishable after normalization")]
    DuplicateLabel { first: String, second: String },

    /// A label has no alphanumeric characters at all
    #[error("Label {0:?} has an empty comparison key")]
    EmptyLabel(String),
}

/// Failures talking to the classification provider.
///
/// Every variant is treated as transient by the retry policy.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Connection, DNS or TLS failure before a response arrived
    #[error("Request failed: {0}")]
    Network(String),

    /// The provider answered with status >= 400
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The provider answered with something other than JSON
    #[error("Unexpected content-type {content_type}: {body}")]
    ContentType { content_type: String, body: String },

    /// The body claimed to be JSON but did not decode
    #[error("Failed to decode response body: {0}")]
    Decode(String),

    /// No response within the per-request timeout
    #[error("Timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Dataset builder errors.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Generation number outside 1..=9
    #[error("Unknown generation {0} (expected 1-9)")]
    UnknownGeneration(u8),

    /// Benchmark name that isn't `gen1` .. `gen9`
    #[error("Invalid benchmark {0:?} (expected gen1..gen9)")]
    InvalidBenchmark(String),

    /// The species endpoint could not be queried
    #[error("Species lookup for #{id} failed: {message}")]
    SpeciesLookup { id: u32, message: String },
}

/// Convenience type alias for PokeBench results.
pub type Result<T> = std::result::Result<T, BenchError>;
