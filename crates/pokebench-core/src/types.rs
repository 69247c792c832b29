//! Core data types flowing through the prediction pipeline.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::config::ImageMode;
use crate::error::ConfigError;

/// Default MIME type for inline payloads that don't declare one.
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// One record of an `images.json` file.
///
/// At least one of `url` and `b64` must be present; which one is used depends
/// on the run's [`ImageMode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSpec {
    pub image_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b64: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
}

impl ImageSpec {
    /// Spec for a remotely hosted image.
    pub fn remote(image_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            image_id: image_id.into(),
            url: Some(url.into()),
            b64: None,
            mime: None,
        }
    }

    /// Pick the image source for the given mode.
    ///
    /// URL mode prefers a remote URL; otherwise an inline payload wins, and a
    /// bare URL is kept so it can be downloaded and inlined at request time.
    pub fn to_input(&self, mode: ImageMode) -> Result<ImageInput, ConfigError> {
        let url = self.url.as_deref().filter(|u| !u.is_empty());
        let b64 = self.b64.as_deref().filter(|b| !b.is_empty());

        let source = match (mode, url, b64) {
            (ImageMode::Url, Some(url), _) => ImageSource::Url(url.to_string()),
            (_, _, Some(data)) => ImageSource::Inline {
                data: data.to_string(),
                mime: self
                    .mime
                    .clone()
                    .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string()),
            },
            (_, Some(url), None) => ImageSource::Url(url.to_string()),
            (_, None, None) => {
                return Err(ConfigError::InvalidImageSpec {
                    image_id: self.image_id.clone(),
                })
            }
        };

        Ok(ImageInput {
            image_id: self.image_id.clone(),
            source,
        })
    }
}

/// Where the bytes of an image come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Remote image referenced by URL
    Url(String),
    /// Base64 payload with its MIME type
    Inline { data: String, mime: String },
}

/// An image to classify. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub image_id: String,
    pub source: ImageSource,
}

impl ImageInput {
    pub fn url(image_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            image_id: image_id.into(),
            source: ImageSource::Url(url.into()),
        }
    }

    pub fn inline(
        image_id: impl Into<String>,
        data: impl Into<String>,
        mime: impl Into<String>,
    ) -> Self {
        Self {
            image_id: image_id.into(),
            source: ImageSource::Inline {
                data: data.into(),
                mime: mime.into(),
            },
        }
    }

    /// URL to put in an `image_url` content part.
    ///
    /// Inline payloads become a `data:` URL.
    pub fn content_url(&self) -> String {
        match &self.source {
            ImageSource::Url(url) => url.clone(),
            ImageSource::Inline { data, mime } => format!("data:{mime};base64,{data}"),
        }
    }
}

/// Per-label confidences keyed by canonical label.
pub type Probs = BTreeMap<String, f64>;

/// The prediction for a single image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub image_id: String,

    /// Canonical label to confidence in [0, 1]; empty when nothing usable came back
    #[serde(default)]
    pub probs: Probs,
}

impl ClassificationResult {
    /// Label with the highest confidence, if any.
    pub fn top_label(&self) -> Option<&str> {
        self.probs
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(label, _)| label.as_str())
    }
}

/// Token and image consumption summed over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageTotals {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub input_images: u64,
}

impl UsageTotals {
    /// Read a provider `usage` object.
    ///
    /// Missing or malformed counters count as zero. The image counter goes by
    /// `input_images` on some providers and `images` on others.
    pub fn from_provider(usage: Option<&Value>) -> Self {
        let Some(usage) = usage.filter(|u| u.is_object()) else {
            return Self::default();
        };
        let images = usage
            .get("input_images")
            .filter(|v| !v.is_null())
            .or_else(|| usage.get("images"));
        Self {
            prompt_tokens: lenient_count(usage.get("prompt_tokens")),
            completion_tokens: lenient_count(usage.get("completion_tokens")),
            total_tokens: lenient_count(usage.get("total_tokens")),
            input_images: lenient_count(images),
        }
    }

    pub fn add(&mut self, other: &UsageTotals) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.completion_tokens = self
            .completion_tokens
            .saturating_add(other.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
        self.input_images = self.input_images.saturating_add(other.input_images);
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn lenient_count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Accumulated predictions of a run, as persisted to the predictions file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    pub entries: Vec<ClassificationResult>,
    #[serde(default)]
    pub usage: UsageTotals,
}

impl RunOutput {
    /// Number of entries that carry at least one confidence.
    pub fn non_empty_entries(&self) -> usize {
        self.entries.iter().filter(|e| !e.probs.is_empty()).count()
    }
}
