//! Downloads remote images so they can be sent inline as base64.

use base64::Engine;
use std::time::Duration;

use crate::error::BenchError;
use crate::types::{ImageInput, ImageSource, DEFAULT_IMAGE_MIME};

/// HTTP client for turning URL images into inline payloads.
pub struct ImageFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl ImageFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// Return `image` with its source inlined.
    ///
    /// Inline images pass through unchanged. The MIME type comes from the
    /// response's content type, falling back to `image/png`.
    pub async fn inline(&self, image: &ImageInput) -> Result<ImageInput, BenchError> {
        let ImageSource::Url(url) = &image.source else {
            return Ok(image.clone());
        };
        let fetch_error = |message: String| BenchError::ImageFetch {
            image_id: image.image_id.clone(),
            url: url.clone(),
            message,
        };

        let resp = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| fetch_error(e.to_string()))?;

        let mime = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|ct| ct.split(';').next())
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_IMAGE_MIME)
            .to_string();
        let bytes = resp.bytes().await.map_err(|e| fetch_error(e.to_string()))?;
        tracing::debug!(
            "Fetched {} ({} bytes, {mime}) for inlining",
            image.image_id,
            bytes.len()
        );

        Ok(ImageInput::inline(
            image.image_id.clone(),
            base64::engine::general_purpose::STANDARD.encode(&bytes),
            mime,
        ))
    }
}
