//! OpenRouter provider using the OpenAI-compatible Chat Completions API.
//!
//! Images travel as `image_url` content parts, either remote URLs or
//! `data:` URLs.

use super::provider::{ChatProvider, ChatRequest};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Error bodies are cut to this many characters.
const MAX_ERROR_BODY: usize = 500;

/// Chat-completions client for OpenRouter (or any compatible endpoint).
pub struct OpenRouterProvider {
    api_key: String,
    endpoint: String,
    referer: String,
    title: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenRouterProvider {
    pub fn new(api_key: &str, config: &ProviderConfig) -> Self {
        Self {
            api_key: api_key.to_string(),
            endpoint: config.endpoint.clone(),
            referer: config.referer.clone(),
            title: config.title.clone(),
            timeout: config.timeout(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the provider at a different endpoint (used by tests).
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ChatProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Value, ProviderError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .header(
                "User-Agent",
                format!("PokeBenchAI/{} (+{})", crate::VERSION, self.referer),
            )
            .json(request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                    }
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = resp
            .text()
            .await
            .map_err(|e| ProviderError::Network(format!("Failed to read response body: {e}")))?;

        if status.as_u16() >= 400 {
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body: truncate(&body),
            });
        }
        if !content_type.contains("application/json") {
            return Err(ProviderError::ContentType {
                content_type,
                body: truncate(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY).collect()
}
