//! Remote classification client: one chat-completions call per image.
//!
//! Images are classified strictly one after another. Each call is retried
//! according to the [`RetryPolicy`]; once the budget is spent the provider
//! error is handed back to the caller instead of being swallowed.

use super::extract::extract_text;
use super::normalize::normalize_prediction;
use super::provider::{ChatProvider, ChatRequest};
use super::retry::RetryPolicy;
use crate::config::Config;
use crate::error::ProviderError;
use crate::labels::LabelVocabulary;
use crate::types::{ClassificationResult, ImageInput, UsageTotals};

/// Per-run classification settings.
#[derive(Debug, Clone)]
pub struct ClassifyOptions {
    /// Completion budget per image
    pub max_tokens: u32,
    /// Accept free-text answers via substring matching
    pub tolerant: bool,
    /// Attempt budget and backoff
    pub retry: RetryPolicy,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            max_tokens: 128,
            tolerant: false,
            retry: RetryPolicy::default(),
        }
    }
}

impl ClassifyOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_tokens: config.provider.max_tokens,
            tolerant: config.run.tolerant,
            retry: RetryPolicy::from(&config.retry),
        }
    }
}

/// Classifies images against a fixed vocabulary through a chat provider.
pub struct Classifier {
    provider: Box<dyn ChatProvider>,
    model: String,
    options: ClassifyOptions,
}

impl Classifier {
    pub fn new(provider: Box<dyn ChatProvider>, model: &str, options: ClassifyOptions) -> Self {
        Self {
            provider,
            model: model.to_string(),
            options,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn options(&self) -> &ClassifyOptions {
        &self.options
    }

    /// Classify a single image.
    ///
    /// Returns the normalized prediction and the usage reported for this call.
    /// Malformed model output is not an error; it yields an empty prediction.
    pub async fn classify_one(
        &self,
        image: &ImageInput,
        vocabulary: &LabelVocabulary,
    ) -> Result<(ClassificationResult, UsageTotals), ProviderError> {
        let request =
            ChatRequest::classify_image(&self.model, image, vocabulary, self.options.max_tokens);

        let label = format!("{} {}", self.provider.name(), image.image_id);
        let payload = self
            .options
            .retry
            .run(&label, || self.provider.complete(&request))
            .await?;

        let usage = UsageTotals::from_provider(payload.get("usage"));
        let text = extract_text(&payload);
        let probs = normalize_prediction(text.as_deref(), vocabulary, self.options.tolerant);
        if probs.is_empty() {
            tracing::debug!(
                "No usable answer for {}: {:?}",
                image.image_id,
                text.as_deref().unwrap_or("<no text>")
            );
        }

        Ok((
            ClassificationResult {
                image_id: image.image_id.clone(),
                probs,
            },
            usage,
        ))
    }

    /// Classify images in input order, summing usage.
    ///
    /// Stops at the first image whose provider call fails after retries.
    pub async fn classify(
        &self,
        images: &[ImageInput],
        vocabulary: &LabelVocabulary,
    ) -> Result<(Vec<ClassificationResult>, UsageTotals), ProviderError> {
        let mut results = Vec::with_capacity(images.len());
        let mut totals = UsageTotals::default();
        for image in images {
            let (result, usage) = self.classify_one(image, vocabulary).await?;
            totals.add(&usage);
            results.push(result);
        }
        Ok((results, totals))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    /// A scripted chat provider.
    ///
    /// Each call to `complete()` invokes the response factory with the current
    /// call index, so tests can vary the answer per attempt.
    pub(crate) struct MockProvider {
        response_fn: Box<dyn Fn(u32) -> Result<Value, ProviderError> + Send + Sync>,
        call_count: Arc<AtomicU32>,
        requests: Arc<Mutex<Vec<Value>>>,
    }

    impl MockProvider {
        pub(crate) fn scripted(
            response_fn: impl Fn(u32) -> Result<Value, ProviderError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                response_fn: Box::new(response_fn),
                call_count: Arc::new(AtomicU32::new(0)),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Always answers with `content` as the first chat choice.
        pub(crate) fn answering(content: &str) -> Self {
            let content = content.to_string();
            Self::scripted(move |_| Ok(chat_payload(&content)))
        }

        pub(crate) fn failing(status: u16) -> Self {
            Self::scripted(move |_| {
                Err(ProviderError::Http {
                    status,
                    body: "provider unavailable".to_string(),
                })
            })
        }

        pub(crate) fn call_count_handle(&self) -> Arc<AtomicU32> {
            self.call_count.clone()
        }

        pub(crate) fn requests_handle(&self) -> Arc<Mutex<Vec<Value>>> {
            self.requests.clone()
        }
    }

    #[async_trait]
    impl ChatProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn complete(&self, request: &ChatRequest) -> Result<Value, ProviderError> {
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            if let Ok(body) = serde_json::to_value(request) {
                self.requests.lock().unwrap().push(body);
            }
            (self.response_fn)(idx)
        }
    }

    pub(crate) fn chat_payload(content: &str) -> Value {
        json!({
            "choices": [{"message": {"role": "assistant", "content": content}}],
            "usage": {"prompt_tokens": 100, "completion_tokens": 12, "total_tokens": 112, "input_images": 1}
        })
    }

    pub(crate) fn fast_options() -> ClassifyOptions {
        ClassifyOptions {
            retry: RetryPolicy::immediate(3),
            ..ClassifyOptions::default()
        }
    }

    fn vocab() -> LabelVocabulary {
        LabelVocabulary::new(["pikachu", "bulbasaur"]).unwrap()
    }

    fn image(id: &str) -> ImageInput {
        ImageInput::url(id, format!("https://example.com/{id}"))
    }

    #[tokio::test]
    async fn test_classify_one_normalizes_label() {
        let provider = MockProvider::answering(r#"{"label":"Pikachu!","probs":{}}"#);
        let classifier = Classifier::new(Box::new(provider), "mock-model", fast_options());

        let (result, usage) = classifier
            .classify_one(&image("1.png"), &vocab())
            .await
            .unwrap();
        assert_eq!(result.image_id, "1.png");
        assert_eq!(result.probs.get("pikachu"), Some(&1.0));
        assert_eq!(result.probs.len(), 1);
        assert_eq!(usage.total_tokens, 112);
        assert_eq!(usage.input_images, 1);
    }

    #[tokio::test]
    async fn test_free_text_answer_respects_tolerant_flag() {
        let strict = Classifier::new(
            Box::new(MockProvider::answering("it's clearly a bulbasaur here")),
            "m",
            fast_options(),
        );
        let (result, _) = strict.classify_one(&image("1.png"), &vocab()).await.unwrap();
        assert!(result.probs.is_empty());

        let tolerant = Classifier::new(
            Box::new(MockProvider::answering("it's clearly a bulbasaur here")),
            "m",
            ClassifyOptions {
                tolerant: true,
                ..fast_options()
            },
        );
        let (result, _) = tolerant.classify_one(&image("1.png"), &vocab()).await.unwrap();
        assert_eq!(result.probs.get("bulbasaur"), Some(&1.0));
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let provider = MockProvider::scripted(|idx| {
            if idx < 2 {
                Err(ProviderError::Http {
                    status: 502,
                    body: "bad gateway".into(),
                })
            } else {
                Ok(chat_payload(r#"{"label":"bulbasaur"}"#))
            }
        });
        let calls = provider.call_count_handle();
        let classifier = Classifier::new(Box::new(provider), "m", fast_options());

        let (result, _) = classifier
            .classify_one(&image("1.png"), &vocab())
            .await
            .unwrap();
        assert_eq!(result.probs.get("bulbasaur"), Some(&1.0));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_propagate() {
        let provider = MockProvider::failing(429);
        let calls = provider.call_count_handle();
        let classifier = Classifier::new(Box::new(provider), "m", fast_options());

        let err = classifier
            .classify_one(&image("1.png"), &vocab())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Http { status: 429, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_classify_sums_usage_in_order() {
        let provider = MockProvider::answering(r#"{"probs":{"pikachu":0.6,"bulbasaur":0.4}}"#);
        let requests = provider.requests_handle();
        let classifier = Classifier::new(Box::new(provider), "m", fast_options());

        let images = [image("1.png"), image("2.png"), image("3.png")];
        let (results, usage) = classifier.classify(&images, &vocab()).await.unwrap();

        let ids: Vec<_> = results.iter().map(|r| r.image_id.as_str()).collect();
        assert_eq!(ids, ["1.png", "2.png", "3.png"]);
        assert_eq!(usage.prompt_tokens, 300);
        assert_eq!(usage.input_images, 3);

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1]["messages"][1]["content"][1]["text"], "2.png");
    }

    #[tokio::test]
    async fn test_missing_usage_counts_as_zero() {
        let provider = MockProvider::scripted(|_| Ok(json!({"output_text": "{\"label\":\"pikachu\"}"})));
        let classifier = Classifier::new(Box::new(provider), "m", fast_options());
        let (result, usage) = classifier
            .classify_one(&image("1.png"), &vocab())
            .await
            .unwrap();
        assert_eq!(result.probs.get("pikachu"), Some(&1.0));
        assert!(usage.is_empty());
    }

    #[tokio::test]
    async fn test_unrecognized_payload_gives_empty_prediction() {
        let provider = MockProvider::scripted(|_| Ok(json!({"id": "gen-1", "object": "chat.completion"})));
        let classifier = Classifier::new(Box::new(provider), "m", fast_options());
        let (result, _) = classifier
            .classify_one(&image("1.png"), &vocab())
            .await
            .unwrap();
        assert!(result.probs.is_empty());
    }
}
