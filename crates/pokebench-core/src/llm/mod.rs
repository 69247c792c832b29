//! Chat-completions classification of images against a label vocabulary.
//!
//! Provides the provider seam (with an OpenRouter implementation), retry
//! policy, response-text extraction, answer normalization, and the classifier
//! that ties them together.

pub(crate) mod classifier;
pub(crate) mod extract;
pub(crate) mod normalize;
pub(crate) mod openrouter;
pub(crate) mod provider;
pub(crate) mod retry;

pub use classifier::{Classifier, ClassifyOptions};
pub use extract::{extract_text, ChoiceContent, ResponseShape};
pub use normalize::normalize_prediction;
pub use openrouter::OpenRouterProvider;
pub use provider::{ChatProvider, ChatRequest, MAX_PROMPT_LABELS};
pub use retry::RetryPolicy;
