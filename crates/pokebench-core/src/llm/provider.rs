//! Chat-completions request types and the provider seam.
//!
//! The classification prompt is fixed: a system message pinning the output to
//! a strict JSON object, and a user message carrying the instruction, the
//! image id and the image itself.

use crate::error::ProviderError;
use crate::labels::LabelVocabulary;
use crate::types::ImageInput;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// At most this many labels are spelled out in the prompt.
pub const MAX_PROMPT_LABELS: usize = 500;

const SYSTEM_PROMPT: &str = "You are an image classifier. Return ONLY valid JSON with the exact schema: \
     {\"label\": \"<one_label>\", \"probs\": {\"<label>\": <prob>}}. \
     Choose the label ONLY from the provided list, with the exact spelling. No extra text.";

/// Body of a chat-completions call.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub response_format: ResponseFormat,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: MessageContent,
}

/// System messages carry a plain string, user messages a list of parts.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl ChatRequest {
    /// Build the classification conversation for one image.
    pub fn classify_image(
        model: &str,
        image: &ImageInput,
        vocabulary: &LabelVocabulary,
        max_tokens: u32,
    ) -> Self {
        let shown = &vocabulary.labels()[..vocabulary.len().min(MAX_PROMPT_LABELS)];
        // Serializing a slice of strings cannot fail
        let label_list = serde_json::to_string(shown).unwrap_or_else(|_| "[]".to_string());
        let instruction = format!(
            "Classify the image (id={}) into ONE label among these (use exact spelling): {label_list}. \
             Return only JSON with the keys label and probs (with a few relevant labels).",
            image.image_id
        );

        Self {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(SYSTEM_PROMPT.to_string()),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Parts(vec![
                        ContentPart::Text { text: instruction },
                        ContentPart::Text {
                            text: image.image_id.clone(),
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: image.content_url(),
                            },
                        },
                    ]),
                },
            ],
            max_tokens,
            temperature: 0.0,
            top_p: 1.0,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        }
    }
}

/// A chat-completions backend.
///
/// Uses `async_trait` so the classifier can hold a `Box<dyn ChatProvider>`.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Send one request and return the decoded JSON payload.
    ///
    /// A single attempt; retries are the caller's business.
    async fn complete(&self, request: &ChatRequest) -> Result<Value, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vocab() -> LabelVocabulary {
        LabelVocabulary::new(["pikachu", "bulbasaur"]).unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let image = ImageInput::url("25.png", "https://example.com/25.png");
        let request = ChatRequest::classify_image("openai/gpt-4o-mini", &image, &vocab(), 128);
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["model"], "openai/gpt-4o-mini");
        assert_eq!(body["max_tokens"], 128);
        assert_eq!(body["temperature"], json!(0.0));
        assert_eq!(body["top_p"], json!(1.0));
        assert_eq!(body["response_format"], json!({"type": "json_object"}));

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert!(messages[0]["content"].as_str().unwrap().contains("\"probs\""));

        let parts = messages[1]["content"].as_array().unwrap();
        assert_eq!(parts[0]["type"], "text");
        let instruction = parts[0]["text"].as_str().unwrap();
        assert!(instruction.contains("id=25.png"));
        assert!(instruction.contains(r#"["pikachu","bulbasaur"]"#));
        assert_eq!(parts[1], json!({"type": "text", "text": "25.png"}));
        assert_eq!(
            parts[2],
            json!({"type": "image_url", "image_url": {"url": "https://example.com/25.png"}})
        );
    }

    #[test]
    fn test_inline_image_becomes_data_url() {
        let image = ImageInput::inline("1.png", "iVBORw0KGgo=", "image/png");
        let request = ChatRequest::classify_image("m", &image, &vocab(), 64);
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body["messages"][1]["content"][2]["image_url"]["url"],
            "data:image/png;base64,iVBORw0KGgo="
        );
    }

    #[test]
    fn test_label_list_is_truncated() {
        let labels: Vec<String> = (0..MAX_PROMPT_LABELS + 20)
            .map(|i| format!("species{i}"))
            .collect();
        let vocab = LabelVocabulary::new(labels).unwrap();
        let image = ImageInput::url("x.png", "https://example.com/x.png");
        let request = ChatRequest::classify_image("m", &image, &vocab, 64);
        let body = serde_json::to_value(&request).unwrap();
        let instruction = body["messages"][1]["content"][0]["text"].as_str().unwrap();
        assert!(instruction.contains("\"species499\""));
        assert!(!instruction.contains("\"species500\""));
    }
}
