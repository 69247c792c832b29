//! Pulls the answer text out of a provider payload.
//!
//! Providers disagree on where the text lives. Three shapes are known and
//! tried in a fixed order:
//!
//! 1. `{"output_text": "..."}`
//! 2. `{"output": [{"content": [{"text": "..."}, ...]}]}`
//! 3. `{"choices": [{"message": {"content": "..." | [{"text": "..."}, ...]}}]}`
//!
//! The first shape that yields non-empty text wins.

use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::Value;

/// One of the known response layouts.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    /// Top-level `output_text` string
    DirectText(String),
    /// Text parts of the first `output` item
    OutputList(Vec<String>),
    /// Content of the first chat choice
    ChatChoices(ChoiceContent),
}

/// Message content of a chat choice.
#[derive(Debug, Clone, PartialEq)]
pub enum ChoiceContent {
    Plain(String),
    Parts(Vec<String>),
}

impl ResponseShape {
    /// Decode every shape present in `payload`, in priority order.
    ///
    /// Shapes that don't match their schema are left out rather than failing.
    pub fn decode_all(payload: &Value) -> Vec<ResponseShape> {
        let mut shapes = Vec::new();
        if let Ok(direct) = DirectTextWire::deserialize(payload) {
            shapes.push(ResponseShape::DirectText(direct.output_text));
        }
        if let Ok(list) = OutputListWire::deserialize(payload) {
            if let Some(Lenient::Known(item)) = list.output.into_iter().next() {
                shapes.push(ResponseShape::OutputList(collect_texts(
                    item.content.unwrap_or_default(),
                )));
            }
        }
        if let Ok(chat) = ChatChoicesWire::deserialize(payload) {
            let message = chat
                .choices
                .into_iter()
                .next()
                .and_then(Lenient::known)
                .and_then(|choice| choice.message)
                .and_then(Lenient::known);
            match message.map(|m| m.content) {
                Some(ContentWire::Plain(text)) => {
                    shapes.push(ResponseShape::ChatChoices(ChoiceContent::Plain(text)))
                }
                Some(ContentWire::Parts(parts)) => shapes.push(ResponseShape::ChatChoices(
                    ChoiceContent::Parts(collect_texts(parts)),
                )),
                Some(ContentWire::Other(_)) | None => {}
            }
        }
        shapes
    }

    /// Text carried by this shape; parts are joined with newlines.
    pub fn text(&self) -> Option<String> {
        let text = match self {
            ResponseShape::DirectText(text)
            | ResponseShape::ChatChoices(ChoiceContent::Plain(text)) => text.clone(),
            ResponseShape::OutputList(parts)
            | ResponseShape::ChatChoices(ChoiceContent::Parts(parts)) => parts.join("\n"),
        };
        (!text.is_empty()).then_some(text)
    }
}

/// Extract the answer text from a provider payload.
///
/// Returns `None` if no known shape carries text. Text that doesn't start with
/// `{` is narrowed to its outermost `{...}` span when there is one; the result
/// may still not be valid JSON.
pub fn extract_text(payload: &Value) -> Option<String> {
    let text = ResponseShape::decode_all(payload)
        .iter()
        .find_map(ResponseShape::text)?;
    Some(narrow_to_json_object(text))
}

/// Greedy `{` ... `}` fallback for answers wrapped in prose or code fences.
fn narrow_to_json_object(text: String) -> String {
    if text.trim_start().starts_with('{') {
        return text;
    }
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => text[start..=end].to_string(),
        _ => text,
    }
}

fn collect_texts(parts: Vec<Lenient<TextPartWire>>) -> Vec<String> {
    parts
        .into_iter()
        .filter_map(Lenient::known)
        .filter_map(|part| part.text)
        .filter(|text| !text.is_empty())
        .collect()
}

// --- Wire types ---

/// Accepts anything; values that don't fit `T` become `Other`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Known(T),
    #[allow(dead_code)]
    Other(IgnoredAny),
}

impl<T> Lenient<T> {
    fn known(self) -> Option<T> {
        match self {
            Lenient::Known(value) => Some(value),
            Lenient::Other(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct DirectTextWire {
    output_text: String,
}

#[derive(Deserialize)]
struct OutputListWire {
    output: Vec<Lenient<OutputItemWire>>,
}

#[derive(Deserialize)]
struct OutputItemWire {
    #[serde(default)]
    content: Option<Vec<Lenient<TextPartWire>>>,
}

#[derive(Deserialize)]
struct TextPartWire {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoicesWire {
    choices: Vec<Lenient<ChoiceWire>>,
}

#[derive(Deserialize)]
struct ChoiceWire {
    #[serde(default)]
    message: Option<Lenient<MessageWire>>,
}

#[derive(Deserialize)]
struct MessageWire {
    #[serde(default = "ContentWire::missing")]
    content: ContentWire,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ContentWire {
    Plain(String),
    Parts(Vec<Lenient<TextPartWire>>),
    #[allow(dead_code)]
    Other(IgnoredAny),
}

impl ContentWire {
    fn missing() -> Self {
        ContentWire::Other(IgnoredAny)
    }
}
