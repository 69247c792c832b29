//! Turns extracted answer text into per-label confidences.
//!
//! This never fails: anything the model says that can't be mapped onto the
//! vocabulary just produces fewer (or zero) confidences.

use serde_json::{Map, Value};

use crate::labels::LabelVocabulary;
use crate::types::Probs;

/// Map answer text onto canonical labels.
///
/// Structured answers (`{"label": ..., "probs": {...}}`) are read first:
/// resolvable `probs` keys win, then a resolvable `label` counts as certain.
/// In tolerant mode, text that yields nothing structured is searched for any
/// label as a substring.
pub fn normalize_prediction(
    text: Option<&str>,
    vocabulary: &LabelVocabulary,
    tolerant: bool,
) -> Probs {
    let Some(text) = text else {
        return Probs::new();
    };

    let structured = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(answer)) => from_structured(&answer, vocabulary),
        Ok(_) | Err(_) => Probs::new(),
    };
    if !structured.is_empty() {
        return structured;
    }

    if tolerant {
        if let Some(label) = vocabulary.find_in_text(text) {
            tracing::debug!("Tolerant match {label:?} in free-form answer");
            return Probs::from([(label.to_string(), 1.0)]);
        }
    }
    Probs::new()
}

fn from_structured(answer: &Map<String, Value>, vocabulary: &LabelVocabulary) -> Probs {
    let mut probs = Probs::new();
    if let Some(Value::Object(raw)) = answer.get("probs") {
        for (key, value) in raw {
            let Some(confidence) = value.as_f64() else {
                continue;
            };
            if let Some(label) = vocabulary.resolve(key) {
                probs.insert(label.to_string(), confidence.clamp(0.0, 1.0));
            }
        }
    }
    if !probs.is_empty() {
        return probs;
    }

    let label = match answer.get("label") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    if let Some(canonical) = label.as_deref().and_then(|l| vocabulary.resolve(l)) {
        probs.insert(canonical.to_string(), 1.0);
    }
    probs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> LabelVocabulary {
        LabelVocabulary::new(["pikachu", "bulbasaur", "mr mime"]).unwrap()
    }

    fn probs(pairs: &[(&str, f64)]) -> Probs {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_label_only_answer() {
        let out = normalize_prediction(Some(r#"{"label":"Pikachu!","probs":{}}"#), &vocab(), false);
        assert_eq!(out, probs(&[("pikachu", 1.0)]));
    }

    #[test]
    fn test_probs_resolved_to_canonical_labels() {
        let out = normalize_prediction(
            Some(r#"{"label":"pikachu","probs":{"PIKACHU":0.7,"Mr. Mime":0.2,"raichu":0.1}}"#),
            &vocab(),
            false,
        );
        assert_eq!(out, probs(&[("pikachu", 0.7), ("mr mime", 0.2)]));
    }

    #[test]
    fn test_non_numeric_probs_skipped() {
        let out = normalize_prediction(
            Some(r#"{"probs":{"pikachu":"high","bulbasaur":true,"mr mime":null}}"#),
            &vocab(),
            false,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_probs_win_over_label() {
        let out = normalize_prediction(
            Some(r#"{"label":"pikachu","probs":{"bulbasaur":0.4}}"#),
            &vocab(),
            false,
        );
        assert_eq!(out, probs(&[("bulbasaur", 0.4)]));
    }

    #[test]
    fn test_unresolvable_probs_fall_back_to_label() {
        let out = normalize_prediction(
            Some(r#"{"label":"bulbasaur","probs":{"ditto":0.9}}"#),
            &vocab(),
            false,
        );
        assert_eq!(out, probs(&[("bulbasaur", 1.0)]));
    }

    #[test]
    fn test_duplicate_keys_last_write_wins() {
        let out = normalize_prediction(
            Some(r#"{"probs":{"Pikachu":0.3,"pikachu!":0.8}}"#),
            &vocab(),
            false,
        );
        assert_eq!(out.len(), 1);
        assert!(out.contains_key("pikachu"));
    }

    #[test]
    fn test_confidences_clamped() {
        let out = normalize_prediction(
            Some(r#"{"probs":{"pikachu":95,"bulbasaur":-1}}"#),
            &vocab(),
            false,
        );
        assert_eq!(out, probs(&[("pikachu", 1.0), ("bulbasaur", 0.0)]));
    }

    #[test]
    fn test_free_text_tolerant_and_strict() {
        let text = Some("it's clearly a bulbasaur here");
        assert_eq!(
            normalize_prediction(text, &vocab(), true),
            probs(&[("bulbasaur", 1.0)])
        );
        assert!(normalize_prediction(text, &vocab(), false).is_empty());
    }

    #[test]
    fn test_tolerant_search_is_case_insensitive() {
        let out = normalize_prediction(Some("That's PIKACHU."), &vocab(), true);
        assert_eq!(out, probs(&[("pikachu", 1.0)]));
    }

    #[test]
    fn test_tolerant_fallback_after_empty_structure() {
        let text = Some(r#"{"label":"a yellow pikachu plush","probs":{}}"#);
        assert!(normalize_prediction(text, &vocab(), false).is_empty());
        assert_eq!(
            normalize_prediction(text, &vocab(), true),
            probs(&[("pikachu", 1.0)])
        );
    }

    #[test]
    fn test_never_fails_on_garbage() {
        let inputs = [
            None,
            Some(""),
            Some("{"),
            Some("[1,2,3]"),
            Some("null"),
            Some("42"),
            Some(r#"{"probs":[0.5]}"#),
            Some(r#"{"label":{"nested":true}}"#),
            Some(r#"{"label":null,"probs":null}"#),
        ];
        for input in inputs {
            assert!(normalize_prediction(input, &vocab(), false).is_empty(), "{input:?}");
            assert!(normalize_prediction(input, &vocab(), true).is_empty(), "{input:?}");
        }
    }

    #[test]
    fn test_numeric_label_resolves() {
        let vocab = LabelVocabulary::new(["porygon2", "151"]).unwrap();
        let out = normalize_prediction(Some(r#"{"label":151}"#), &vocab, false);
        assert_eq!(out, probs(&[("151", 1.0)]));
    }
}
