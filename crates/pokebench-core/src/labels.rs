//! Label vocabulary and matching of free-form model output to canonical labels.
//!
//! Labels are compared through a normalized key: lowercase, alphanumerics
//! only. "Mr. Mime", "mr mime" and "MR-MIME" all resolve to the same label.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{BenchError, ConfigError};

/// Comparison key for a label: lowercased, everything outside `[a-z0-9]` dropped.
pub fn normalize(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Ordered, read-only set of canonical labels.
///
/// Order is the order of the input list and decides which label wins when
/// several appear in the same free-form answer.
#[derive(Debug, Clone)]
pub struct LabelVocabulary {
    labels: Vec<String>,
    lowercase: Vec<String>,
    by_key: HashMap<String, usize>,
}

impl LabelVocabulary {
    /// Build a vocabulary, rejecting labels that collide after normalization.
    pub fn new<I, S>(labels: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocab = Self {
            labels: Vec::new(),
            lowercase: Vec::new(),
            by_key: HashMap::new(),
        };
        for label in labels {
            let label: String = label.into();
            let key = normalize(&label);
            if key.is_empty() {
                return Err(ConfigError::EmptyLabel(label));
            }
            if let Some(&existing) = vocab.by_key.get(&key) {
                return Err(ConfigError::DuplicateLabel {
                    first: vocab.labels[existing].clone(),
                    second: label,
                });
            }
            vocab.by_key.insert(key, vocab.labels.len());
            vocab.lowercase.push(label.to_lowercase());
            vocab.labels.push(label);
        }
        Ok(vocab)
    }

    /// Parse a label list: one label per line, surrounding whitespace trimmed,
    /// blank lines skipped.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        )
    }

    /// Load a `labels.txt` file.
    pub fn load(path: &Path) -> Result<Self, BenchError> {
        let content = std::fs::read_to_string(path).map_err(|source| BenchError::File {
            path: path.to_path_buf(),
            source,
        })?;
        let vocab = Self::parse(&content)?;
        tracing::debug!("Loaded {} labels from {:?}", vocab.len(), path);
        Ok(vocab)
    }

    /// Resolve arbitrary text to a canonical label by exact key match.
    pub fn resolve(&self, candidate: &str) -> Option<&str> {
        self.by_key
            .get(&normalize(candidate))
            .map(|&idx| self.labels[idx].as_str())
    }

    /// First label, in vocabulary order, whose lowercase form occurs in `text`.
    pub fn find_in_text(&self, text: &str) -> Option<&str> {
        let haystack = text.to_lowercase();
        self.lowercase
            .iter()
            .position(|label| haystack.contains(label.as_str()))
            .map(|idx| self.labels[idx].as_str())
    }

    /// Position of a canonical label in the vocabulary.
    pub fn position(&self, label: &str) -> Option<usize> {
        self.by_key.get(&normalize(label)).copied()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> LabelVocabulary {
        LabelVocabulary::new(["pikachu", "mr mime", "Farfetch'd", "porygon2", "porygon"]).unwrap()
    }

    #[test]
    fn test_normalize_strips_non_alphanumerics() {
        assert_eq!(normalize("Mr. Mime"), "mrmime");
        assert_eq!(normalize("  Pikachu!  "), "pikachu");
        assert_eq!(normalize("Porygon-Z"), "porygonz");
        assert_eq!(normalize("Flabébé"), "flabb");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for s in ["Mr. Mime", "FARFETCH'D", "porygon 2", ""] {
            assert_eq!(normalize(&normalize(s)), normalize(s));
        }
    }

    #[test]
    fn test_resolve_ignores_case_punctuation_and_spacing() {
        let vocab = vocab();
        for variant in ["mr mime", "Mr. Mime", "MR-MIME", "mrmime", " m r m i m e "] {
            assert_eq!(vocab.resolve(variant), Some("mr mime"), "variant {variant:?}");
        }
        assert_eq!(vocab.resolve("farfetchd"), Some("Farfetch'd"));
        assert_eq!(vocab.resolve("Pikachu!"), Some("pikachu"));
    }

    #[test]
    fn test_resolve_unknown_label() {
        assert_eq!(vocab().resolve("raichu"), None);
        assert_eq!(vocab().resolve(""), None);
    }

    #[test]
    fn test_find_in_text_uses_vocabulary_order() {
        let vocab = vocab();
        // "porygon2" comes before "porygon" in the vocabulary, so it wins
        assert_eq!(vocab.find_in_text("Looks like PORYGON2 to me"), Some("porygon2"));
        assert_eq!(
            vocab.find_in_text("either porygon or pikachu"),
            Some("pikachu")
        );
        assert_eq!(vocab.find_in_text("a farfetch'd holding a leek"), Some("Farfetch'd"));
        assert_eq!(vocab.find_in_text("no idea"), None);
    }

    #[test]
    fn test_duplicate_after_normalization_rejected() {
        let err = LabelVocabulary::new(["mr mime", "Mr. Mime"]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateLabel { .. }));
    }

    #[test]
    fn test_empty_key_rejected() {
        let err = LabelVocabulary::new(["pikachu", "???"]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyLabel(_)));
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let vocab = LabelVocabulary::parse("bulbasaur\n\n  ivysaur \n\nvenusaur\n").unwrap();
        assert_eq!(vocab.labels(), ["bulbasaur", "ivysaur", "venusaur"]);
        assert_eq!(vocab.position("IVYSAUR"), Some(1));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.txt");
        std::fs::write(&path, "pikachu\nbulbasaur\n").unwrap();
        let vocab = LabelVocabulary::load(&path).unwrap();
        assert_eq!(vocab.len(), 2);
        assert!(LabelVocabulary::load(&dir.path().join("missing.txt")).is_err());
    }
}
