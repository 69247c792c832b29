//! Top-k accuracy and macro F1 over predictions joined with ground truth.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeSet, HashMap};

use crate::labels::LabelVocabulary;
use crate::types::{ClassificationResult, Probs};

/// One ground-truth record: `{"image_id": "1.png", "class": "bulbasaur"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundTruth {
    pub image_id: String,
    #[serde(rename = "class")]
    pub label: String,
}

/// Computed metrics.
///
/// Serializes as a flat object: `{"top1": .., "top5": .., "macro_f1": ..}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    /// Accuracy per k, in the order the k values were requested
    pub top_k: Vec<(usize, f64)>,
    pub macro_f1: f64,
    /// Rows in the join
    pub matched: usize,
}

impl Metrics {
    fn zero(ks: &[usize]) -> Self {
        Self {
            top_k: ks.iter().map(|&k| (k, 0.0)).collect(),
            macro_f1: 0.0,
            matched: 0,
        }
    }

    pub fn top(&self, k: usize) -> Option<f64> {
        self.top_k.iter().find(|(kk, _)| *kk == k).map(|(_, v)| *v)
    }

    /// Look up a metric by its report name (`top1`, `macro_f1`, ...).
    pub fn get(&self, name: &str) -> Option<f64> {
        if name == "macro_f1" {
            return Some(self.macro_f1);
        }
        name.strip_prefix("top")
            .and_then(|k| k.parse().ok())
            .and_then(|k| self.top(k))
    }
}

impl Serialize for Metrics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.top_k.len() + 1))?;
        for (k, value) in &self.top_k {
            map.serialize_entry(&format!("top{k}"), value)?;
        }
        map.serialize_entry("macro_f1", &self.macro_f1)?;
        map.end()
    }
}

/// Scores prediction sets against ground truth.
#[derive(Debug, Clone)]
pub struct Scorer {
    top_k: Vec<usize>,
    vocabulary: Option<LabelVocabulary>,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(vec![1, 5])
    }
}

impl Scorer {
    pub fn new(top_k: Vec<usize>) -> Self {
        Self {
            top_k,
            vocabulary: None,
        }
    }

    /// Break confidence ties by position in `vocabulary`.
    pub fn with_vocabulary(mut self, vocabulary: LabelVocabulary) -> Self {
        self.vocabulary = Some(vocabulary);
        self
    }

    /// Labels of `probs` by descending confidence.
    ///
    /// Ties go to the label listed first in the vocabulary (labels outside it
    /// come last), then to the smaller label string.
    pub fn rank<'p>(&self, probs: &'p Probs) -> Vec<&'p str> {
        let position = |label: &str| {
            self.vocabulary
                .as_ref()
                .and_then(|v| v.position(label))
                .unwrap_or(usize::MAX)
        };
        let mut ranked: Vec<(&str, f64)> = probs.iter().map(|(l, c)| (l.as_str(), *c)).collect();
        ranked.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| position(a.0).cmp(&position(b.0)))
                .then_with(|| a.0.cmp(b.0))
        });
        ranked.into_iter().map(|(label, _)| label).collect()
    }

    /// Join on image id and compute metrics.
    ///
    /// Ids present on only one side are ignored. If an image id is predicted
    /// more than once the last entry counts. Rows whose prediction is empty
    /// count as misses for top-k and are left out of macro F1.
    pub fn score(
        &self,
        ground_truth: &[GroundTruth],
        predictions: &[ClassificationResult],
    ) -> Metrics {
        let by_id: HashMap<&str, &Probs> = predictions
            .iter()
            .map(|p| (p.image_id.as_str(), &p.probs))
            .collect();

        let mut hits = vec![0usize; self.top_k.len()];
        let mut pairs: Vec<(&str, &str)> = Vec::new();
        let mut matched = 0usize;

        for truth in ground_truth {
            let Some(&probs) = by_id.get(truth.image_id.as_str()) else {
                continue;
            };
            matched += 1;
            let ranked = self.rank(probs);
            for (hit, &k) in hits.iter_mut().zip(&self.top_k) {
                if ranked.iter().take(k).any(|l| *l == truth.label) {
                    *hit += 1;
                }
            }
            if let Some(&top) = ranked.first() {
                pairs.push((truth.label.as_str(), top));
            }
        }

        if matched == 0 {
            tracing::warn!("No predictions matched the ground truth; all metrics are zero");
            return Metrics::zero(&self.top_k);
        }

        tracing::debug!("Scored {matched} rows ({} with a prediction)", pairs.len());
        Metrics {
            top_k: self
                .top_k
                .iter()
                .zip(&hits)
                .map(|(&k, &hit)| (k, hit as f64 / matched as f64))
                .collect(),
            macro_f1: macro_f1(&pairs),
            matched,
        }
    }
}

/// Unweighted mean of per-class F1 over every class seen in `pairs`.
///
/// `pairs` holds `(true, predicted)` labels. A class whose F1 denominator is
/// zero scores 0.
pub fn macro_f1(pairs: &[(&str, &str)]) -> f64 {
    let classes: BTreeSet<&str> = pairs.iter().flat_map(|(t, p)| [*t, *p]).collect();
    if classes.is_empty() {
        return 0.0;
    }

    let total: f64 = classes
        .iter()
        .map(|&class| {
            let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
            for &(truth, pred) in pairs {
                match (truth == class, pred == class) {
                    (true, true) => tp += 1,
                    (false, true) => fp += 1,
                    (true, false) => fn_ += 1,
                    (false, false) => {}
                }
            }
            let denom = 2 * tp + fp + fn_;
            if denom == 0 {
                0.0
            } else {
                2.0 * tp as f64 / denom as f64
            }
        })
        .sum();
    total / classes.len() as f64
}
