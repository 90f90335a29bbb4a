// ============================================================
// Layer 3 — Label Vocabulary
// ============================================================
// Maps class label strings to the integer indices the classifier
// predicts, and back again.
//
// Two ways to build one:
//
//   from_labels   — at training time, from every label in the
//                   training manifest. Labels are deduplicated and
//                   sorted, so the same manifest always produces the
//                   same mapping regardless of row order.
//
//   from_ordered  — at inference time, from the list stored in the
//                   checkpoint. The stored order is taken as-is and
//                   NEVER re-sorted: index i of the model's output
//                   means stored label i, full stop.
//
// The vocabulary is immutable after construction and is passed
// by reference into every component that needs it.

use std::collections::{BTreeSet, HashMap};

use crate::domain::traits::LabelCodec;
use crate::error::{LoadError, LookupError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVocabulary {
    labels: Vec<String>,
    index:  HashMap<String, usize>,
}

impl LabelVocabulary {
    /// Build a sorted, deduplicated vocabulary from raw manifest labels.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sorted: BTreeSet<String> = labels
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect();
        Self::build(sorted.into_iter().collect())
    }

    /// Rebuild a vocabulary from a persisted, already ordered label list.
    pub fn from_ordered(labels: Vec<String>) -> Result<Self, LoadError> {
        if labels.is_empty() {
            return Err(LoadError::InvalidMetadata {
                field:  "labels",
                reason: "label list is empty".to_string(),
            });
        }
        let unique: BTreeSet<&String> = labels.iter().collect();
        if unique.len() != labels.len() {
            return Err(LoadError::InvalidMetadata {
                field:  "labels",
                reason: "label list contains duplicates".to_string(),
            });
        }
        Ok(Self::build(labels))
    }

    fn build(labels: Vec<String>) -> Self {
        let index = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();
        Self { labels, index }
    }

    /// Labels in index order — this is the order persisted to disk.
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

impl LabelCodec for LabelVocabulary {
    fn encode(&self, label: &str) -> Result<usize, LookupError> {
        self.index
            .get(label)
            .copied()
            .ok_or_else(|| LookupError::UnknownLabel(label.to_string()))
    }

    fn decode(&self, index: usize) -> Result<&str, LookupError> {
        self.labels
            .get(index)
            .map(String::as_str)
            .ok_or(LookupError::UnknownIndex { index, len: self.labels.len() })
    }

    fn num_classes(&self) -> usize {
        self.labels.len()
    }
}
