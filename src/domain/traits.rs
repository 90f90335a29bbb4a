// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The dataset needs label → index, the inference engine needs
// index → label. Both go through this one capability instead of
// depending on how the mapping is stored.
//
// Implementations:
//   - LabelVocabulary → sorted vocabulary built from a manifest,
//                       or the ordered list stored in a checkpoint
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use crate::error::LookupError;

// ─── LabelCodec ───────────────────────────────────────────────────────────────
/// Bidirectional mapping between class label strings and class indices.
pub trait LabelCodec {
    /// Label string → class index. Unknown labels are a LookupError.
    fn encode(&self, label: &str) -> Result<usize, LookupError>;

    /// Class index → label string.
    fn decode(&self, index: usize) -> Result<&str, LookupError>;

    /// Number of classes, i.e. the width of the classifier head.
    fn num_classes(&self) -> usize;
}
