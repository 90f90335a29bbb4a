// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that define what the system works with:
// keypoint sequences, labeled samples and the label vocabulary.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Keypoint sequences and labeled samples
pub mod keypoints;

// Sorted label ↔ index mapping
pub mod vocabulary;

// Core abstractions (traits) that other layers implement
pub mod traits;
