// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from a manifest on disk to tensor batches.
//
// The pipeline flows in this order:
//
//   manifest.csv (file,label)
//       │
//       ▼
//   Manifest          → parses rows, resolves array paths
//       │
//       ▼
//   arrays            → loads each .npz / .npy `keypoints` array
//       │
//       ▼
//   SequenceDataset   → validates widths + labels, implements
//       │               Burn's Dataset trait
//       ▼
//   SequenceResampler → fixed T frames (also used at inference)
//       │
//       ▼
//   Augmentor         → mirror + jitter (training only)
//       │
//       ▼
//   SequenceBatcher   → stacks items into [N, T, D] tensors
//       │
//       ▼
//   DataLoader        → feeds shuffled batches to the trainer
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// CSV manifest of (file, label) rows
pub mod manifest;

/// Loads keypoint arrays from .npz / .npy files
pub mod arrays;

/// Fixed-length temporal resampling
pub mod resampler;

/// Randomised mirror + jitter for training
pub mod augmentor;

/// Implements Burn's Dataset trait for keypoint sequences
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
