// ============================================================
// Error Types
// ============================================================
// Every failure the recognition pipeline can report, grouped by
// the component that detects it:
//
//   DataError    — a sample or manifest is missing, corrupt, or has
//                  the wrong feature width
//   LookupError  — a label string is not in the vocabulary
//   LoadError    — a checkpoint is missing metadata or its weights
//                  do not fit the rebuilt architecture
//   ShapeError   — an inference input has the wrong feature width
//   ConfigError  — a training configuration value is invalid
//   TrainError   — aggregate returned by the training loop
//
// Library code returns these typed errors. The application and
// CLI layers wrap them in anyhow::Error with extra context.
//
// None of these are retried or swallowed inside the crate: they
// go straight back to the caller of the component that raised them.

use std::path::PathBuf;
use thiserror::Error;

// ─── DataError ────────────────────────────────────────────────────────────────
/// A manifest row or keypoint array could not be used.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Keypoint file not found: '{path}'")]
    MissingFile { path: PathBuf },

    #[error("Cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot decode keypoint array in '{path}': {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("'{path}' has feature width {actual}, expected {expected}")]
    WidthMismatch { path: PathBuf, expected: usize, actual: usize },

    #[error("Malformed manifest '{path}': {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Manifest '{path}' contains no samples")]
    EmptyManifest { path: PathBuf },

    #[error("Index {index} out of bounds (dataset has {len} samples)")]
    IndexOutOfBounds { index: usize, len: usize },
}

impl DataError {
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DataError::Corrupt { path: path.into(), reason: reason.into() }
    }
}

// ─── LookupError ──────────────────────────────────────────────────────────────
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("Label '{0}' is not in the vocabulary")]
    UnknownLabel(String),

    #[error("Class index {index} is out of range for a vocabulary of {len} labels")]
    UnknownIndex { index: usize, len: usize },
}

// ─── DatasetError ─────────────────────────────────────────────────────────────
/// Anything that can go wrong while opening a SequenceDataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

// ─── LoadError ────────────────────────────────────────────────────────────────
/// A checkpoint could not be turned back into a working model.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cannot read checkpoint '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Checkpoint '{path}' is not a valid bundle: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Checkpoint format version {found} is not supported (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Checkpoint metadata field `{field}` is invalid: {reason}")]
    InvalidMetadata { field: &'static str, reason: String },

    #[error("Cannot restore model weights: {0}")]
    Record(String),

    #[error("Parameter {index} has shape {actual:?}, architecture expects {expected:?}")]
    ShapeMismatch { index: usize, expected: Vec<usize>, actual: Vec<usize> },

    #[error("Checkpoint holds {actual} parameter tensors, architecture expects {expected}")]
    ParameterCount { expected: usize, actual: usize },
}

// ─── ShapeError ───────────────────────────────────────────────────────────────
/// An input sequence does not have the shape the model was trained on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("Feature width mismatch: expected {expected}, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("Frame {frame} has {actual} values, expected {expected}")]
    RaggedFrame { frame: usize, expected: usize, actual: usize },

    #[error("Keypoint sequences must have a non-zero feature width")]
    ZeroWidth,
}

// ─── ConfigError ──────────────────────────────────────────────────────────────
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Cannot read config file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue { field, reason: reason.into() }
    }
}

// ─── TrainError ───────────────────────────────────────────────────────────────
/// Top-level error for a training run.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Checkpoint error: {message} (path: {path:?})")]
    Checkpoint { message: String, path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Training loss became non-finite ({loss}) in epoch {epoch}, batch {batch}")]
    NonFiniteLoss { epoch: usize, batch: usize, loss: f64 },

    #[error("Dataset '{0}' is empty")]
    EmptyDataset(&'static str),
}

impl TrainError {
    pub fn checkpoint(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        TrainError::Checkpoint { message: message.into(), path: path.into() }
    }
}

impl From<DataError> for TrainError {
    fn from(e: DataError) -> Self {
        TrainError::Dataset(DatasetError::Data(e))
    }
}

impl From<LookupError> for TrainError {
    fn from(e: LookupError) -> Self {
        TrainError::Dataset(DatasetError::Lookup(e))
    }
}
