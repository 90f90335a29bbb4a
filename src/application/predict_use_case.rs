// ============================================================
// Layer 2 — Predict Use Case
// ============================================================
// Recognises the gesture in one recorded sequence:
//   1. Locate the checkpoint (a file, or a directory holding
//      recognition.ckpt)
//   2. Build the InferenceEngine on the chosen device
//   3. Read the query: .npz / .npy keypoint array, or a JSON
//      list of frames ([[x, y, z, ...], ...])
//   4. Predict and collect the top-k labels

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, NdArray, Wgpu},
    prelude::Backend,
};

use crate::application::DeviceKind;
use crate::data::arrays::load_keypoints;
use crate::domain::keypoints::KeypointSequence;
use crate::infra::checkpoint::CHECKPOINT_FILE;
use crate::ml::inferencer::InferenceEngine;

/// What the CLI shows for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionReport {
    pub label:      String,
    pub confidence: f32,
    /// Best first, at most `top_k` entries
    pub top:        Vec<(String, f32)>,
    /// Frames in the query before resampling
    pub frames:     usize,
    pub seq_len:    usize,
}

pub struct PredictUseCase {
    checkpoint: PathBuf,
    top_k:      usize,
}

impl PredictUseCase {
    pub fn new(checkpoint: impl AsRef<Path>, top_k: usize) -> Self {
        Self { checkpoint: resolve_checkpoint(checkpoint.as_ref()), top_k }
    }

    pub fn execute(&self, input: &Path, device: DeviceKind) -> Result<PredictionReport> {
        match device {
            DeviceKind::Wgpu => self.execute_on::<Wgpu>(input, WgpuDevice::default()),
            DeviceKind::Cpu  => self.execute_on::<NdArray>(input, NdArrayDevice::default()),
        }
    }

    pub fn execute_on<B: Backend>(&self, input: &Path, device: B::Device) -> Result<PredictionReport> {
        let engine = InferenceEngine::<B>::from_checkpoint(&self.checkpoint, device)
            .with_context(|| format!("Cannot load checkpoint '{}'", self.checkpoint.display()))?;

        let query = read_query(input)?;
        tracing::info!("Query '{}': {} frames x {} values", input.display(), query.len(), query.width());

        let prediction = engine
            .predict(&query)
            .with_context(|| format!("Cannot classify '{}'", input.display()))?;

        let top = engine
            .top_labels(&prediction, self.top_k)
            .into_iter()
            .map(|(label, p)| (label.to_string(), p))
            .collect();

        Ok(PredictionReport {
            label:      prediction.label,
            confidence: prediction.confidence,
            top,
            frames:     query.len(),
            seq_len:    engine.seq_len(),
        })
    }
}

/// A directory means "the checkpoint inside it".
pub fn resolve_checkpoint(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(CHECKPOINT_FILE)
    } else {
        path.to_path_buf()
    }
}

/// Load a query sequence from a keypoint array or a JSON list of frames.
pub fn read_query(path: &Path) -> Result<KeypointSequence> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if !is_json {
        return load_keypoints(path).with_context(|| format!("Cannot read query '{}'", path.display()));
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read query '{}'", path.display()))?;
    let rows: Vec<Vec<f32>> = serde_json::from_str(&text)
        .with_context(|| format!("'{}' is not a JSON list of frames", path.display()))?;
    KeypointSequence::from_rows(&rows)
        .with_context(|| format!("Malformed frames in '{}'", path.display()))
}
