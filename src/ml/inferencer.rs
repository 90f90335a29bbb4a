// ============================================================
// Layer 5 — Inference Engine
// ============================================================
// Loads a trained checkpoint and classifies keypoint sequences.
//
// Inference pipeline:
//   1. Read the checkpoint bundle (metadata + weights)
//   2. Rebuild the classifier with the stored architecture,
//      dropout disabled, and load the weights into it
//   3. For each query:
//        check width == checkpoint input_width
//        resample to the checkpoint seq_len
//        stack as a [1, T, D] tensor (same layout as training)
//        forward → softmax over classes
//        argmax → label via the stored vocabulary
//
// The engine never changes after construction and predicts
// through &self, so it can be shared between threads. To pick
// up a newer checkpoint while serving, EngineHandle builds a
// complete new engine and swaps it in.
//
// Reference: Burn Book §5 (Inference)

use std::{
    path::Path,
    sync::{Arc, PoisonError, RwLock},
};

use burn::{prelude::*, tensor::activation::softmax};

use crate::data::{batcher::stack_sequences, resampler::SequenceResampler};
use crate::domain::{keypoints::KeypointSequence, traits::LabelCodec, vocabulary::LabelVocabulary};
use crate::error::{LoadError, ShapeError};
use crate::infra::checkpoint::Checkpoint;
use crate::ml::model::SequenceClassifier;

/// Classifier output for one sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label:         String,
    pub index:         usize,
    /// Probability of `label`
    pub confidence:    f32,
    /// One probability per class, in vocabulary order
    pub probabilities: Vec<f32>,
}

impl Prediction {
    /// The `k` most probable class indices with their probabilities, best first.
    pub fn top_k(&self, k: usize) -> Vec<(usize, f32)> {
        let mut ranked: Vec<(usize, f32)> = self.probabilities.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(k);
        ranked
    }
}

pub struct InferenceEngine<B: Backend> {
    model:       SequenceClassifier<B>,
    vocabulary:  LabelVocabulary,
    resampler:   SequenceResampler,
    input_width: usize,
    device:      B::Device,
}

impl<B: Backend> InferenceEngine<B> {
    /// Read the checkpoint file at `path` and build an engine from it.
    pub fn from_checkpoint(path: impl AsRef<Path>, device: B::Device) -> Result<Self, LoadError> {
        let checkpoint = Checkpoint::read(path)?;
        Self::from_loaded(&checkpoint, device)
    }

    /// Build an engine from an already decoded checkpoint.
    pub fn from_loaded(checkpoint: &Checkpoint, device: B::Device) -> Result<Self, LoadError> {
        let model      = checkpoint.load_model::<B>(&device)?;
        let vocabulary = checkpoint.vocabulary()?;
        let meta       = checkpoint.metadata();

        tracing::info!(
            "Inference engine ready: {} classes, input_width={}, seq_len={}",
            vocabulary.len(),
            meta.input_width,
            meta.seq_len,
        );

        Ok(Self {
            model,
            vocabulary,
            resampler: SequenceResampler::new(meta.seq_len),
            input_width: meta.input_width,
            device,
        })
    }

    pub fn input_width(&self) -> usize {
        self.input_width
    }

    pub fn seq_len(&self) -> usize {
        self.resampler.target_len()
    }

    pub fn vocabulary(&self) -> &LabelVocabulary {
        &self.vocabulary
    }

    /// The loaded classifier, e.g. for exporting its weights elsewhere.
    pub fn model(&self) -> &SequenceClassifier<B> {
        &self.model
    }

    /// Check the width and resample to `seq_len`: the exact model input.
    pub fn prepare(&self, sequence: &KeypointSequence) -> Result<KeypointSequence, ShapeError> {
        if sequence.width() != self.input_width {
            return Err(ShapeError::WidthMismatch {
                expected: self.input_width,
                actual:   sequence.width(),
            });
        }
        Ok(self.resampler.resample(sequence))
    }

    /// Raw class scores for one sequence.
    pub fn logits(&self, sequence: &KeypointSequence) -> Result<Tensor<B, 2>, ShapeError> {
        let prepared = self.prepare(sequence)?;
        let input    = stack_sequences::<B, _>([&prepared], &self.device);
        Ok(self.model.forward(input))
    }

    pub fn predict(&self, sequence: &KeypointSequence) -> Result<Prediction, ShapeError> {
        let probabilities: Vec<f32> = softmax(self.logits(sequence)?, 1)
            .into_data()
            .iter::<f32>()
            .collect();

        // First maximum wins on ties
        let (index, confidence) = probabilities
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (i, p)| if p > best.1 { (i, p) } else { best });

        // The head has exactly one output per vocabulary entry.
        let label = self.vocabulary.labels()[index].clone();

        tracing::debug!("Predicted '{}' ({:.3})", label, confidence);
        Ok(Prediction { label, index, confidence, probabilities })
    }

    /// Same as `predict`, for callers holding frames as nested rows.
    pub fn predict_frames(&self, frames: &[Vec<f32>]) -> Result<Prediction, ShapeError> {
        self.predict(&KeypointSequence::from_rows(frames)?)
    }

    /// Top `k` (label, probability) pairs for a prediction from this engine.
    pub fn top_labels<'a>(&'a self, prediction: &Prediction, k: usize) -> Vec<(&'a str, f32)> {
        prediction
            .top_k(k)
            .into_iter()
            .filter_map(|(i, p)| self.vocabulary.decode(i).ok().map(|label| (label, p)))
            .collect()
    }
}

// ─── Hot reload ───────────────────────────────────────────────────────────────
/// Shares one engine between threads and swaps in a new one on reload.
/// Callers holding the previous `Arc` finish with the engine they started on.
pub struct EngineHandle<B: Backend> {
    current: RwLock<Arc<InferenceEngine<B>>>,
}

impl<B: Backend> EngineHandle<B> {
    pub fn new(engine: InferenceEngine<B>) -> Self {
        Self { current: RwLock::new(Arc::new(engine)) }
    }

    pub fn current(&self) -> Arc<InferenceEngine<B>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn predict(&self, sequence: &KeypointSequence) -> Result<Prediction, ShapeError> {
        self.current().predict(sequence)
    }

    /// Build a new engine from `path`; the old one stays in place on failure.
    pub fn reload(&self, path: impl AsRef<Path>, device: B::Device) -> Result<(), LoadError> {
        let engine = InferenceEngine::from_checkpoint(path, device)?;
        self.replace(engine);
        Ok(())
    }

    /// Swap in `engine`, returning the one it replaced.
    pub fn replace(&self, engine: InferenceEngine<B>) -> Arc<InferenceEngine<B>> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(engine))
    }
}
