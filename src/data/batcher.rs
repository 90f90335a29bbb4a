// ============================================================
// Layer 4 — Sequence Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<SequenceItem>
// into tensors the classifier can consume.
//
// How batching works here:
//   Input:  N items, each a (T, D) keypoint matrix + a label
//   Output: keypoints [N, T, D] (float), labels [N] (int)
//
//   All items were resampled to the same T by the dataset, so
//   stacking is just concatenating the frame-major buffers:
//   [s1_f1, s1_f2, ..., s1_fT, s2_f1, ..., sN_fT] → [N, T, D]
//
// The same stacking function is used by the InferenceEngine so a
// query reaches the model laid out exactly like training data.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::SequenceItem;
use crate::domain::keypoints::KeypointSequence;

// ─── SequenceBatch ────────────────────────────────────────────────────────────
/// A batch of resampled sequences ready for the forward pass.
#[derive(Debug, Clone)]
pub struct SequenceBatch<B: Backend> {
    /// Keypoints — shape: [batch_size, seq_len, input_width]
    pub keypoints: Tensor<B, 3>,

    /// Class indices — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

// ─── SequenceBatcher ──────────────────────────────────────────────────────────
/// Holds the target device so tensors are created on the right GPU/CPU.
#[derive(Clone, Debug)]
pub struct SequenceBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SequenceBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

/// Stack equally shaped sequences into one [N, T, D] tensor.
/// An empty slice gives a [0, 0, 0] tensor.
pub fn stack_sequences<'a, B, I>(sequences: I, device: &B::Device) -> Tensor<B, 3>
where
    B: Backend,
    I: IntoIterator<Item = &'a KeypointSequence>,
{
    let mut flat  = Vec::new();
    let mut count = 0usize;
    let mut shape = (0usize, 0usize);

    for seq in sequences {
        shape = (seq.len(), seq.width());
        flat.extend(seq.view().iter().copied());
        count += 1;
    }

    Tensor::<B, 3>::from_data(TensorData::new(flat, [count, shape.0, shape.1]), device)
}

impl<B: Backend> Batcher<SequenceItem, SequenceBatch<B>> for SequenceBatcher<B> {
    fn batch(&self, items: Vec<SequenceItem>) -> SequenceBatch<B> {
        let keypoints = stack_sequences::<B, _>(items.iter().map(|i| &i.keypoints), &self.device);

        let labels: Vec<i32> = items.iter().map(|i| i.label as i32).collect();
        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        SequenceBatch { keypoints, labels }
    }
}
