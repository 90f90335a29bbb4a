// ============================================================
// Layer 4 — Keypoint Sequence Dataset
// ============================================================
// Turns a manifest into training items for Burn's DataLoader.
//
// Opening a dataset loads and checks EVERY row up front:
//   - the array file must exist and decode        → DataError
//   - its feature width must match the dataset    → DataError
//   - its label must be in the vocabulary         → LookupError
// so a broken corpus fails before the first epoch instead of
// half-way through training.
//
// Retrieving item i then only does the cheap, per-epoch work:
//   raw sequence → resample to T frames → (optionally) augment
// and returns the sequence with its integer label.
//
// Reference: Burn Book §4 (Datasets)

use burn::data::dataset::Dataset;
use rand::Rng;

use crate::data::{
    arrays::load_keypoints,
    augmentor::Augmentor,
    manifest::Manifest,
    resampler::SequenceResampler,
};
use crate::domain::{
    keypoints::{KeypointSequence, LabeledSample},
    traits::LabelCodec,
};
use crate::error::{DataError, DatasetError};

/// One resampled (and possibly augmented) sample: shape (T, D) plus label.
#[derive(Debug, Clone)]
pub struct SequenceItem {
    pub keypoints: KeypointSequence,
    pub label:     usize,
}

pub struct SequenceDataset {
    samples:     Vec<LabeledSample>,
    resampler:   SequenceResampler,
    augmentor:   Option<Augmentor>,
    input_width: usize,
}

impl SequenceDataset {
    /// Load every row of `manifest`.
    ///
    /// `expected_width` is the feature width every array must have.
    /// Pass `None` for the training set to take it from the first row;
    /// pass the training width for the validation set.
    pub fn open(
        manifest:       &Manifest,
        codec:          &impl LabelCodec,
        seq_len:        usize,
        expected_width: Option<usize>,
    ) -> Result<Self, DatasetError> {
        let mut samples     = Vec::with_capacity(manifest.len());
        let mut input_width = expected_width;

        for row in manifest.rows() {
            let path     = manifest.resolve(row);
            let sequence = load_keypoints(&path)?;

            let expected = *input_width.get_or_insert(sequence.width());
            if sequence.width() != expected {
                return Err(DataError::WidthMismatch {
                    path,
                    expected,
                    actual: sequence.width(),
                }.into());
            }

            let label_index = codec.encode(&row.label)?;
            samples.push(LabeledSample { sequence, label_index });
        }

        let input_width = input_width.ok_or(DataError::EmptyManifest {
            path: manifest.path().to_path_buf(),
        })?;

        tracing::info!(
            "Loaded {} samples from '{}' (width {}, resampled to {} frames)",
            samples.len(),
            manifest.path().display(),
            input_width,
            seq_len,
        );

        Ok(Self {
            samples,
            resampler: SequenceResampler::new(seq_len),
            augmentor: None,
            input_width,
        })
    }

    /// Enable training-time augmentation for every retrieved item.
    pub fn with_augmentation(mut self, augmentor: Augmentor) -> Self {
        self.augmentor = Some(augmentor);
        self
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Feature width D shared by every sample.
    pub fn input_width(&self) -> usize {
        self.input_width
    }

    pub fn seq_len(&self) -> usize {
        self.resampler.target_len()
    }

    pub fn samples(&self) -> &[LabeledSample] {
        &self.samples
    }

    /// Resampled (and augmented, if enabled) item `index`.
    pub fn item(&self, index: usize) -> Result<SequenceItem, DataError> {
        self.item_with_rng(index, &mut rand::thread_rng())
    }

    /// Same as `item`, drawing augmentation randomness from `rng`.
    pub fn item_with_rng<R: Rng + ?Sized>(
        &self,
        index: usize,
        rng:   &mut R,
    ) -> Result<SequenceItem, DataError> {
        let sample = self.samples.get(index).ok_or(DataError::IndexOutOfBounds {
            index,
            len: self.samples.len(),
        })?;

        let resampled = self.resampler.resample(&sample.sequence);
        let keypoints = match &self.augmentor {
            Some(aug) => aug.augment(&resampled, rng),
            None      => resampled,
        };

        Ok(SequenceItem { keypoints, label: sample.label_index })
    }
}

impl Dataset<SequenceItem> for SequenceDataset {
    fn get(&self, index: usize) -> Option<SequenceItem> {
        self.item(index).ok()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
