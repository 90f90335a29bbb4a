// ============================================================
// Layer 3 — Keypoint Domain Types
// ============================================================
// A gesture recording is a time-ordered list of frames. Each
// frame is every detected landmark flattened into one row:
//
//   frame t = [x0, y0, z0, x1, y1, z1, ..., xK, yK, zK]
//
// so a recording is a (frames, D) matrix where D is the feature
// width. D is fixed for a whole corpus and must equal the input
// width of the classifier; the number of frames varies per sample.
//
// The matrix is stored as an ndarray::Array2<f32> so resampling
// and augmentation can select rows and strided columns without
// hand-written index arithmetic.
//
// Reference: ndarray documentation (Array2, Axis, select)

use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut2, Axis};

use crate::error::ShapeError;

/// An ordered sequence of flattened keypoint frames, shape (frames, width).
#[derive(Debug, Clone, PartialEq)]
pub struct KeypointSequence {
    frames: Array2<f32>,
}

impl KeypointSequence {
    /// Wrap an existing (frames, width) matrix.
    /// Fails if the width is zero — such a sequence can never match a model.
    pub fn new(frames: Array2<f32>) -> Result<Self, ShapeError> {
        if frames.ncols() == 0 {
            return Err(ShapeError::ZeroWidth);
        }
        Ok(Self { frames })
    }

    /// `frames` all-zero frames of the given width.
    pub fn zeros(frames: usize, width: usize) -> Result<Self, ShapeError> {
        Self::new(Array2::zeros((frames, width)))
    }

    /// Build from nested rows, e.g. a JSON list of frames.
    /// Every row must have the same length as the first one.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self, ShapeError> {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if width == 0 {
            return Err(ShapeError::ZeroWidth);
        }

        let mut flat = Vec::with_capacity(rows.len() * width);
        for (frame, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(ShapeError::RaggedFrame { frame, expected: width, actual: row.len() });
            }
            flat.extend_from_slice(row);
        }

        Self::from_flat(width, flat)
    }

    /// Build from a row-major flat buffer of `frames * width` values.
    pub fn from_flat(width: usize, data: Vec<f32>) -> Result<Self, ShapeError> {
        if width == 0 {
            return Err(ShapeError::ZeroWidth);
        }
        // The only way the shape can disagree with the buffer is a trailing partial frame.
        let frames    = data.len() / width;
        let remainder = data.len() % width;
        let array = Array2::from_shape_vec((frames, width), data).map_err(|_| ShapeError::RaggedFrame {
            frame:    frames,
            expected: width,
            actual:   remainder,
        })?;
        Self::new(array)
    }

    /// Number of frames (time steps).
    pub fn len(&self) -> usize {
        self.frames.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.nrows() == 0
    }

    /// Number of values per frame (D).
    pub fn width(&self) -> usize {
        self.frames.ncols()
    }

    pub fn frame(&self, index: usize) -> ArrayView1<'_, f32> {
        self.frames.row(index)
    }

    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.frames.view()
    }

    pub fn view_mut(&mut self) -> ArrayViewMut2<'_, f32> {
        self.frames.view_mut()
    }

    /// Gather frames by index; repeated indices repeat frames.
    /// Every index must be < len(). The width is preserved.
    pub fn select_frames(&self, indices: &[usize]) -> Self {
        Self { frames: self.frames.select(Axis(0), indices) }
    }

    /// An all-zero sequence of `frames` frames with this sequence's width.
    pub fn zeros_like(&self, frames: usize) -> Self {
        Self { frames: Array2::zeros((frames, self.width())) }
    }

    /// All values in frame-major order, ready to be stacked into a tensor.
    pub fn to_flat_vec(&self) -> Vec<f32> {
        self.frames.iter().copied().collect()
    }
}

/// One manifest row after loading: the recording plus its class.
/// Immutable once built; the label index comes from the shared vocabulary.
#[derive(Debug, Clone)]
pub struct LabeledSample {
    /// The raw, not yet resampled recording
    pub sequence: KeypointSequence,

    /// Vocabulary index of the manifest label
    pub label_index: usize,
}
