// ============================================================
// Layer 4 — Keypoint Array Loader
// ============================================================
// Reads one recorded sample from disk into a KeypointSequence.
//
// Supported formats:
//   .npz  — NumPy archive holding an array named `keypoints`
//           (numpy stores it as `keypoints.npy` inside the zip)
//   .npy  — a bare NumPy array
//
// The array must be 2-D, shape (frames, D). Both float32 and
// float64 arrays are accepted; float64 is narrowed to f32.
//
// Every failure is a DataError naming the offending file, and
// nothing is skipped: a broken sample stops the run.
//
// Reference: ndarray-npy documentation (NpzReader, ReadNpyExt)

use std::fs::File;
use std::path::Path;

use ndarray::{ArrayD, Ix2, IxDyn, OwnedRepr};
use ndarray_npy::{NpzReader, ReadNpyExt};

use crate::domain::keypoints::KeypointSequence;
use crate::error::DataError;

/// Name of the array inside an .npz archive.
pub const KEYPOINTS_ARRAY: &str = "keypoints";

/// Load the keypoint array stored at `path`.
pub fn load_keypoints(path: &Path) -> Result<KeypointSequence, DataError> {
    if !path.exists() {
        return Err(DataError::MissingFile { path: path.to_path_buf() });
    }

    let array = match path.extension().and_then(|e| e.to_str()) {
        Some("npy") => read_npy(path)?,
        _           => read_npz(path)?,
    };

    into_sequence(path, array)
}

fn open(path: &Path) -> Result<File, DataError> {
    File::open(path).map_err(|source| DataError::Io { path: path.to_path_buf(), source })
}

fn read_npz(path: &Path) -> Result<ArrayD<f32>, DataError> {
    let mut npz = NpzReader::new(open(path)?)
        .map_err(|e| DataError::corrupt(path, e.to_string()))?;

    let names = npz.names().map_err(|e| DataError::corrupt(path, e.to_string()))?;
    let name = names
        .into_iter()
        .find(|n| n == KEYPOINTS_ARRAY || n.strip_suffix(".npy") == Some(KEYPOINTS_ARRAY))
        .ok_or_else(|| DataError::corrupt(path, format!("no array named `{KEYPOINTS_ARRAY}`")))?;

    match npz.by_name::<OwnedRepr<f32>, IxDyn>(&name) {
        Ok(array) => Ok(array),
        Err(_) => npz
            .by_name::<OwnedRepr<f64>, IxDyn>(&name)
            .map(|a| a.mapv(|v| v as f32))
            .map_err(|e| DataError::corrupt(path, e.to_string())),
    }
}

fn read_npy(path: &Path) -> Result<ArrayD<f32>, DataError> {
    match ArrayD::<f32>::read_npy(open(path)?) {
        Ok(array) => Ok(array),
        Err(_) => ArrayD::<f64>::read_npy(open(path)?)
            .map(|a| a.mapv(|v| v as f32))
            .map_err(|e| DataError::corrupt(path, e.to_string())),
    }
}

fn into_sequence(path: &Path, array: ArrayD<f32>) -> Result<KeypointSequence, DataError> {
    let shape = array.shape().to_vec();
    let array = array
        .into_dimensionality::<Ix2>()
        .map_err(|_| DataError::corrupt(path, format!("expected a 2-D (frames, D) array, got shape {shape:?}")))?;

    KeypointSequence::new(array).map_err(|e| DataError::corrupt(path, e.to_string()))
}
