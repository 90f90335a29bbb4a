// ============================================================
// Layer 4 — Manifest Reader
// ============================================================
// A manifest is a CSV file with one row per recorded sample:
//
//   file,label
//   clips/hello_001.npz,hello
//   clips/thanks_004.npz,thanks
//
// Extra columns are ignored. Relative `file` paths are resolved
// against the directory the manifest lives in, so a dataset folder
// can be moved around without rewriting its manifest.
//
// Reference: csv crate documentation (Reader, deserialize)

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::data::splitter::split_train_val;
use crate::error::DataError;

/// One `file,label` row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestRow {
    pub file:  PathBuf,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct Manifest {
    path:     PathBuf,
    base_dir: PathBuf,
    rows:     Vec<ManifestRow>,
}

impl Manifest {
    /// Parse a manifest CSV. Fails on a missing file, a malformed row,
    /// or a manifest without any rows.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(DataError::MissingFile { path });
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|source| DataError::Manifest { path: path.clone(), source })?;

        let mut rows = Vec::new();
        for row in reader.deserialize::<ManifestRow>() {
            let row = row.map_err(|source| DataError::Manifest { path: path.clone(), source })?;
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(DataError::EmptyManifest { path });
        }

        tracing::debug!("Read {} manifest rows from '{}'", rows.len(), path.display());
        Ok(Self::from_rows(path, rows))
    }

    /// Build a manifest from rows already in memory.
    /// `path` only decides how relative file paths are resolved.
    pub fn from_rows(path: impl Into<PathBuf>, rows: Vec<ManifestRow>) -> Self {
        let path = path.into();
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self { path, base_dir, rows }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> &[ManifestRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every label string, in row order (duplicates included).
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.label.as_str())
    }

    /// Absolute-or-cwd-relative path of a row's array file.
    pub fn resolve(&self, row: &ManifestRow) -> PathBuf {
        if row.file.is_absolute() {
            row.file.clone()
        } else {
            self.base_dir.join(&row.file)
        }
    }

    /// Shuffle rows with a fixed seed and split into (train, validation).
    /// Both halves keep this manifest's base directory.
    pub fn split(self, train_fraction: f64, seed: u64) -> (Manifest, Manifest) {
        let (train, val) = split_train_val(self.rows, train_fraction, seed);
        (
            Manifest { path: self.path.clone(), base_dir: self.base_dir.clone(), rows: train },
            Manifest { path: self.path, base_dir: self.base_dir, rows: val },
        )
    }
}
