// ============================================================
// Layer 2 — Inspect Use Case
// ============================================================
// Reads a checkpoint without building the model and reports
// what downstream tools need to feed it: the input width,
// the sequence length and the label order.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::predict_use_case::resolve_checkpoint;
use crate::infra::checkpoint::{Checkpoint, CheckpointMetadata};

pub fn inspect_checkpoint(path: &Path) -> Result<CheckpointMetadata> {
    let path = resolve_checkpoint(path);
    let checkpoint = Checkpoint::read(&path)
        .with_context(|| format!("Cannot read checkpoint '{}'", path.display()))?;
    Ok(checkpoint.metadata().clone())
}
