// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Used when a run is given only a training manifest: the rows
// are shuffled and split into two sets:
//   - Training set:   used to update model weights
//   - Validation set: used to pick the best checkpoint
//
// Why shuffle before splitting?
//   Manifests are usually grouped by label (all "hello" clips,
//   then all "thanks" clips...). Without shuffling the validation
//   set would only contain the last few classes.
//
// The shuffle is seeded, so re-running with the same seed gives
// the same split and validation accuracy stays comparable
// between runs.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.
//
// Reference: rand crate documentation

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` with `seed` and split into (train, validation).
///
/// # Arguments
/// * `samples`        - All available samples (consumed by this function)
/// * `train_fraction` - Proportion for training, e.g. 0.8 = 80%
/// * `seed`           - Shuffle seed
pub fn split_train_val<T>(mut samples: Vec<T>, train_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    // e.g. 100 samples * 0.8 = 80 → first 80 are training
    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction).round() as usize;
    let split_at = split_at.min(total);

    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation ({}% / {}%)",
        samples.len(),
        val.len(),
        (samples.len() * 100) / total.max(1),
        (val.len()     * 100) / total.max(1),
    );

    (samples, val)
}
