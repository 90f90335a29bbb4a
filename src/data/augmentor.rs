// ============================================================
// Layer 4 — Training-time Augmentation
// ============================================================
// Produces a randomised variant of an already resampled sequence
// so the model sees slightly different versions of each sample
// every epoch. Two independent transforms:
//
//   1. Horizontal mirror (probability p, default 0.5)
//        x' = 1 - x   on every x channel
//      Coordinates are assumed normalised to [0, 1] and laid out
//      as interleaved (x, y, z) triples, so the x channel is every
//      `coords_per_landmark`-th column starting at column 0.
//      y and z are left untouched.
//
//      NOTE: this only flips coordinates. Left-hand landmarks stay
//      in the left-hand slots after the flip, so anatomically it is
//      an approximation of a true mirror, not the real thing.
//
//   2. Jitter (always, when augmentation is on)
//        v' = v + N(0, sigma)   for every value, sigma default 1e-3
//
// The input is never modified: augment() clones, then transforms
// the copy. Randomness comes from the caller's RNG so tests can
// use a seeded StdRng and training can use thread_rng().
//
// Reference: rand_distr documentation (Normal)

use ndarray::{Axis, Slice};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::domain::keypoints::KeypointSequence;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AugmentConfig {
    /// Chance of applying the horizontal mirror to a sample
    pub mirror_probability: f64,

    /// Standard deviation of the additive Gaussian jitter
    pub jitter_std: f32,

    /// Values per landmark: 3 for (x, y, z), 2 for (x, y)
    pub coords_per_landmark: usize,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            mirror_probability:  0.5,
            jitter_std:          1e-3,
            coords_per_landmark: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Augmentor {
    config: AugmentConfig,
    noise:  Normal<f32>,
}

impl Augmentor {
    pub fn new(config: AugmentConfig) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&config.mirror_probability) {
            return Err(ConfigError::invalid(
                "mirror_probability",
                format!("{} is not in [0, 1]", config.mirror_probability),
            ));
        }
        if config.coords_per_landmark == 0 {
            return Err(ConfigError::invalid("coords_per_landmark", "must be at least 1"));
        }
        if !(config.jitter_std >= 0.0) {
            return Err(ConfigError::invalid(
                "jitter_std",
                format!("{} is not a non-negative number", config.jitter_std),
            ));
        }
        let noise = Normal::new(0.0, config.jitter_std)
            .map_err(|e| ConfigError::invalid("jitter_std", e.to_string()))?;
        Ok(Self { config, noise })
    }

    pub fn config(&self) -> &AugmentConfig {
        &self.config
    }

    /// Return an augmented copy of `seq`; `seq` itself is untouched.
    pub fn augment<R: Rng + ?Sized>(&self, seq: &KeypointSequence, rng: &mut R) -> KeypointSequence {
        let mut out = seq.clone();

        if rng.gen_bool(self.config.mirror_probability) {
            mirror_x(&mut out, self.config.coords_per_landmark);
        }

        let noise = &self.noise;
        out.view_mut().mapv_inplace(|v| v + noise.sample(rng));
        out
    }
}

/// Flip the x channel in place: x' = 1 - x on columns 0, k, 2k, ...
pub fn mirror_x(seq: &mut KeypointSequence, coords_per_landmark: usize) {
    let mut view = seq.view_mut();
    view.slice_axis_mut(Axis(1), Slice::from(..).step_by(coords_per_landmark as isize))
        .mapv_inplace(|x| 1.0 - x);
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn sample() -> KeypointSequence {
        // 4 frames, 2 landmarks of (x, y, z)
        let data = (0..24).map(|i| i as f32 / 24.0).collect();
        KeypointSequence::from_flat(6, data).unwrap()
    }

    #[test]
    fn test_mirror_only_touches_x() {
        let original = sample();
        let mut flipped = original.clone();
        mirror_x(&mut flipped, 3);

        for f in 0..original.len() {
            for c in 0..original.width() {
                let before = original.frame(f)[c];
                let after  = flipped.frame(f)[c];
                if c % 3 == 0 {
                    assert!((after - (1.0 - before)).abs() < 1e-6);
                } else {
                    assert_eq!(after, before);
                }
            }
        }
    }

    #[test]
    fn test_always_mirror_without_jitter() {
        let aug = Augmentor::new(AugmentConfig {
            mirror_probability:  1.0,
            jitter_std:          0.0,
            coords_per_landmark: 3,
        }).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let out = aug.augment(&sample(), &mut rng);

        let mut expected = sample();
        mirror_x(&mut expected, 3);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_jitter_changes_values_not_shape() {
        let aug = Augmentor::new(AugmentConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let input = sample();

        let a = aug.augment(&input, &mut rng);
        let b = aug.augment(&input, &mut rng);

        assert_eq!(a.len(), input.len());
        assert_eq!(a.width(), input.width());
        assert_eq!(b.len(), input.len());
        assert_eq!(b.width(), input.width());
        assert_ne!(a.to_flat_vec(), b.to_flat_vec());
    }

    #[test]
    fn test_input_is_not_mutated() {
        let aug = Augmentor::new(AugmentConfig { mirror_probability: 1.0, ..Default::default() }).unwrap();
        let input = sample();
        let snapshot = input.clone();
        let _ = aug.augment(&input, &mut StdRng::seed_from_u64(1));
        assert_eq!(input, snapshot);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(Augmentor::new(AugmentConfig { mirror_probability: 1.5, ..Default::default() }).is_err());
        assert!(Augmentor::new(AugmentConfig { coords_per_landmark: 0, ..Default::default() }).is_err());
        assert!(Augmentor::new(AugmentConfig { jitter_std: -1.0, ..Default::default() }).is_err());
        assert!(Augmentor::new(AugmentConfig { jitter_std: f32::NAN, ..Default::default() }).is_err());
    }
}
