// ============================================================
// Layer 4 — Sequence Resampler
// ============================================================
// Gestures are recorded at different speeds, so samples have
// different frame counts. The classifier needs a fixed number of
// frames T. This module maps any length L onto exactly T frames.
//
// How it works (nearest-neighbour in time, never blending):
//
//   L == T   → returned unchanged
//   L >= 2   → pick T frame indices evenly spaced over [0, L-1]
//              and rounded to the nearest integer:
//                  idx_i = round(i * (L-1) / (T-1)),  i = 0..T
//              Downsampling drops frames, upsampling repeats them.
//   L == 1   → the single frame is repeated T times
//   L == 0   → T all-zero frames (there is nothing to repeat)
//
// Example, L = 5 → T = 3:   indices [0, 2, 4]
// Example, L = 2 → T = 4:   indices [0, 0, 1, 1]
//
// The index rule has no randomness, so the same sequence always
// resamples to bit-identical output. Training (SequenceDataset)
// and inference (InferenceEngine) both call this exact code.

use crate::domain::keypoints::KeypointSequence;

/// Evenly spaced, rounded, non-decreasing frame indices.
/// Requires `len >= 1`.
pub fn resample_indices(len: usize, target: usize) -> Vec<usize> {
    if target == 0 || len == 0 {
        return Vec::new();
    }
    if target == 1 {
        return vec![0];
    }

    let last = (len - 1) as f64;
    let step = (target - 1) as f64;
    (0..target)
        .map(|i| {
            let idx = (i as f64 * last / step).round() as usize;
            idx.min(len - 1)
        })
        .collect()
}

/// Maps variable-length keypoint sequences to a fixed length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceResampler {
    target_len: usize,
}

impl SequenceResampler {
    pub fn new(target_len: usize) -> Self {
        Self { target_len }
    }

    pub fn target_len(&self) -> usize {
        self.target_len
    }

    /// Resample `seq` to exactly `target_len` frames, same width.
    pub fn resample(&self, seq: &KeypointSequence) -> KeypointSequence {
        let len = seq.len();

        if len == self.target_len {
            return seq.clone();
        }
        if len == 0 {
            return seq.zeros_like(self.target_len);
        }
        if len == 1 {
            return seq.select_frames(&vec![0; self.target_len]);
        }

        seq.select_frames(&resample_indices(len, self.target_len))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    /// Frame i holds the value i in every column, so each output
    /// value tells us which input frame it was copied from.
    fn numbered(frames: usize, width: usize) -> KeypointSequence {
        let data = (0..frames)
            .flat_map(|f| std::iter::repeat(f as f32).take(width))
            .collect();
        KeypointSequence::from_flat(width, data).unwrap()
    }

    fn source_frames(seq: &KeypointSequence) -> Vec<usize> {
        (0..seq.len()).map(|i| seq.frame(i)[0] as usize).collect()
    }

    #[test]
    fn test_equal_length_is_identity() {
        let seq = numbered(20, 4);
        assert_eq!(SequenceResampler::new(20).resample(&seq), seq);
    }

    #[test]
    fn test_known_indices() {
        assert_eq!(resample_indices(5, 3), vec![0, 2, 4]);
        assert_eq!(resample_indices(2, 4), vec![0, 0, 1, 1]);
        assert_eq!(resample_indices(40, 1), vec![0]);
    }

    #[test]
    fn test_endpoints_are_first_and_last_frame() {
        let idx = resample_indices(40, 20);
        assert_eq!(idx.len(), 20);
        assert_eq!(idx[0], 0);
        assert_eq!(idx[19], 39);
    }

    #[test]
    fn test_output_reuses_rows_in_order() {
        for len in 2..50 {
            for target in [1, 7, 20, 64] {
                let seq = numbered(len, 3);
                let out = SequenceResampler::new(target).resample(&seq);
                assert_eq!(out.len(), target);
                assert_eq!(out.width(), 3);

                let picked = source_frames(&out);
                assert!(picked.windows(2).all(|w| w[0] <= w[1]), "L={len} T={target}");
                for i in 0..out.len() {
                    let src = picked[i];
                    assert!(src < len);
                    // a whole row copied verbatim, nothing blended
                    assert_eq!(out.frame(i), seq.frame(src));
                }
            }
        }
    }

    #[test]
    fn test_single_frame_is_repeated() {
        let seq = KeypointSequence::from_rows(&[vec![0.25, 0.5, 0.75]]).unwrap();
        let out = SequenceResampler::new(8).resample(&seq);
        assert_eq!(out.len(), 8);
        for i in 0..8 {
            assert_eq!(out.frame(i), seq.frame(0));
        }
    }

    #[test]
    fn test_empty_sequence_gives_zero_frames() {
        let seq = KeypointSequence::zeros(0, 6).unwrap();
        let out = SequenceResampler::new(16).resample(&seq);
        assert_eq!(out.len(), 16);
        assert_eq!(out.width(), 6);
        assert!(out.to_flat_vec().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_resampling_is_deterministic() {
        let data: Vec<f32> = (0..37 * 5).map(|i| (i as f32 * 0.37).sin()).collect();
        let seq = KeypointSequence::from_flat(5, data).unwrap();
        let r = SequenceResampler::new(64);
        let a = r.resample(&seq).to_flat_vec();
        let b = r.resample(&seq).to_flat_vec();
        let a_bits: Vec<u32> = a.iter().map(|v| v.to_bits()).collect();
        let b_bits: Vec<u32> = b.iter().map(|v| v.to_bits()).collect();
        assert_eq!(a_bits, b_bits);
    }
}
