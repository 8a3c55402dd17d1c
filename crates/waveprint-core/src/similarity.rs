//! Sliding-window alignment search between two fingerprint buffers.

use tracing::debug;

use crate::types::{FingerprintProperties, FingerprintSimilarity};

/// Scores the best temporal overlap between two fingerprint buffers of
/// identical frame layout.
///
/// The length precondition is enforced by
/// [`compare_fingerprints`](crate::compare_fingerprints); the computer
/// itself assumes both buffers hold the same number of frames. Inputs
/// are read-only, so the same two buffers may be compared concurrently
/// from multiple threads.
pub struct SimilarityComputer {
    properties: FingerprintProperties,
}

impl SimilarityComputer {
    /// Create a computer for fingerprints extracted with `properties`.
    pub fn new(properties: FingerprintProperties) -> Self {
        Self { properties }
    }

    /// Find the frame offset that maximizes the matched-bit count.
    ///
    /// Every offset at which at least one frame pair overlaps is
    /// evaluated, symmetric around zero. Ranking is by raw matched-bit
    /// count; ties prefer the smaller absolute offset, and a tie
    /// between an offset and its negation prefers the non-negative
    /// one. Degenerate (empty) buffers yield the sentinel result.
    pub fn compare(&self, a: &[u8], b: &[u8]) -> FingerprintSimilarity {
        let bytes_per_frame = self.properties.bytes_per_frame();
        let bits_per_frame = self.properties.num_robust_points_per_frame;
        let num_frames = a.len() / bytes_per_frame;

        if num_frames == 0 {
            return FingerprintSimilarity::default();
        }

        let mut best_offset = 0isize;
        let mut best_matched = -1i64;
        let mut best_compared = 0i64;

        for offset in offset_scan(num_frames) {
            let (matched, compared) = self.matched_bits(a, b, offset);
            if matched > best_matched {
                best_matched = matched;
                best_compared = compared;
                best_offset = offset;
            }
        }

        debug!(
            "Best alignment at frame offset {} ({} of {} bits matched)",
            best_offset, best_matched, best_compared
        );

        FingerprintSimilarity {
            most_similar_frame_position: best_offset as i32 * bits_per_frame as i32,
            score: best_matched as f32,
            similarity: best_matched as f32 / best_compared as f32,
        }
    }

    /// Matched and compared bit counts when frame `f` of `a` is paired
    /// with frame `f + offset` of `b`.
    fn matched_bits(&self, a: &[u8], b: &[u8], offset: isize) -> (i64, i64) {
        let bytes_per_frame = self.properties.bytes_per_frame();
        let bits_per_frame = self.properties.num_robust_points_per_frame;
        let num_frames = (a.len() / bytes_per_frame) as isize;

        let mut matched = 0i64;
        let mut compared = 0i64;

        let first = 0.max(-offset);
        let last = num_frames.min(num_frames - offset);
        for frame_a in first..last {
            let frame_b = frame_a + offset;
            let pa = frame_a as usize * bytes_per_frame;
            let pb = frame_b as usize * bytes_per_frame;

            let mut remaining = bits_per_frame;
            for byte in 0..bytes_per_frame {
                let bits = remaining.min(8);
                let mask = 0xFFu8 << (8 - bits);
                let differing = ((a[pa + byte] ^ b[pb + byte]) & mask).count_ones();
                matched += bits as i64 - differing as i64;
                compared += bits as i64;
                remaining -= bits;
            }
        }

        (matched, compared)
    }
}

/// Offsets in the order `0, 1, -1, 2, -2, …`; combined with strict
/// improvement in the scan this realizes the tie-break policy.
fn offset_scan(num_frames: usize) -> impl Iterator<Item = isize> {
    let max = num_frames as isize - 1;
    std::iter::once(0).chain((1..=max).flat_map(|o| [o, -o]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn computer() -> SimilarityComputer {
        SimilarityComputer::new(FingerprintProperties::default())
    }

    #[test]
    fn identical_buffers_align_at_zero() {
        let data = vec![0b1010_0110u8, 0b0011_1100, 0b1111_0000, 0b0101_0101];
        let result = computer().compare(&data, &data);

        assert_eq!(result.most_similar_frame_position, 0);
        assert_eq!(result.score, 32.0);
        assert_eq!(result.similarity, 1.0);
    }

    #[test]
    fn shifted_buffer_is_found_at_its_offset() {
        // b carries a's content two frames later
        let a = vec![0b1010_0110u8, 0b0011_1100, 0b1111_0000, 0b0101_0101, 0b1001_1001, 0b0110_0110];
        let mut b = vec![0u8; a.len()];
        b[2..].copy_from_slice(&a[..4]);

        let props = FingerprintProperties::default();
        let result = computer().compare(&a, &b);

        let frame_offset =
            result.most_similar_frame_position / props.num_robust_points_per_frame as i32;
        assert_eq!(frame_offset, 2);
        // all four overlapping frames match exactly
        assert_eq!(result.score, 32.0);
        assert_eq!(result.similarity, 1.0);
    }

    #[test]
    fn negative_offsets_are_searched() {
        // a's tail appears two frames earlier in b
        let a = vec![0x00u8, 0x00, 0xFF, 0xFF, 0xFF, 0xFF];
        let b = vec![0xFFu8, 0xFF, 0xFF, 0xFF, 0x00, 0x00];

        let props = FingerprintProperties::default();
        let result = computer().compare(&a, &b);

        let frame_offset =
            result.most_similar_frame_position / props.num_robust_points_per_frame as i32;
        assert_eq!(frame_offset, -2);
        assert_eq!(result.score, 32.0);
        assert_eq!(result.similarity, 1.0);
    }

    #[test]
    fn ties_prefer_the_smallest_absolute_offset() {
        // nothing matches at any offset: every offset ties at zero
        let a = vec![0x00u8; 4];
        let b = vec![0xFFu8; 4];
        let result = computer().compare(&a, &b);

        assert_eq!(result.most_similar_frame_position, 0);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.similarity, 0.0);
    }

    #[test]
    fn empty_buffers_yield_sentinel() {
        let result = computer().compare(&[], &[]);
        assert_eq!(result, FingerprintSimilarity::default());
        assert!(result.is_invalid());
    }

    #[test]
    fn similarity_normalizes_by_compared_bits() {
        // single frames differing in exactly one bit
        let a = [0b1000_0000u8];
        let b = [0b0000_0000u8];
        let result = computer().compare(&a, &b);

        assert_eq!(result.most_similar_frame_position, 0);
        assert_eq!(result.score, 7.0);
        assert!((result.similarity - 7.0 / 8.0).abs() < 1e-6);
    }

    #[test]
    fn comparison_does_not_mutate_inputs() {
        let a = vec![0xA5u8, 0x5A, 0xC3];
        let b = vec![0x3Cu8, 0x99, 0x66];
        let (a_before, b_before) = (a.clone(), b.clone());

        let _ = computer().compare(&a, &b);
        assert_eq!(a, a_before);
        assert_eq!(b, b_before);
    }
}
