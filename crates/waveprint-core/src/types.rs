//! Core types for fingerprint extraction and comparison.

use serde::{Deserialize, Serialize};

/// Process-wide fingerprinting configuration.
///
/// Constructed once at startup and passed by reference to every
/// component that needs it. Read-only after construction; concurrent
/// reads are safe. Two fingerprints are only comparable when they were
/// extracted with identical properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintProperties {
    /// Audio sample rate the extractor expects, in Hz.
    pub sample_rate: u32,
    /// Fingerprint frames generated per second of audio.
    pub fps: u32,
    /// Time-domain samples per analysis frame (power of two).
    pub sample_size_per_frame: usize,
    /// Robust-point bits encoded per frame.
    pub num_robust_points_per_frame: usize,
}

impl Default for FingerprintProperties {
    fn default() -> Self {
        Self {
            sample_rate: 10240,
            fps: 5,
            sample_size_per_frame: 2048,
            num_robust_points_per_frame: 8,
        }
    }
}

impl FingerprintProperties {
    /// Samples advanced between consecutive analysis frames.
    pub fn hop_size(&self) -> usize {
        (self.sample_rate / self.fps) as usize
    }

    /// Packed bytes per encoded frame.
    pub fn bytes_per_frame(&self) -> usize {
        (self.num_robust_points_per_frame + 7) / 8
    }
}

/// A bit-packed audio fingerprint.
///
/// Owns its byte buffer exclusively; the buffer is released when the
/// fingerprint is dropped. Produced only by extraction, consumed by
/// comparison or serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    data: Vec<u8>,
}

impl Fingerprint {
    pub(crate) fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// The packed fingerprint bytes, frame-major, most significant
    /// feature first within each frame.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Fingerprint size in bytes. Always a whole number of frames.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when no frames were encoded.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of encoded frames under the given properties.
    pub fn frame_count(&self, properties: &FingerprintProperties) -> usize {
        self.data.len() / properties.bytes_per_frame()
    }
}

/// Result of comparing two fingerprints.
///
/// A comparison of well-formed fingerprints always completes; the
/// sentinel defaults below are only reported for non-comparable or
/// degenerate inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FingerprintSimilarity {
    /// Best-aligned position in robust-point units; `i32::MIN` when no
    /// alignment was evaluated.
    pub most_similar_frame_position: i32,
    /// Raw count of matched robust-point bits at the best offset;
    /// `-1.0` for non-comparable inputs.
    pub score: f32,
    /// Matched fraction of the compared bits at the best offset, in
    /// `[0.0, 1.0]`; `-1.0` for non-comparable inputs.
    pub similarity: f32,
}

impl Default for FingerprintSimilarity {
    fn default() -> Self {
        Self {
            most_similar_frame_position: i32::MIN,
            score: -1.0,
            similarity: -1.0,
        }
    }
}

impl FingerprintSimilarity {
    /// Playback-time offset of the best alignment, in seconds.
    pub fn most_similar_start_time(&self, properties: &FingerprintProperties) -> f32 {
        self.most_similar_frame_position as f32
            / properties.num_robust_points_per_frame as f32
            / properties.fps as f32
    }

    /// True when the inputs could not be compared.
    pub fn is_invalid(&self) -> bool {
        self.similarity < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_properties_are_contiguous_frames() {
        let props = FingerprintProperties::default();
        assert_eq!(props.hop_size(), props.sample_size_per_frame);
        assert_eq!(props.bytes_per_frame(), 1);
    }

    #[test]
    fn sentinel_defaults() {
        let result = FingerprintSimilarity::default();
        assert_eq!(result.most_similar_frame_position, i32::MIN);
        assert_eq!(result.score, -1.0);
        assert_eq!(result.similarity, -1.0);
        assert!(result.is_invalid());
    }

    #[test]
    fn start_time_converts_robust_point_position() {
        let props = FingerprintProperties::default();
        // one second of audio is fps frames, each num_robust_points wide
        let position = (props.fps as usize * props.num_robust_points_per_frame) as i32;
        let result = FingerprintSimilarity {
            most_similar_frame_position: position,
            score: 0.0,
            similarity: 0.0,
        };
        assert!((result.most_similar_start_time(&props) - 1.0).abs() < 1e-6);
    }
}
