//! Waveprint - audio fingerprint extraction and similarity matching.
//!
//! This crate computes a compact binary fingerprint from raw PCM audio
//! and compares two fingerprints to measure acoustic similarity and
//! temporal alignment, enabling detection of repeated or duplicated
//! audio segments across recordings.
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────────┐    ┌─────────────────────┐    ┌────────────────────┐
//! │ PCM samples  │───▶│ Frame analysis      │───▶│ Robust-point       │
//! │ (16-bit)     │    │ (SpectralTransform) │    │ encoding           │
//! └──────────────┘    └─────────────────────┘    └─────────┬──────────┘
//!                                                          │
//!                                                          ▼
//! ┌──────────────────────┐    ┌──────────────────┐   ┌─────────────┐
//! │ FingerprintSimilarity│◀───│ Alignment search │◀──│ Fingerprint │
//! │ (offset, score)      │    │ (SimilarityComputer) │ (byte buffer)│
//! └──────────────────────┘    └──────────────────┘   └─────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use waveprint_core::{compare_fingerprints, extract_fingerprint_from_raw_file};
//!
//! fn main() -> waveprint_core::Result<()> {
//!     let original = extract_fingerprint_from_raw_file("clip.raw")?;
//!     let candidate = extract_fingerprint_from_raw_file("broadcast.raw")?;
//!
//!     let result = compare_fingerprints(&original, &candidate);
//!     println!("similarity: {}", result.similarity);
//!     Ok(())
//! }
//! ```
//!
//! The core is synchronous and self-contained: extraction is a pure
//! function of its input samples and the configured
//! [`FingerprintProperties`], and independent extractors or
//! comparisons may run fully in parallel.

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod extract;
pub mod fft;
pub mod similarity;
pub mod types;

use std::path::Path;

use tracing::info;

pub use error::{Error, Result};
pub use extract::FingerprintExtractor;
pub use fft::{spectral_transform, FftBackend, PlannedFft, RadixFft, SpectralTransform};
pub use similarity::SimilarityComputer;
pub use types::{Fingerprint, FingerprintProperties, FingerprintSimilarity};

/// Extract a fingerprint from 16-bit PCM samples using the default
/// properties.
///
/// Fails when the waveform is too short to produce even one frame.
pub fn extract_fingerprint(samples: &[i16]) -> Result<Fingerprint> {
    FingerprintExtractor::new(FingerprintProperties::default())?.extract(samples)
}

/// Extract a fingerprint from a headerless raw PCM file.
///
/// The file holds little-endian mono 16-bit samples and no header; its
/// byte count must be even and non-zero.
pub fn extract_fingerprint_from_raw_file(path: impl AsRef<Path>) -> Result<Fingerprint> {
    let path = path.as_ref();
    info!("Extracting fingerprint from raw file '{}'", path.display());

    let samples = load_raw_pcm(path)?;
    extract_fingerprint(&samples)
}

/// Extract a fingerprint from a WAV file.
///
/// Expects 16-bit integer PCM; multi-channel audio is downmixed to
/// mono by averaging.
pub fn extract_fingerprint_from_wav_file(path: impl AsRef<Path>) -> Result<Fingerprint> {
    let path = path.as_ref();
    info!("Extracting fingerprint from WAV file '{}'", path.display());

    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(Error::UnsupportedWavFormat(format!(
            "{:?}, {} bits per sample",
            spec.sample_format, spec.bits_per_sample
        )));
    }

    let channels = spec.channels as usize;
    let interleaved = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<i16>, _>>()?;

    let samples: Vec<i16> = if channels <= 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| {
                (frame.iter().map(|&s| s as i32).sum::<i32>() / channels as i32) as i16
            })
            .collect()
    };

    extract_fingerprint(&samples)
}

/// Compare two fingerprints extracted with the default properties.
///
/// Fingerprints of differing sizes are not comparable: the sentinel
/// result (`similarity == -1.0`) is returned without invoking the
/// matcher. Comparison never mutates either input.
pub fn compare_fingerprints(a: &Fingerprint, b: &Fingerprint) -> FingerprintSimilarity {
    compare_fingerprints_with(a, b, &FingerprintProperties::default())
}

/// Compare two fingerprints extracted with the given properties.
pub fn compare_fingerprints_with(
    a: &Fingerprint,
    b: &Fingerprint,
    properties: &FingerprintProperties,
) -> FingerprintSimilarity {
    if a.len() != b.len() {
        return FingerprintSimilarity::default();
    }

    SimilarityComputer::new(properties.clone()).compare(a.data(), b.data())
}

/// Load a headerless raw PCM file as mono 16-bit samples.
fn load_raw_pcm(path: &Path) -> Result<Vec<i16>> {
    let bytes = std::fs::read(path)?;

    if bytes.is_empty() {
        return Err(Error::EmptyFile {
            path: path.display().to_string(),
        });
    }
    if bytes.len() % 2 != 0 {
        return Err(Error::OddByteCount {
            path: path.display().to_string(),
            bytes: bytes.len() as u64,
        });
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_mismatch_yields_sentinel_without_matching() {
        let a = Fingerprint::new(vec![0xAB; 8]);
        let b = Fingerprint::new(vec![0xAB; 9]);

        let result = compare_fingerprints(&a, &b);
        assert_eq!(result.similarity, -1.0);
        assert_eq!(result.score, -1.0);
        assert_eq!(result.most_similar_frame_position, i32::MIN);
    }

    #[test]
    fn missing_raw_file_is_an_error() {
        let result = extract_fingerprint_from_raw_file("/nonexistent/clip.raw");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
