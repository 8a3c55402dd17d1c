//! Error types for fingerprint extraction.

use thiserror::Error;

/// Result type alias for fingerprint operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fingerprint error types.
///
/// Comparison of well-formed fingerprints never errors; degenerate
/// inputs are reported through sentinel values in
/// [`FingerprintSimilarity`](crate::FingerprintSimilarity) instead.
#[derive(Error, Debug)]
pub enum Error {
    /// The waveform is too short to fill even one analysis frame.
    #[error("Not enough samples for one analysis frame: got {got}, need {need}")]
    InsufficientSamples {
        /// Samples provided.
        got: usize,
        /// Samples needed for one frame.
        need: usize,
    },

    /// The configured analysis frame size cannot be transformed.
    #[error("Invalid analysis frame size {0}: must be a power of two of at least 8 samples")]
    InvalidFrameSize(usize),

    /// A raw PCM file contained no data.
    #[error("Raw PCM file is empty: {path}")]
    EmptyFile {
        /// Offending file path.
        path: String,
    },

    /// A raw PCM file does not hold whole 16-bit samples.
    #[error("Raw PCM file has an odd byte count ({bytes} bytes), must hold whole 16-bit samples: {path}")]
    OddByteCount {
        /// Offending file path.
        path: String,
        /// Byte length of the file.
        bytes: u64,
    },

    /// A WAV file is not 16-bit integer PCM.
    #[error("Unsupported WAV format: {0} (16-bit integer PCM expected)")]
    UnsupportedWavFormat(String),

    /// A WAV file failed to decode.
    #[error("WAV decode error: {0}")]
    WavDecode(#[from] hound::Error),

    /// File access failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
