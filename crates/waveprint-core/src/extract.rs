//! Frame feature extraction and fingerprint encoding.
//!
//! The extractor slices a waveform into analysis frames, runs the
//! spectral transform on each frame in order, selects a fixed number of
//! robust points per frame, and packs them into the fingerprint buffer.
//!
//! # Robust-point rule
//!
//! The magnitude spectrum of each frame is integrated over
//! `num_robust_points_per_frame + 1` log-spaced bands (the DC bin is
//! excluded). Bit `b` of the frame is set when band `b` carries more
//! energy than band `b + 1`. The sign of an adjacent-band energy
//! difference depends only on relative prominence, so the encoding is
//! unchanged by gain and tolerant of broadband noise, and it is a pure
//! function of the frame's own spectrum.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::fft::{spectral_transform, FftBackend, SpectralTransform};
use crate::types::{Fingerprint, FingerprintProperties};

/// Extracts bit-packed fingerprints from 16-bit PCM waveforms.
///
/// Owns its transform scratch state exclusively; distinct extractors
/// may run fully in parallel.
pub struct FingerprintExtractor {
    properties: FingerprintProperties,
    transform: Box<dyn SpectralTransform>,
    band_edges: Vec<usize>,
}

impl FingerprintExtractor {
    /// Create an extractor with the default transform backend.
    pub fn new(properties: FingerprintProperties) -> Result<Self> {
        Self::with_backend(properties, FftBackend::default())
    }

    /// Create an extractor with an explicit transform backend.
    pub fn with_backend(properties: FingerprintProperties, backend: FftBackend) -> Result<Self> {
        let frame_size = properties.sample_size_per_frame;
        if frame_size < 8 || !frame_size.is_power_of_two() {
            return Err(Error::InvalidFrameSize(frame_size));
        }

        let transform = spectral_transform(backend, frame_size);
        // N robust points compare N + 1 adjacent bands, bounded by N + 2 edges
        let band_edges = log_band_edges(
            transform.spectrum_size(),
            properties.num_robust_points_per_frame + 2,
        );

        Ok(Self {
            properties,
            transform,
            band_edges,
        })
    }

    /// The properties this extractor was configured with.
    pub fn properties(&self) -> &FingerprintProperties {
        &self.properties
    }

    /// Extract a fingerprint from 16-bit PCM samples.
    ///
    /// Identical input always yields a byte-identical fingerprint.
    /// Fails when the waveform is too short for even one frame; the
    /// output buffer always holds a whole number of frames.
    pub fn extract(&mut self, samples: &[i16]) -> Result<Fingerprint> {
        let frame_size = self.properties.sample_size_per_frame;
        let hop_size = self.properties.hop_size();

        if samples.len() < frame_size {
            return Err(Error::InsufficientSamples {
                got: samples.len(),
                need: frame_size,
            });
        }

        info!("Extracting fingerprint from {} samples", samples.len());

        let num_frames = (samples.len() - frame_size) / hop_size + 1;
        let mut data = Vec::with_capacity(num_frames * self.properties.bytes_per_frame());
        let mut frame = vec![0.0f32; frame_size];

        for frame_idx in 0..num_frames {
            let start = frame_idx * hop_size;
            for (value, &sample) in frame.iter_mut().zip(&samples[start..start + frame_size]) {
                *value = sample as f32 / 32768.0;
            }

            let spectrum = self.transform.magnitudes(&frame);
            self.encode_frame(&spectrum, &mut data);
        }

        debug!(
            "Encoded {} frames into {} fingerprint bytes",
            num_frames,
            data.len()
        );

        Ok(Fingerprint::new(data))
    }

    /// Pack one frame's robust points, most significant feature first.
    fn encode_frame(&self, spectrum: &[f32], out: &mut Vec<u8>) {
        let band_energies: Vec<f32> = self
            .band_edges
            .windows(2)
            .map(|edge| spectrum[edge[0]..edge[1]].iter().sum())
            .collect();

        let mut byte = 0u8;
        let mut filled = 0;
        for pair in band_energies.windows(2) {
            byte <<= 1;
            if pair[0] > pair[1] {
                byte |= 1;
            }
            filled += 1;
            if filled == 8 {
                out.push(byte);
                byte = 0;
                filled = 0;
            }
        }
        if filled > 0 {
            out.push(byte << (8 - filled));
        }
    }
}

/// Log-spaced band edges over the usable spectrum, DC excluded.
fn log_band_edges(spectrum_size: usize, num_edges: usize) -> Vec<usize> {
    let lo = 1.0f32;
    let hi = spectrum_size as f32;
    (0..num_edges)
        .map(|i| {
            let t = i as f32 / (num_edges - 1) as f32;
            ((lo * (hi / lo).powf(t)).round() as usize).min(spectrum_size)
        })
        .collect()
}
