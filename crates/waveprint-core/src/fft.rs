//! Spectral transform backends.
//!
//! A transform turns one fixed-size interleaved time-domain frame into
//! the magnitude spectrum of its positive-frequency half. Two
//! interchangeable implementations are provided: [`RadixFft`], a
//! self-contained in-place radix-2/4 FFT with precomputed twiddle and
//! bit-reversal tables, and [`PlannedFft`], which delegates the forward
//! transform to the `rustfft` planner. Both satisfy the same contract
//! and agree within floating-point tolerance.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Converts one interleaved real/imaginary time-domain frame into a
/// half-length magnitude spectrum.
///
/// The input buffer holds `2 * frame_size` values interpreted as
/// `frame_size` complex points (consecutive value pairs). The output
/// holds `frame_size / 2` non-negative magnitudes; the mirrored
/// negative-frequency half is discarded.
pub trait SpectralTransform: Send {
    /// Magnitude spectrum of the positive-frequency half.
    ///
    /// A transform whose setup failed, or an input of the wrong length,
    /// yields an all-zero output of the configured length.
    fn magnitudes(&mut self, time_domain: &[f32]) -> Vec<f32>;

    /// Number of magnitude bins produced per frame.
    fn spectrum_size(&self) -> usize;
}

/// Backend selection for the spectral transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FftBackend {
    /// Self-contained radix-2/4 implementation.
    #[default]
    Radix,
    /// `rustfft` planner implementation.
    Planned,
}

/// Construct the selected transform for interleaved frames of
/// `num_samples` values.
pub fn spectral_transform(backend: FftBackend, num_samples: usize) -> Box<dyn SpectralTransform> {
    match backend {
        FftBackend::Radix => Box::new(RadixFft::new(num_samples)),
        FftBackend::Planned => Box::new(PlannedFft::new(num_samples)),
    }
}

/// Portable in-place radix-2/4 FFT.
///
/// Setup precomputes the twiddle-factor table (including the products
/// used by the factor-4 decomposition, which folds two radix-2 stages
/// into one pass with three complex multiplies and eight complex
/// add/subtracts) and the bit-reversal index table. Each call copies
/// the input into a scratch buffer, permutes it, runs the butterfly
/// passes, and combines real/imaginary pairs into magnitudes.
pub struct RadixFft {
    fft_frame_size: usize,
    fft_frame_size2: usize,
    out_len: usize,
    twiddles: Vec<f32>,
    bitm_array: Vec<usize>,
    scratch: Vec<f32>,
    ready: bool,
}

impl RadixFft {
    /// Create a transform for interleaved frames of `num_samples`
    /// values (`num_samples / 2` complex points).
    ///
    /// Frame sizes below four complex points, or not a power of two,
    /// leave the transform un-set-up; it then produces all-zero output.
    pub fn new(num_samples: usize) -> Self {
        let fft_frame_size = num_samples / 2;
        let fft_frame_size2 = fft_frame_size << 1;
        let ready = fft_frame_size >= 4 && fft_frame_size.is_power_of_two();

        let (twiddles, bitm_array) = if ready {
            (
                compute_twiddle_factors(fft_frame_size),
                compute_bit_reversal_table(fft_frame_size2),
            )
        } else {
            (Vec::new(), Vec::new())
        };

        Self {
            fft_frame_size,
            fft_frame_size2,
            out_len: fft_frame_size / 2,
            twiddles,
            bitm_array,
            scratch: Vec::with_capacity(fft_frame_size2),
            ready,
        }
    }

    /// Bit-reversal permutation over the even complex points, with the
    /// odd points handled through the mirrored index.
    fn bit_reversal(&self, data: &mut [f32]) {
        if self.fft_frame_size < 4 {
            return;
        }

        let inverse = self.fft_frame_size2 - 2;
        let mut i = 0;
        while i < self.fft_frame_size {
            let j = self.bitm_array[i];

            // even vs. even
            if i < j {
                data.swap(i, j);
                data.swap(i + 1, j + 1);

                let n = inverse - i;
                let m = inverse - j;
                data.swap(n, m);
                data.swap(n + 1, m + 1);
            }

            // odd vs. even
            let n = i + 2;
            let m = j + self.fft_frame_size;
            data.swap(n, m);
            data.swap(n + 1, m + 1);

            i += 4;
        }
    }

    fn transform(&self, data: &mut [f32]) {
        self.bit_reversal(data);
        calc(self.fft_frame_size, data, &self.twiddles);
    }
}

impl SpectralTransform for RadixFft {
    fn magnitudes(&mut self, time_domain: &[f32]) -> Vec<f32> {
        let mut out = vec![0.0f32; self.out_len];
        if !self.ready || time_domain.len() != self.fft_frame_size2 {
            return out;
        }

        let mut data = std::mem::take(&mut self.scratch);
        data.clear();
        data.extend_from_slice(time_domain);

        self.transform(&mut data);

        // The first half of the transformed pairs holds the positive
        // frequency components; the negative half is omitted.
        let mut i = 0;
        while i < self.fft_frame_size {
            let value = data[i] * data[i] + data[i + 1] * data[i + 1];
            out[i >> 1] = value.sqrt();
            i += 2;
        }

        self.scratch = data;
        out
    }

    fn spectrum_size(&self) -> usize {
        self.out_len
    }
}

/// Twiddle table via the recursive angle recurrence, one block per
/// stage, followed by the precomputed factor-4 products (`w * w1`)
/// stored in the upper half of the table.
fn compute_twiddle_factors(fft_frame_size: usize) -> Vec<f32> {
    let imax = fft_frame_size.trailing_zeros() as usize;
    let mut w = vec![0.0f32; (fft_frame_size - 1) * 4];

    let mut w_index = 0;
    let mut nstep = 2usize;
    for _ in 0..imax {
        let jmax = nstep;
        nstep <<= 1;

        let mut wr = 1.0f32;
        let mut wi = 0.0f32;

        let arg = std::f32::consts::PI / (jmax >> 1) as f32;
        let wfr = arg.cos();
        let wfi = -arg.sin();

        let mut j = 0;
        while j < jmax {
            w[w_index] = wr;
            w[w_index + 1] = wi;
            w_index += 2;

            let tempr = wr;
            wr = tempr * wfr - wi * wfi;
            wi = tempr * wfi + wi * wfr;
            j += 2;
        }
    }

    let mut w_index = 0;
    let mut w_index2 = w.len() >> 1;
    let mut nstep = 2usize;
    for _ in 0..imax.saturating_sub(1) {
        let jmax = nstep;
        nstep <<= 1;

        let mut ii = w_index + jmax;
        let mut j = 0;
        while j < jmax {
            let wr = w[w_index];
            let wi = w[w_index + 1];
            w_index += 2;
            let wr1 = w[ii];
            let wi1 = w[ii + 1];
            ii += 2;

            w[w_index2] = wr * wr1 - wi * wi1;
            w[w_index2 + 1] = wr * wi1 + wi * wr1;
            w_index2 += 2;
            j += 2;
        }
    }

    w
}

/// Bit-reversed index for every even interleaved position.
fn compute_bit_reversal_table(fft_frame_size2: usize) -> Vec<usize> {
    let mut bitm_array = vec![0usize; fft_frame_size2];

    let mut i = 2;
    while i < fft_frame_size2 {
        let mut j = 0usize;
        let mut bitm = 2;
        while bitm < fft_frame_size2 {
            if i & bitm != 0 {
                j += 1;
            }
            j <<= 1;
            bitm <<= 1;
        }
        bitm_array[i] = j;
        i += 2;
    }

    bitm_array
}

fn calc(fft_frame_size: usize, data: &mut [f32], w: &[f32]) {
    let fft_frame_size2 = fft_frame_size << 1;
    let nstep = 2;
    if nstep >= fft_frame_size2 {
        return;
    }
    calc_f4f(fft_frame_size, data, nstep - 2, nstep, w);
}

/// Final radix-2 stage.
fn calc_f2e(data: &mut [f32], mut i: usize, nstep: usize, w: &[f32]) {
    let jmax = nstep;
    let mut n = 0;
    while n < jmax {
        let wr = w[i];
        let wi = w[i + 1];
        i += 2;

        let m = n + jmax;
        let datam_r = data[m];
        let datam_i = data[m + 1];
        let datan_r = data[n];
        let datan_i = data[n + 1];

        let tempr = datam_r * wr - datam_i * wi;
        let tempi = datam_r * wi + datam_i * wr;
        data[m] = datan_r - tempr;
        data[m + 1] = datan_i - tempi;
        data[n] = datan_r + tempr;
        data[n + 1] = datan_i + tempi;

        n += 2;
    }
}

/// One radix-4 butterfly at column `n`: three complex multiplies
/// (by `w`, `w1`, and the precomputed `w * w1`) and eight complex
/// add/subtracts across the four points `n`, `n + jmax`,
/// `n + nnstep`, `n + jmax + nnstep`.
#[inline]
#[allow(clippy::too_many_arguments)]
fn radix4_butterfly(
    data: &mut [f32],
    n: usize,
    jmax: usize,
    nnstep: usize,
    wr: f32,
    wi: f32,
    wr1: f32,
    wi1: f32,
    wwr1: f32,
    wwi1: f32,
) {
    let m = n + jmax;
    let n2 = n + nnstep;
    let m2 = m + nnstep;

    let datam1_r = data[m];
    let datam1_i = data[m + 1];
    let datan1_r = data[n];
    let datan1_i = data[n + 1];
    let datam2_r = data[m2];
    let datam2_i = data[m2 + 1];
    let datan2_r = data[n2];
    let datan2_i = data[n2 + 1];

    let tempr = datam1_r * wr - datam1_i * wi;
    let tempi = datam1_r * wi + datam1_i * wr;

    let mut am1_r = datan1_r - tempr;
    let mut am1_i = datan1_i - tempi;
    let mut an1_r = datan1_r + tempr;
    let mut an1_i = datan1_i + tempi;

    let n2w1r = datan2_r * wr1 - datan2_i * wi1;
    let n2w1i = datan2_r * wi1 + datan2_i * wr1;
    let m2ww1r = datam2_r * wwr1 - datam2_i * wwi1;
    let m2ww1i = datam2_r * wwi1 + datam2_i * wwr1;

    let tempr = m2ww1r - n2w1r;
    let tempi = m2ww1i - n2w1i;

    let am2_r = am1_r + tempi;
    let am2_i = am1_i - tempr;
    am1_r -= tempi;
    am1_i += tempr;

    let tempr = n2w1r + m2ww1r;
    let tempi = n2w1i + m2ww1i;

    let an2_r = an1_r - tempr;
    let an2_i = an1_i - tempi;
    an1_r += tempr;
    an1_i += tempi;

    data[m2] = am2_r;
    data[m2 + 1] = am2_i;
    data[n2] = an2_r;
    data[n2 + 1] = an2_i;
    data[m] = am1_r;
    data[m + 1] = am1_i;
    data[n] = an1_r;
    data[n + 1] = an1_i;
}

/// Factor-4 decomposition over the interior stages, falling back to a
/// radix-2 stage when the remaining stage count is not divisible by 4.
fn calc_f4f(fft_frame_size: usize, data: &mut [f32], mut i: usize, mut nstep: usize, w: &[f32]) {
    let fft_frame_size2 = fft_frame_size << 1;
    let w_len = w.len() >> 1;

    while nstep < fft_frame_size2 {
        if nstep << 2 == fft_frame_size2 {
            calc_f4fe(fft_frame_size, data, i, nstep, w);
            return;
        }

        let jmax = nstep;
        let nnstep = nstep << 1;
        if nnstep == fft_frame_size2 {
            // factor-4 decomposition not possible
            calc_f2e(data, i, nstep, w);
            return;
        }
        nstep <<= 2;

        let mut ii = i + jmax;
        let mut iii = i + w_len;

        // first column: unit twiddles
        i += 2;
        ii += 2;
        iii += 2;
        let mut n = 0;
        while n < fft_frame_size2 {
            radix4_butterfly(data, n, jmax, nnstep, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0);
            n += nstep;
        }

        let mut j = 2;
        while j < jmax {
            let wr = w[i];
            let wi = w[i + 1];
            i += 2;
            let wr1 = w[ii];
            let wi1 = w[ii + 1];
            ii += 2;
            let wwr1 = w[iii];
            let wwi1 = w[iii + 1];
            iii += 2;

            let mut n = j;
            while n < fft_frame_size2 {
                radix4_butterfly(data, n, jmax, nnstep, wr, wi, wr1, wi1, wwr1, wwi1);
                n += nstep;
            }
            j += 2;
        }

        i += jmax << 1;
    }

    calc_f2e(data, i, nstep, w);
}

/// Final factor-4 stage; the butterfly spans exactly one column pass.
fn calc_f4fe(fft_frame_size: usize, data: &mut [f32], mut i: usize, mut nstep: usize, w: &[f32]) {
    let fft_frame_size2 = fft_frame_size << 1;
    let w_len = w.len() >> 1;

    while nstep < fft_frame_size2 {
        let jmax = nstep;
        let nnstep = nstep << 1;
        if nnstep == fft_frame_size2 {
            // factor-4 decomposition not possible
            calc_f2e(data, i, nstep, w);
            return;
        }
        nstep <<= 2;

        let mut ii = i + jmax;
        let mut iii = i + w_len;
        let mut n = 0;
        while n < jmax {
            let wr = w[i];
            let wi = w[i + 1];
            i += 2;
            let wr1 = w[ii];
            let wi1 = w[ii + 1];
            ii += 2;
            let wwr1 = w[iii];
            let wwi1 = w[iii + 1];
            iii += 2;

            radix4_butterfly(data, n, jmax, nnstep, wr, wi, wr1, wi1, wwr1, wwi1);
            n += 2;
        }

        i += jmax << 1;
    }
}

/// Alternate transform backed by the `rustfft` planner.
///
/// Performs the same interleaved-to-complex conversion and forward
/// transform, then the identical magnitude combination step.
pub struct PlannedFft {
    fft_frame_size: usize,
    out_len: usize,
    fft: Option<Arc<dyn rustfft::Fft<f32>>>,
    scratch: Vec<Complex<f32>>,
}

impl PlannedFft {
    /// Create a transform for interleaved frames of `num_samples`
    /// values.
    pub fn new(num_samples: usize) -> Self {
        let fft_frame_size = num_samples / 2;
        let fft = if fft_frame_size >= 4 && fft_frame_size.is_power_of_two() {
            let mut planner = FftPlanner::new();
            Some(planner.plan_fft_forward(fft_frame_size))
        } else {
            None
        };

        Self {
            fft_frame_size,
            out_len: fft_frame_size / 2,
            fft,
            scratch: Vec::with_capacity(fft_frame_size),
        }
    }
}

impl SpectralTransform for PlannedFft {
    fn magnitudes(&mut self, time_domain: &[f32]) -> Vec<f32> {
        let mut out = vec![0.0f32; self.out_len];
        let Some(fft) = &self.fft else {
            return out;
        };
        if time_domain.len() != self.fft_frame_size * 2 {
            return out;
        }

        self.scratch.clear();
        self.scratch.extend(
            time_domain
                .chunks_exact(2)
                .map(|pair| Complex::new(pair[0], pair[1])),
        );

        fft.process(&mut self.scratch);

        for (bin, c) in self.scratch[..self.out_len].iter().enumerate() {
            out[bin] = (c.re * c.re + c.im * c.im).sqrt();
        }

        out
    }

    fn spectrum_size(&self) -> usize {
        self.out_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Unit-amplitude complex exponential at `bin`, in interleaved form.
    fn tone_at_bin(num_samples: usize, bin: usize) -> Vec<f32> {
        let points = num_samples / 2;
        let mut frame = vec![0.0f32; num_samples];
        for n in 0..points {
            let theta = 2.0 * std::f32::consts::PI * bin as f32 * n as f32 / points as f32;
            frame[2 * n] = theta.cos();
            frame[2 * n + 1] = theta.sin();
        }
        frame
    }

    // Deterministic pseudo-random frame for equivalence checks.
    fn noise_frame(num_samples: usize, mut seed: u32) -> Vec<f32> {
        (0..num_samples)
            .map(|_| {
                seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
                (seed >> 8) as f32 / (1 << 24) as f32 - 0.5
            })
            .collect()
    }

    #[test]
    fn zero_frame_yields_zero_spectrum() {
        let mut fft = RadixFft::new(2048);
        let spectrum = fft.magnitudes(&vec![0.0; 2048]);
        assert_eq!(spectrum.len(), 512);
        assert!(spectrum.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn tone_peaks_at_its_bin() {
        for &bin in &[1, 7, 100, 300] {
            let mut fft = RadixFft::new(2048);
            let spectrum = fft.magnitudes(&tone_at_bin(2048, bin));

            let peak = spectrum
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                .map(|(i, _)| i)
                .unwrap();
            assert_eq!(peak, bin);

            // leakage stays a small fraction of the peak
            let peak_mag = spectrum[bin];
            for (i, &mag) in spectrum.iter().enumerate() {
                if i != bin {
                    assert!(mag < peak_mag * 0.01, "bin {} leaked {}", i, mag);
                }
            }
        }
    }

    #[test]
    fn undersized_setup_yields_zero_output() {
        // two complex points is below the minimum frame size
        let mut fft = RadixFft::new(4);
        let spectrum = fft.magnitudes(&[1.0, 0.5, -0.25, 0.125]);
        assert!(spectrum.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn wrong_input_length_yields_zero_output() {
        let mut fft = RadixFft::new(64);
        let spectrum = fft.magnitudes(&[1.0; 32]);
        assert_eq!(spectrum.len(), 16);
        assert!(spectrum.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn backends_agree_on_tones() {
        for &bin in &[3, 64, 250] {
            let frame = tone_at_bin(2048, bin);
            let mut radix = RadixFft::new(2048);
            let mut planned = PlannedFft::new(2048);

            let a = radix.magnitudes(&frame);
            let b = planned.magnitudes(&frame);
            assert_eq!(a.len(), b.len());

            let scale = a.iter().cloned().fold(1.0f32, f32::max);
            for (x, y) in a.iter().zip(b.iter()) {
                assert!((x - y).abs() <= scale * 1e-3, "{} vs {}", x, y);
            }
        }
    }

    #[test]
    fn backends_agree_on_noise() {
        for seed in [1u32, 42, 1234] {
            let frame = noise_frame(1024, seed);
            let mut radix = RadixFft::new(1024);
            let mut planned = PlannedFft::new(1024);

            let a = radix.magnitudes(&frame);
            let b = planned.magnitudes(&frame);

            let scale = a.iter().cloned().fold(1.0f32, f32::max);
            for (x, y) in a.iter().zip(b.iter()) {
                assert!((x - y).abs() <= scale * 1e-3, "{} vs {}", x, y);
            }
        }
    }

    #[test]
    fn backends_agree_on_radix2_remainder_sizes() {
        // 8 and 32 complex points are not powers of four, so both end
        // in the radix-2 remainder stage after the radix-4 passes.
        for num_samples in [16usize, 64] {
            let frame = noise_frame(num_samples, 7);
            let mut radix = RadixFft::new(num_samples);
            let mut planned = PlannedFft::new(num_samples);

            let a = radix.magnitudes(&frame);
            let b = planned.magnitudes(&frame);

            let scale = a.iter().cloned().fold(1.0f32, f32::max);
            for (x, y) in a.iter().zip(b.iter()) {
                assert!((x - y).abs() <= scale * 1e-3, "{} vs {}", x, y);
            }
        }
    }

    #[test]
    fn transform_is_deterministic() {
        let frame = noise_frame(2048, 99);
        let mut fft = RadixFft::new(2048);
        let a = fft.magnitudes(&frame);
        let b = fft.magnitudes(&frame);
        assert_eq!(a, b);
    }
}
