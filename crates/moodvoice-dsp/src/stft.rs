//! Short-time Fourier analysis and resynthesis.
//!
//! Frames are centered: frame `t` is centered on sample `t * hop`, with the
//! signal zero-padded by `n_fft / 2` on both sides. Resynthesis overlap-adds
//! windowed inverse transforms and divides by the summed squared window.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// FFT size used by the stretch and pitch stages.
pub const N_FFT: usize = 2048;

/// Hop between analysis frames.
pub const HOP_LENGTH: usize = 512;

/// One frame of positive-frequency bins (`n_fft / 2 + 1` values).
pub type Spectrum = Vec<Complex<f32>>;

/// Periodic Hann window.
pub fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / n as f32).cos())
        .collect()
}

/// A planned forward/inverse transform pair with its analysis window.
pub struct Stft {
    n_fft: usize,
    hop: usize,
    window: Vec<f32>,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl Stft {
    /// Plans transforms of size `n_fft`. `n_fft` must be even and non-zero.
    pub fn new(n_fft: usize, hop: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            n_fft,
            hop,
            window: hann_window(n_fft),
            forward: planner.plan_fft_forward(n_fft),
            inverse: planner.plan_fft_inverse(n_fft),
        }
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Number of positive-frequency bins per frame.
    pub fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Number of centered frames covering `len` samples.
    pub fn frame_count(&self, len: usize) -> usize {
        1 + len / self.hop
    }

    /// Computes the centered STFT of `samples`.
    pub fn analyze(&self, samples: &[f32]) -> Vec<Spectrum> {
        let pad = self.n_fft / 2;
        let mut padded = vec![0.0f32; samples.len() + 2 * pad];
        padded[pad..pad + samples.len()].copy_from_slice(samples);

        let n_bins = self.n_bins();
        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.n_fft];

        (0..self.frame_count(samples.len()))
            .map(|t| {
                let start = t * self.hop;
                for (i, slot) in buffer.iter_mut().enumerate() {
                    *slot = Complex::new(padded[start + i] * self.window[i], 0.0);
                }
                self.forward.process(&mut buffer);
                buffer[..n_bins].to_vec()
            })
            .collect()
    }

    /// Inverts a centered STFT, returning exactly `length` samples.
    ///
    /// Output beyond what the frames cover is zero.
    pub fn synthesize(&self, frames: &[Spectrum], length: usize) -> Vec<f32> {
        if frames.is_empty() {
            return vec![0.0; length];
        }

        let n = self.n_fft;
        let n_bins = self.n_bins();
        let total = n + self.hop * (frames.len() - 1);
        let mut output = vec![0.0f32; total];
        let mut window_sum = vec![0.0f32; total];
        let mut buffer = vec![Complex::new(0.0f32, 0.0); n];
        let scale = 1.0 / n as f32;

        for (t, frame) in frames.iter().enumerate() {
            buffer[..n_bins].copy_from_slice(&frame[..n_bins]);
            // Hermitian symmetry of a real signal's spectrum.
            for k in 1..n / 2 {
                buffer[n - k] = frame[k].conj();
            }
            self.inverse.process(&mut buffer);

            let start = t * self.hop;
            for (i, value) in buffer.iter().enumerate() {
                let w = self.window[i];
                output[start + i] += value.re * scale * w;
                window_sum[start + i] += w * w;
            }
        }

        for (sample, &norm) in output.iter_mut().zip(&window_sum) {
            if norm > f32::MIN_POSITIVE {
                *sample /= norm;
            }
        }

        let mut samples: Vec<f32> = output.into_iter().skip(n / 2).take(length).collect();
        samples.resize(length, 0.0);
        samples
    }
}

impl Default for Stft {
    fn default() -> Self {
        Self::new(N_FFT, HOP_LENGTH)
    }
}
