//! Tempo change without pitch change, via a phase vocoder.

use crate::error::StageError;
use crate::stft::{Spectrum, Stft};
use moodvoice_types::Waveform;
use rustfft::num_complex::Complex;
use std::f32::consts::TAU;

/// Stretches `wave` in time by `1 / rate`.
///
/// `rate > 1` speeds speech up (fewer samples), `rate < 1` slows it down.
/// The output holds `round(len / rate)` samples at the same sample rate.
///
/// # Errors
///
/// `InvalidParameter` for a non-positive or non-finite rate, `EmptyInput`
/// for an empty waveform.
pub fn time_stretch(wave: &Waveform, rate: f32) -> Result<Waveform, StageError> {
    if !(rate.is_finite() && rate > 0.0) {
        return Err(StageError::InvalidParameter {
            name: "stretch rate",
            value: rate,
        });
    }
    if wave.is_empty() {
        return Err(StageError::EmptyInput);
    }

    let stft = Stft::default();
    let spectrum = stft.analyze(&wave.samples);
    let stretched = phase_vocoder(&spectrum, rate, stft.hop(), stft.n_fft());
    let length = stretched_len(wave.len(), rate);

    Ok(wave.with_samples(stft.synthesize(&stretched, length)))
}

/// Sample count after stretching `len` samples by `rate`.
pub fn stretched_len(len: usize, rate: f32) -> usize {
    (len as f64 / rate as f64).round() as usize
}

/// Resamples STFT frames along the time axis by `rate`.
///
/// Magnitudes are linearly interpolated between neighbouring frames; phases
/// are accumulated from each bin's measured instantaneous frequency so that
/// partials stay coherent across the new hop spacing.
pub fn phase_vocoder(frames: &[Spectrum], rate: f32, hop: usize, n_fft: usize) -> Vec<Spectrum> {
    let Some(first) = frames.first() else {
        return Vec::new();
    };
    let n_bins = first.len();
    let n_frames = frames.len();

    // Expected phase advance per hop for each bin centre frequency.
    let phi_advance: Vec<f32> = (0..n_bins)
        .map(|k| TAU * hop as f32 * k as f32 / n_fft as f32)
        .collect();

    let mut phase_acc: Vec<f32> = first.iter().map(|c| c.arg()).collect();
    let silence = vec![Complex::new(0.0f32, 0.0); n_bins];
    let column = |index: usize| frames.get(index).unwrap_or(&silence);

    let steps = (n_frames as f64 / rate as f64).ceil() as usize;
    let mut output = Vec::with_capacity(steps);

    for t in 0..steps {
        let position = t as f64 * rate as f64;
        let index = position.floor() as usize;
        let alpha = (position - index as f64) as f32;
        let (left, right) = (column(index), column(index + 1));

        let frame: Spectrum = (0..n_bins)
            .map(|k| {
                let magnitude = (1.0 - alpha) * left[k].norm() + alpha * right[k].norm();
                Complex::from_polar(magnitude, phase_acc[k])
            })
            .collect();

        for k in 0..n_bins {
            let mut deviation = right[k].arg() - left[k].arg() - phi_advance[k];
            deviation -= TAU * (deviation / TAU).round();
            phase_acc[k] = (phase_acc[k] + phi_advance[k] + deviation).rem_euclid(TAU);
        }

        output.push(frame);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(len: usize) -> Waveform {
        let samples = (0..len)
            .map(|i| (TAU * 300.0 * i as f32 / 16_000.0).sin() * 0.5)
            .collect();
        Waveform::new(samples, 16_000)
    }

    #[test]
    fn slowing_down_lengthens_output() {
        let wave = tone(16_000);
        let out = time_stretch(&wave, 0.82).unwrap();
        assert_eq!(out.len(), stretched_len(16_000, 0.82));
        assert!(out.len() > wave.len());
        assert_eq!(out.sample_rate, 16_000);
    }

    #[test]
    fn speeding_up_shortens_output() {
        let wave = tone(16_000);
        let out = time_stretch(&wave, 1.04).unwrap();
        assert_eq!(out.len(), 15_385);
    }

    #[test]
    fn very_short_input_still_stretches() {
        let wave = tone(10);
        let out = time_stretch(&wave, 0.5).unwrap();
        assert_eq!(out.len(), 20);
    }

    #[test]
    fn rejects_empty_input_and_bad_rate() {
        let empty = Waveform::new(Vec::new(), 16_000);
        assert_eq!(time_stretch(&empty, 1.2), Err(StageError::EmptyInput));

        let wave = tone(100);
        assert!(matches!(
            time_stretch(&wave, 0.0),
            Err(StageError::InvalidParameter { .. })
        ));
        assert!(matches!(
            time_stretch(&wave, f32::NAN),
            Err(StageError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn vocoder_frame_count_follows_rate() {
        let frames = vec![vec![Complex::new(1.0f32, 0.0); 5]; 10];
        assert_eq!(phase_vocoder(&frames, 0.5, 4, 8).len(), 20);
        assert_eq!(phase_vocoder(&frames, 2.0, 4, 8).len(), 5);
        assert!(phase_vocoder(&[], 2.0, 4, 8).is_empty());
    }
}
