//! Gain, soft-knee compression, and peak normalization.

use crate::error::StageError;
use moodvoice_types::Waveform;

/// Exponent of the power-law compressor. Values below 1.0 lift quiet samples
/// relative to loud ones.
pub const COMPRESSION_EXPONENT: f32 = 0.8;

/// Added to the peak before dividing so near-silent input cannot blow up.
pub const NORMALIZE_EPSILON: f32 = 1e-6;

/// Multiplies every sample by `gain`.
///
/// # Errors
///
/// `InvalidParameter` when `gain` is not a positive finite number.
pub fn apply_gain(wave: &Waveform, gain: f32) -> Result<Waveform, StageError> {
    if !(gain.is_finite() && gain > 0.0) {
        return Err(StageError::InvalidParameter {
            name: "energy gain",
            value: gain,
        });
    }
    Ok(wave.with_samples(wave.samples.iter().map(|&s| s * gain).collect()))
}

/// Applies `sign(x) * |x|^0.8`, then scales so the peak sits at 1.0.
///
/// All-zero (or empty) input stays all-zero.
pub fn compress_and_normalize(wave: &Waveform) -> Result<Waveform, StageError> {
    let compressed: Vec<f32> = wave
        .samples
        .iter()
        .map(|&x| x.signum() * x.abs().powf(COMPRESSION_EXPONENT))
        .collect();

    let peak = compressed.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    let scale = 1.0 / (peak + NORMALIZE_EPSILON);

    Ok(wave.with_samples(compressed.into_iter().map(|s| s * scale).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gain_scales_linearly() {
        let wave = Waveform::new(vec![0.5, -0.25, 0.0], 8_000);
        let out = apply_gain(&wave, 1.35).unwrap();
        assert_eq!(out.samples, vec![0.675, -0.3375, 0.0]);
    }

    #[test]
    fn gain_rejects_non_positive_values() {
        let wave = Waveform::new(vec![0.5], 8_000);
        assert!(apply_gain(&wave, 0.0).is_err());
        assert!(apply_gain(&wave, -2.0).is_err());
        assert!(apply_gain(&wave, f32::NAN).is_err());
    }

    #[test]
    fn normalizes_peak_to_one() {
        let wave = Waveform::new(vec![0.1, -0.4, 0.2], 8_000);
        let out = compress_and_normalize(&wave).unwrap();
        assert!((out.peak() - 1.0).abs() < 1e-4);
        // Sign is preserved.
        assert!(out.samples[1] < 0.0);
        assert!(out.samples[0] > 0.0);
    }

    #[test]
    fn compression_narrows_dynamic_range() {
        let wave = Waveform::new(vec![0.1, 1.0], 8_000);
        let out = compress_and_normalize(&wave).unwrap();
        // 0.1^0.8 ~= 0.158, so the quiet sample gains relative to the loud one.
        assert!(out.samples[0] / out.samples[1] > 0.15);
    }

    #[test]
    fn silent_input_stays_silent() {
        let wave = Waveform::new(vec![0.0; 64], 8_000);
        let out = compress_and_normalize(&wave).unwrap();
        assert!(out.samples.iter().all(|&s| s == 0.0));

        let empty = Waveform::new(Vec::new(), 8_000);
        assert!(compress_and_normalize(&empty).unwrap().is_empty());
    }
}
