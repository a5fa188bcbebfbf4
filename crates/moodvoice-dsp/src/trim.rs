//! Leading and trailing silence removal.

use crate::error::StageError;
use moodvoice_types::Waveform;

/// Analysis frame length for the energy envelope.
pub const FRAME_LENGTH: usize = 2048;

/// Hop between envelope frames; trim boundaries fall on multiples of this.
pub const TRIM_HOP: usize = 512;

/// Trims leading and trailing frames quieter than `threshold_db` relative to
/// the loudest frame.
///
/// Only the edges are cut; quiet passages between loud ones are kept. An
/// input that never rises above the threshold (including all-zero input)
/// trims to an empty waveform, which is a valid result.
///
/// # Errors
///
/// `InvalidParameter` when `threshold_db` is not a negative finite number.
pub fn trim_silence(wave: &Waveform, threshold_db: f32) -> Result<Waveform, StageError> {
    if !(threshold_db.is_finite() && threshold_db < 0.0) {
        return Err(StageError::InvalidParameter {
            name: "silence threshold",
            value: threshold_db,
        });
    }
    if wave.is_empty() {
        return Ok(wave.clone());
    }
    if wave.samples.iter().any(|s| !s.is_finite()) {
        return Err(StageError::NonFinite);
    }

    let (start, end) = non_silent_bounds(&wave.samples, threshold_db);
    Ok(wave.with_samples(wave.samples[start..end].to_vec()))
}

/// Sample bounds `[start, end)` of the non-silent region.
pub fn non_silent_bounds(samples: &[f32], threshold_db: f32) -> (usize, usize) {
    let power = frame_power(samples, FRAME_LENGTH, TRIM_HOP);
    let reference = power.iter().copied().fold(0.0f64, f64::max);
    if reference <= 0.0 {
        return (0, 0);
    }

    // 10 * log10(p / reference) > threshold_db
    let floor = reference * 10f64.powf(threshold_db as f64 / 10.0);
    let first = power.iter().position(|&p| p > floor);
    let last = power.iter().rposition(|&p| p > floor);

    match (first, last) {
        (Some(first), Some(last)) => {
            let start = (first * TRIM_HOP).min(samples.len());
            let end = ((last + 1) * TRIM_HOP).min(samples.len());
            (start, end)
        }
        _ => (0, 0),
    }
}

/// Mean-square energy of centered, zero-padded frames.
fn frame_power(samples: &[f32], frame_length: usize, hop: usize) -> Vec<f64> {
    let mut prefix = Vec::with_capacity(samples.len() + 1);
    prefix.push(0.0f64);
    let mut running = 0.0f64;
    for &s in samples {
        running += (s as f64) * (s as f64);
        prefix.push(running);
    }

    let half = frame_length / 2;
    let frames = 1 + samples.len() / hop;
    (0..frames)
        .map(|t| {
            let centre = t * hop;
            let lo = centre.saturating_sub(half).min(samples.len());
            let hi = (centre + frame_length - half).min(samples.len());
            (prefix[hi] - prefix[lo]) / frame_length as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded_burst(lead: usize, body: usize, tail: usize) -> Vec<f32> {
        let mut samples = vec![0.0f32; lead];
        samples.extend((0..body).map(|i| (i as f32 * 0.2).sin() * 0.8));
        samples.extend(vec![0.0f32; tail]);
        samples
    }

    #[test]
    fn removes_leading_and_trailing_silence() {
        let samples = padded_burst(8192, 8192, 8192);
        let wave = Waveform::new(samples, 16_000);
        let out = trim_silence(&wave, -25.0).unwrap();

        assert!(out.len() < wave.len());
        // Boundaries snap to the hop grid and may keep up to a frame of padding.
        assert!(out.len() >= 8192);
        assert!(out.len() <= 8192 + 2 * FRAME_LENGTH);
    }

    #[test]
    fn keeps_interior_silence() {
        let mut samples = padded_burst(0, 8192, 0);
        samples.extend(vec![0.0f32; 16_384]);
        samples.extend(padded_burst(0, 8192, 0));
        let wave = Waveform::new(samples.clone(), 16_000);

        let out = trim_silence(&wave, -25.0).unwrap();
        assert_eq!(out.samples, samples);
    }

    #[test]
    fn all_zero_input_trims_to_empty() {
        let wave = Waveform::new(vec![0.0; 10_000], 16_000);
        let out = trim_silence(&wave, -20.0).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.sample_rate, 16_000);
    }

    #[test]
    fn empty_input_is_returned_unchanged() {
        let wave = Waveform::new(Vec::new(), 16_000);
        assert_eq!(trim_silence(&wave, -20.0).unwrap(), wave);
    }

    #[test]
    fn rejects_non_negative_threshold() {
        let wave = Waveform::new(vec![0.5; 100], 16_000);
        assert!(matches!(
            trim_silence(&wave, 25.0),
            Err(StageError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn frame_power_of_constant_signal() {
        let power = frame_power(&[1.0; 4096], 2048, 512);
        assert_eq!(power.len(), 9);
        // First frame is half padding.
        assert!((power[0] - 0.5).abs() < 1e-12);
        assert!((power[4] - 1.0).abs() < 1e-12);
    }
}
