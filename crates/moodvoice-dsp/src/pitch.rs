//! Pitch change without duration change.

use crate::error::StageError;
use crate::resample::resample;
use crate::stretch::time_stretch;
use moodvoice_types::Waveform;

/// Frequency multiplier for a shift of `semitones`.
pub fn semitone_ratio(semitones: f32) -> f32 {
    2.0f32.powf(semitones / 12.0)
}

/// Shifts the pitch of `wave` by `semitones` (positive raises pitch).
///
/// The waveform is first stretched by the inverse of the frequency ratio,
/// then resampled back to its original length, which scales every frequency
/// by the ratio. Output length always equals input length.
///
/// # Errors
///
/// `InvalidParameter` for a non-finite shift, `InvalidSampleRate` for a zero
/// sample rate, and anything [`time_stretch`] reports.
pub fn pitch_shift(wave: &Waveform, semitones: f32) -> Result<Waveform, StageError> {
    if !semitones.is_finite() {
        return Err(StageError::InvalidParameter {
            name: "pitch shift",
            value: semitones,
        });
    }
    if wave.sample_rate == 0 {
        return Err(StageError::InvalidSampleRate(wave.sample_rate));
    }

    let rate = 1.0 / semitone_ratio(semitones);
    let stretched = time_stretch(wave, rate)?;

    let mut shifted = resample(&stretched.samples, rate as f64)?;
    shifted.resize(wave.len(), 0.0);
    Ok(wave.with_samples(shifted))
}
