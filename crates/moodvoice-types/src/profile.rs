//! Emotion profile definitions.
//!
//! An `EmotionProfile` maps an emotion label (a vocal persona such as
//! "youngwoman") to a preferred synthesis voice and the coefficients of the
//! post-processing chain.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Emotion used when a request does not name one.
pub const DEFAULT_EMOTION: &str = "youngmale";

/// Errors raised when a profile carries coefficients the DSP chain cannot use.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("profile '{label}': speed must be a positive finite number, got {value}")]
    InvalidSpeed { label: String, value: f32 },

    #[error("profile '{label}': energy must be a positive finite number, got {value}")]
    InvalidEnergy { label: String, value: f32 },

    #[error("profile '{label}': pitch shift must be finite, got {value}")]
    InvalidPitchShift { label: String, value: f32 },

    #[error("profile '{label}': silence threshold must be negative dB, got {value}")]
    InvalidSilenceThreshold { label: String, value: f32 },

    #[error("profile '{label}': voice identifier must not be empty")]
    EmptyVoice { label: String },

    #[error("profile label must not be empty")]
    EmptyLabel,

    #[error("duplicate profile label: {0}")]
    DuplicateLabel(String),

    #[error("no profile for the default emotion '{0}'")]
    MissingDefault(&'static str),
}

/// A named bundle of DSP coefficients and a preferred voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionProfile {
    /// Identifier of the preferred synthesis voice (e.g. a VCTK speaker "p224").
    pub voice: String,
    /// Playback-rate multiplier. Below 1.0 slows speech down.
    pub speed: f32,
    /// Signed pitch shift in semitones. Positive raises pitch.
    pub pitch_shift: f32,
    /// Linear amplitude multiplier applied after the pitch shift.
    pub energy: f32,
    /// Level in dB below the peak under which leading/trailing audio is trimmed.
    pub silence_threshold_db: f32,
}

impl EmotionProfile {
    pub fn new(
        voice: impl Into<String>,
        speed: f32,
        pitch_shift: f32,
        energy: f32,
        silence_threshold_db: f32,
    ) -> Self {
        Self {
            voice: voice.into(),
            speed,
            pitch_shift,
            energy,
            silence_threshold_db,
        }
    }

    /// Checks that the coefficients are usable by the post-processing chain.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint, tagged with `label`.
    pub fn validate(&self, label: &str) -> Result<(), ProfileError> {
        if label.trim().is_empty() {
            return Err(ProfileError::EmptyLabel);
        }
        if self.voice.trim().is_empty() {
            return Err(ProfileError::EmptyVoice {
                label: label.to_string(),
            });
        }
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(ProfileError::InvalidSpeed {
                label: label.to_string(),
                value: self.speed,
            });
        }
        if !(self.energy.is_finite() && self.energy > 0.0) {
            return Err(ProfileError::InvalidEnergy {
                label: label.to_string(),
                value: self.energy,
            });
        }
        if !self.pitch_shift.is_finite() {
            return Err(ProfileError::InvalidPitchShift {
                label: label.to_string(),
                value: self.pitch_shift,
            });
        }
        if !(self.silence_threshold_db.is_finite() && self.silence_threshold_db < 0.0) {
            return Err(ProfileError::InvalidSilenceThreshold {
                label: label.to_string(),
                value: self.silence_threshold_db,
            });
        }
        Ok(())
    }

    /// The DSP coefficients without the voice identifier, as reported to callers.
    pub fn parameters(&self) -> ProfileParameters {
        ProfileParameters {
            speed: self.speed,
            pitch_shift: self.pitch_shift,
            energy: self.energy,
            silence_threshold_db: self.silence_threshold_db,
        }
    }
}

/// The coefficient part of a profile, serialized for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileParameters {
    pub speed: f32,
    #[serde(rename = "pitchShift")]
    pub pitch_shift: f32,
    pub energy: f32,
    #[serde(rename = "silenceThresholdDb")]
    pub silence_threshold_db: f32,
}

/// The profiles shipped with the service, keyed by label.
///
/// Voices are speakers of the multi-speaker VCTK corpus.
pub fn builtin_profiles() -> Vec<(String, EmotionProfile)> {
    vec![
        (
            "youngwoman".to_string(),
            EmotionProfile::new("p224", 1.04, 1.5, 1.35, -25.0),
        ),
        (
            "oldman".to_string(),
            EmotionProfile::new("p228", 0.82, -1.0, 0.9, -20.0),
        ),
        (
            "youngmale".to_string(),
            EmotionProfile::new("p229", 0.98, 0.0, 1.0, -23.0),
        ),
    ]
}
