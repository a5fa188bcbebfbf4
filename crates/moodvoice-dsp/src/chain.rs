//! The ordered post-processing chain and its degradation policy.

use crate::dynamics::{apply_gain, compress_and_normalize};
use crate::error::StageError;
use crate::pitch::pitch_shift;
use crate::stretch::time_stretch;
use crate::trim::trim_silence;
use moodvoice_types::{EmotionProfile, Waveform};
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// A step of the post-processing chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    SilenceTrim,
    RateStretch,
    PitchShift,
    EnergyGain,
    Normalize,
}

impl Stage {
    /// Every stage, in execution order.
    pub const ALL: [Stage; 5] = [
        Stage::SilenceTrim,
        Stage::RateStretch,
        Stage::PitchShift,
        Stage::EnergyGain,
        Stage::Normalize,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SilenceTrim => "silence_trim",
            Self::RateStretch => "rate_stretch",
            Self::PitchShift => "pitch_shift",
            Self::EnergyGain => "energy_gain",
            Self::Normalize => "normalize",
        }
    }

    /// Whether `profile` makes this stage a no-op.
    ///
    /// Skipping no-op stages avoids the small quality loss of a round trip
    /// through the phase vocoder.
    pub fn is_noop(self, profile: &EmotionProfile) -> bool {
        match self {
            Self::RateStretch => profile.speed == 1.0,
            Self::PitchShift => profile.pitch_shift == 0.0,
            Self::EnergyGain => profile.energy == 1.0,
            Self::SilenceTrim | Self::Normalize => false,
        }
    }

    /// Runs this stage alone.
    pub fn apply(self, wave: &Waveform, profile: &EmotionProfile) -> Result<Waveform, StageError> {
        match self {
            Self::SilenceTrim => trim_silence(wave, profile.silence_threshold_db),
            Self::RateStretch => time_stretch(wave, profile.speed),
            Self::PitchShift => pitch_shift(wave, profile.pitch_shift),
            Self::EnergyGain => apply_gain(wave, profile.energy),
            Self::Normalize => compress_and_normalize(wave),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stage that failed and was skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Degradation {
    pub stage: Stage,
    pub reason: String,
}

/// Result of running the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    pub waveform: Waveform,
    /// Stages that failed and were skipped, in execution order.
    pub degradations: Vec<Degradation>,
}

impl Processed {
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }

    pub fn degraded_stages(&self) -> Vec<Stage> {
        self.degradations.iter().map(|d| d.stage).collect()
    }
}

/// Runs the five-stage chain. Holds no state; safe to share across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostProcessor;

impl PostProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Reshapes `input` according to `profile`.
    ///
    /// Never fails. A stage that errors, panics, or emits non-finite samples
    /// is skipped: the chain continues with the waveform as it stood before
    /// that stage and the failure is logged and recorded in
    /// [`Processed::degradations`].
    pub fn process(&self, input: &Waveform, profile: &EmotionProfile) -> Processed {
        let mut current = input.clone();
        let mut degradations = Vec::new();

        for stage in Stage::ALL {
            if stage.is_noop(profile) {
                tracing::trace!(%stage, "skipping no-op stage");
                continue;
            }

            match run_guarded(stage, &current, profile) {
                Ok(next) => {
                    tracing::debug!(
                        %stage,
                        samples_in = current.len(),
                        samples_out = next.len(),
                        "applied audio stage"
                    );
                    current = next;
                }
                Err(error) => {
                    tracing::warn!(
                        %stage,
                        error = %error,
                        samples = current.len(),
                        "audio stage failed, continuing without it"
                    );
                    degradations.push(Degradation {
                        stage,
                        reason: error.to_string(),
                    });
                }
            }
        }

        // Only reachable when the input itself was non-finite.
        if current.samples.iter().any(|s| !s.is_finite()) {
            tracing::warn!("zeroing non-finite samples left after post-processing");
            for sample in current.samples.iter_mut().filter(|s| !s.is_finite()) {
                *sample = 0.0;
            }
        }

        Processed {
            waveform: current,
            degradations,
        }
    }
}

fn run_guarded(
    stage: Stage,
    wave: &Waveform,
    profile: &EmotionProfile,
) -> Result<Waveform, StageError> {
    let output = catch_unwind(AssertUnwindSafe(|| stage.apply(wave, profile)))
        .map_err(|payload| StageError::Panicked(panic_message(payload.as_ref())))??;

    if output.samples.iter().any(|s| !s.is_finite()) {
        return Err(StageError::NonFinite);
    }
    Ok(output)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
