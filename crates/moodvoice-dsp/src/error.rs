//! Error types for individual processing stages.

/// Failures a single stage can report. None of these abort a request; the
/// chain downgrades them to a [`Degradation`](crate::Degradation).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StageError {
    /// The stage needs at least one sample to work on.
    #[error("input waveform is empty")]
    EmptyInput,

    /// A coefficient is outside the range the stage accepts.
    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f32 },

    /// The waveform declares a sample rate of zero.
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    /// The stage produced NaN or infinite samples.
    #[error("stage produced non-finite samples")]
    NonFinite,

    /// The resampler rejected its configuration or failed mid-stream.
    #[error("resampling failed: {0}")]
    Resample(String),

    /// The stage panicked.
    #[error("stage panicked: {0}")]
    Panicked(String),
}
