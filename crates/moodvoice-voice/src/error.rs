use std::path::PathBuf;
use thiserror::Error;

/// Failures of the external speech synthesizer.
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("failed to spawn synthesizer: {0}")]
    Spawn(String),

    #[error("synthesizer timed out after {0} seconds")]
    Timeout(u64),

    #[error("synthesizer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("voice not supported by the synthesizer: {0}")]
    UnknownVoice(String),

    #[error("invalid synthesizer configuration: {0}")]
    Config(String),

    #[error("synthesizer produced unusable audio: {0}")]
    Output(String),

    #[error("synthesizer error: {0}")]
    Backend(String),
}

/// Failures of the artifact store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("artifact I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("WAV error at {path}: {source}")]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn wav(path: impl Into<PathBuf>, source: hound::Error) -> Self {
        Self::Wav {
            path: path.into(),
            source,
        }
    }
}

/// Errors returned by [`SpeechGenerator::generate`](crate::SpeechGenerator::generate).
///
/// DSP stage failures are not errors; they surface as degraded stages on a
/// successful artifact.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The emotion label has no profile.
    #[error("invalid emotion: {0}")]
    InvalidEmotion(String),

    /// The request text is empty or too large.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("speech synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("failed to persist audio: {0}")]
    Persistence(#[source] StoreError),
}

impl GenerationError {
    /// Whether the caller sent a bad request (as opposed to a server fault).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidEmotion(_) | Self::InvalidInput(_))
    }
}
