//! Speech generation for the moodvoice service.
//!
//! Turns text plus an emotion label into a persisted, emotion-colored WAV
//! artifact:
//!
//! - [`EmotionTable`] resolves a label to its [`EmotionProfile`].
//! - A [`Synthesizer`] renders neutral speech for a voice of its
//!   [`VoiceCatalog`]. [`PiperSynthesizer`] drives the Piper CLI.
//! - An [`ArtifactStore`] persists waveforms. [`WavDirectoryStore`] keeps
//!   16-bit PCM WAV files in one directory.
//! - [`SpeechGenerator`] ties these together with the DSP post-processor
//!   and guarantees that intermediate files never outlive a request.
//!
//! Everything here is synchronous. Callers on an async runtime should run
//! [`SpeechGenerator::generate`] on a blocking thread.
//!
//! [`EmotionProfile`]: moodvoice_types::EmotionProfile
//! [`VoiceCatalog`]: moodvoice_types::VoiceCatalog

pub mod config;
pub mod error;
pub mod housekeeping;
pub mod orchestrator;
pub mod store;
pub mod synth;
pub mod table;

pub use config::PiperConfig;
pub use error::{GenerationError, StoreError, SynthesisError};
pub use housekeeping::{sweep_stale, HousekeepingPolicy};
pub use orchestrator::{GenerationArtifact, HealthSnapshot, SpeechGenerator};
pub use store::{ArtifactKind, ArtifactStore, TempArtifact, WavDirectoryStore};
pub use synth::{PiperSynthesizer, Synthesizer, MAX_TTS_INPUT_BYTES};
pub use table::EmotionTable;
