//! Emotion-conditioned audio post-processing.
//!
//! A neutral synthesized waveform is reshaped by a fixed chain of five
//! stages whose coefficients come from an [`EmotionProfile`]:
//!
//! 1. silence trim ([`trim::trim_silence`])
//! 2. rate stretch ([`stretch::time_stretch`])
//! 3. pitch shift ([`pitch::pitch_shift`])
//! 4. energy gain ([`dynamics::apply_gain`])
//! 5. soft compression and peak normalization ([`dynamics::compress_and_normalize`])
//!
//! Each stage is a pure function from one [`Waveform`] to a new one and can
//! be exercised on its own. [`PostProcessor`] runs them in order. A stage
//! that fails is skipped and reported as a [`Degradation`]; the chain never
//! fails as a whole.
//!
//! [`EmotionProfile`]: moodvoice_types::EmotionProfile
//! [`Waveform`]: moodvoice_types::Waveform

pub mod chain;
pub mod dynamics;
pub mod error;
pub mod pitch;
pub mod resample;
pub mod stft;
pub mod stretch;
pub mod trim;

pub use chain::{Degradation, PostProcessor, Processed, Stage};
pub use error::StageError;
