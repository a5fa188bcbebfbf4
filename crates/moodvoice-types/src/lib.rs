//! Shared types for the moodvoice service.
//!
//! This crate holds the data model every other crate speaks: the
//! [`Waveform`] value that flows through the post-processing chain, the
//! [`EmotionProfile`] coefficient bundle that drives it, and the
//! [`VoiceCatalog`] advertised by the speech synthesizer.
//!
//! Nothing here performs I/O or signal processing. Validation of profile
//! coefficients lives here so that every consumer rejects bad values the
//! same way.

mod catalog;
mod profile;
mod waveform;

pub use catalog::{VoiceCatalog, VoiceResolution};
pub use profile::{
    builtin_profiles, EmotionProfile, ProfileError, ProfileParameters, DEFAULT_EMOTION,
};
pub use waveform::Waveform;

/// Normalizes a user-supplied emotion label for table lookups.
///
/// Labels are compared case-insensitively with surrounding whitespace ignored.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}
