use crate::error::{GenerationError, SynthesisError};
use crate::housekeeping::{sweep_stale, HousekeepingPolicy};
use crate::store::{ArtifactKind, ArtifactStore, TempArtifact};
use crate::synth::{Synthesizer, MAX_TTS_INPUT_BYTES};
use crate::table::EmotionTable;
use moodvoice_dsp::{PostProcessor, Stage};
use moodvoice_types::{normalize_label, ProfileParameters, VoiceCatalog, VoiceResolution};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// The result of one successful generation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationArtifact {
    /// Location of the final WAV file in the artifact store.
    pub path: PathBuf,
    /// Normalized emotion label.
    pub emotion: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    /// Voice passed to the synthesizer. Differs from `configured_voice` after
    /// a fallback; `None` when the model has a single unnamed voice.
    pub voice_used: Option<String>,
    /// Voice the emotion profile asked for.
    pub configured_voice: String,
    pub parameters: ProfileParameters,
    /// Post-processing stages that failed and were skipped.
    pub degraded_stages: Vec<Stage>,
}

impl GenerationArtifact {
    pub fn voice_fell_back(&self) -> bool {
        self.voice_used.as_deref() != Some(self.configured_voice.as_str())
    }
}

/// Read-only view of the generator for health reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthSnapshot {
    pub synthesizer_ready: bool,
    pub model: String,
    /// Emotion label to preferred voice.
    pub emotion_profiles: BTreeMap<String, String>,
    pub catalog: VoiceCatalog,
}

/// Turns text plus an emotion label into a persisted, post-processed WAV.
///
/// All state is read-only after construction; one generator is shared by
/// every request.
pub struct SpeechGenerator {
    profiles: EmotionTable,
    synthesizer: Arc<dyn Synthesizer>,
    store: Arc<dyn ArtifactStore>,
    housekeeping: HousekeepingPolicy,
    processor: PostProcessor,
}

impl SpeechGenerator {
    pub fn new(
        profiles: EmotionTable,
        synthesizer: Arc<dyn Synthesizer>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            profiles,
            synthesizer,
            store,
            housekeeping: HousekeepingPolicy::default(),
            processor: PostProcessor::new(),
        }
    }

    pub fn with_housekeeping(mut self, housekeeping: HousekeepingPolicy) -> Self {
        self.housekeeping = housekeeping;
        self
    }

    pub fn profiles(&self) -> &EmotionTable {
        &self.profiles
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    pub fn housekeeping(&self) -> HousekeepingPolicy {
        self.housekeeping
    }

    /// Generates speech for `text` in the style of `emotion`.
    ///
    /// The raw synthesizer output lives in a temporary artifact that is
    /// removed before this returns, whatever the outcome. A DSP stage that
    /// fails is skipped and reported in
    /// [`GenerationArtifact::degraded_stages`] rather than failing the request.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `text` is blank or larger than 64 KiB.
    /// - `InvalidEmotion` if no profile matches `emotion`.
    /// - `Synthesis` if the synthesizer fails or its output cannot be read.
    /// - `Persistence` if the final artifact cannot be written.
    pub fn generate(
        &self,
        text: &str,
        emotion: &str,
    ) -> Result<GenerationArtifact, GenerationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::InvalidInput("text must not be empty".into()));
        }
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(GenerationError::InvalidInput(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_TTS_INPUT_BYTES
            )));
        }

        let label = normalize_label(emotion);
        let profile = self
            .profiles
            .lookup(&label)
            .ok_or_else(|| GenerationError::InvalidEmotion(emotion.trim().to_string()))?;

        if self.housekeeping.sweep_before_generate {
            sweep_stale(self.store.as_ref(), self.housekeeping.max_age);
        }

        let resolution = self.synthesizer.catalog().resolve(&profile.voice);
        if let VoiceResolution::Fallback { requested, used } = &resolution {
            tracing::warn!(
                emotion = %label,
                requested = %requested,
                used = ?used,
                "configured voice unavailable, falling back to default voice"
            );
        }
        let voice = resolution.voice();

        let temp = TempArtifact::allocate(self.store.as_ref());
        let final_path = self.store.allocate(ArtifactKind::Speech);

        tracing::debug!(emotion = %label, voice = ?voice, chars = text.chars().count(), "synthesizing");
        if let Err(e) = self.synthesizer.synthesize_to_file(text, voice, temp.path()) {
            tracing::error!(error = %e, emotion = %label, voice = ?voice, "speech synthesis failed");
            return Err(e.into());
        }

        let raw = self.store.read(temp.path()).map_err(|e| {
            SynthesisError::Output(format!("failed to read synthesizer output: {e}"))
        })?;

        let processed = self.processor.process(&raw, profile);
        if processed.is_degraded() {
            tracing::warn!(
                emotion = %label,
                stages = ?processed.degraded_stages(),
                "post-processing degraded"
            );
        }

        if let Err(e) = self.store.write(&final_path, &processed.waveform) {
            tracing::error!(error = %e, path = %final_path.display(), "failed to persist audio");
            return Err(GenerationError::Persistence(e));
        }

        let artifact = GenerationArtifact {
            path: final_path,
            emotion: label,
            duration_seconds: processed.waveform.duration_seconds(),
            sample_rate: processed.waveform.sample_rate,
            voice_used: voice.map(str::to_string),
            configured_voice: profile.voice.clone(),
            parameters: profile.parameters(),
            degraded_stages: processed.degraded_stages(),
        };
        tracing::info!(
            emotion = %artifact.emotion,
            voice = ?artifact.voice_used,
            duration_seconds = artifact.duration_seconds,
            path = %artifact.path.display(),
            "generated speech"
        );
        Ok(artifact)
    }

    pub fn health(&self) -> HealthSnapshot {
        HealthSnapshot {
            synthesizer_ready: self.synthesizer.is_ready(),
            model: self.synthesizer.model_name().to_string(),
            emotion_profiles: self.profiles.voices(),
            catalog: self.synthesizer.catalog().clone(),
        }
    }
}
