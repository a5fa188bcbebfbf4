use serde::{Deserialize, Serialize};

/// The voices a synthesizer supports, plus the one it uses when asked for
/// something it does not have.
///
/// Single-speaker models advertise no voices and no default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceCatalog {
    pub voices: Vec<String>,
    pub default_voice: Option<String>,
}

/// Outcome of matching a preferred voice against a [`VoiceCatalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceResolution {
    /// The preferred voice is available.
    Preferred(String),
    /// The preferred voice is missing; `used` is the catalog default (if any).
    Fallback {
        requested: String,
        used: Option<String>,
    },
}

impl VoiceResolution {
    /// The voice identifier that will actually be passed to the synthesizer.
    pub fn voice(&self) -> Option<&str> {
        match self {
            Self::Preferred(voice) => Some(voice),
            Self::Fallback { used, .. } => used.as_deref(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

impl VoiceCatalog {
    /// Builds a catalog. The default is the first voice listed.
    pub fn new(voices: Vec<String>) -> Self {
        let default_voice = voices.first().cloned();
        Self {
            voices,
            default_voice,
        }
    }

    pub fn contains(&self, voice: &str) -> bool {
        self.voices.iter().any(|v| v == voice)
    }

    pub fn resolve(&self, preferred: &str) -> VoiceResolution {
        if !preferred.is_empty() && self.contains(preferred) {
            VoiceResolution::Preferred(preferred.to_string())
        } else {
            VoiceResolution::Fallback {
                requested: preferred.to_string(),
                used: self.default_voice.clone(),
            }
        }
    }
}
