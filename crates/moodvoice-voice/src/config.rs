use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

fn default_piper_binary() -> PathBuf {
    PathBuf::from("piper")
}

fn default_model_path() -> PathBuf {
    PathBuf::from("voices/en_GB-vctk-medium.onnx")
}

fn default_timeout_seconds() -> u64 {
    60
}

/// Settings for the Piper command-line synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiperConfig {
    /// Path to (or name on `PATH` of) the `piper` executable.
    #[serde(default = "default_piper_binary")]
    pub piper_binary: PathBuf,
    /// ONNX voice model. Multi-speaker models expose several voices.
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    /// Model JSON config. Defaults to `<model_path>.json`.
    #[serde(default)]
    pub config_path: Option<PathBuf>,
    /// Upper bound on a single synthesis run. Default: 60.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for PiperConfig {
    fn default() -> Self {
        Self {
            piper_binary: default_piper_binary(),
            model_path: default_model_path(),
            config_path: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl PiperConfig {
    pub fn new(piper_binary: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            piper_binary: piper_binary.into(),
            model_path: model_path.into(),
            ..Self::default()
        }
    }

    /// Resolved path of the model's JSON config.
    pub fn model_config_path(&self) -> PathBuf {
        self.config_path.clone().unwrap_or_else(|| {
            let mut path = self.model_path.clone().into_os_string();
            path.push(".json");
            PathBuf::from(path)
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_defaults_next_to_model() {
        let config = PiperConfig::new("piper", "voices/en_GB-vctk-medium.onnx");
        assert_eq!(
            config.model_config_path(),
            PathBuf::from("voices/en_GB-vctk-medium.onnx.json")
        );
    }

    #[test]
    fn explicit_config_path_wins() {
        let config = PiperConfig {
            config_path: Some(PathBuf::from("/etc/vctk.json")),
            ..PiperConfig::default()
        };
        assert_eq!(config.model_config_path(), PathBuf::from("/etc/vctk.json"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: PiperConfig = serde_json::from_str(r#"{"model_path": "m.onnx"}"#).unwrap();
        assert_eq!(config.piper_binary, PathBuf::from("piper"));
        assert_eq!(config.model_path, PathBuf::from("m.onnx"));
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }
}
