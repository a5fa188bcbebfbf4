//! Server configuration loading from file and environment variables.

use moodvoice_types::EmotionProfile;
use moodvoice_voice::{HousekeepingPolicy, PiperConfig};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Audio artifact storage.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Piper synthesizer settings.
    #[serde(default)]
    pub synthesizer: PiperConfig,

    /// Emotion profiles by label. Empty means the built-in table.
    #[serde(default)]
    pub emotions: BTreeMap<String, EmotionProfile>,

    /// Static web client served for unmatched routes, if present.
    #[serde(default)]
    pub client_dir: Option<PathBuf>,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "moodvoice_dsp=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Where generated audio lives and how long it is kept.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory for temporary and final WAV artifacts. Served at `/static/audio`.
    #[serde(default = "default_audio_dir")]
    pub audio_dir: PathBuf,

    /// Artifacts older than this are removed by housekeeping.
    #[serde(default = "default_max_age_seconds")]
    pub max_age_seconds: u64,

    /// Sweep stale artifacts before each generation request.
    #[serde(default = "default_true")]
    pub sweep_before_generate: bool,

    /// Period of the background sweep. Zero disables the task.
    #[serde(default)]
    pub sweep_interval_seconds: u64,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    5001
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_audio_dir() -> PathBuf {
    PathBuf::from("static/audio")
}

fn default_max_age_seconds() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            audio_dir: default_audio_dir(),
            max_age_seconds: default_max_age_seconds(),
            sweep_before_generate: true,
            sweep_interval_seconds: 0,
        }
    }
}

impl StorageConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_seconds)
    }

    pub fn housekeeping(&self) -> HousekeepingPolicy {
        HousekeepingPolicy {
            sweep_before_generate: self.sweep_before_generate,
            max_age: self.max_age(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The file parsed but holds values the server cannot run with.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Checks constraints that span sections.
    ///
    /// Housekeeping must never reach an artifact an in-flight request still
    /// owns, so `storage.max_age_seconds` has to exceed the synthesizer
    /// timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.max_age_seconds <= self.synthesizer.timeout_seconds {
            return Err(ConfigError::Invalid(format!(
                "storage.max_age_seconds ({}) must be greater than synthesizer.timeout_seconds ({})",
                self.storage.max_age_seconds, self.synthesizer.timeout_seconds
            )));
        }
        Ok(())
    }
}

/// Parses configuration from TOML text.
///
/// # Errors
///
/// Returns `ConfigError::Parse` on malformed TOML or mistyped values and
/// `ConfigError::Invalid` when [`Config::validate`] rejects the result.
pub fn parse_config(contents: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(contents)?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `MOODVOICE_HOST` overrides `server.host`
/// - `MOODVOICE_PORT` overrides `server.port`
/// - `MOODVOICE_AUDIO_DIR` overrides `storage.audio_dir`
/// - `MOODVOICE_PIPER_BINARY` overrides `synthesizer.piper_binary`
/// - `MOODVOICE_MODEL_PATH` overrides `synthesizer.model_path`
/// - `MOODVOICE_LOG_LEVEL` overrides `logging.level`
/// - `MOODVOICE_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => parse_config(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies `MOODVOICE_*` overrides using `lookup` to read variables.
///
/// Unparseable host or port values are ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("MOODVOICE_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = lookup("MOODVOICE_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(dir) = lookup("MOODVOICE_AUDIO_DIR") {
        config.storage.audio_dir = PathBuf::from(dir);
    }
    if let Some(binary) = lookup("MOODVOICE_PIPER_BINARY") {
        config.synthesizer.piper_binary = PathBuf::from(binary);
    }
    if let Some(model) = lookup("MOODVOICE_MODEL_PATH") {
        config.synthesizer.model_path = PathBuf::from(model);
    }
    if let Some(level) = lookup("MOODVOICE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("MOODVOICE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}
