use crate::config::PiperConfig;
use crate::error::SynthesisError;
use moodvoice_types::VoiceCatalog;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Maximum text input size for synthesis (64 KiB). Prevents resource
/// exhaustion from oversized requests.
pub const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// How often a running synthesizer process is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A text-to-speech engine producing neutral speech.
///
/// Implementations are called from blocking threads and may be shared
/// between concurrent requests.
pub trait Synthesizer: Send + Sync {
    /// Voices this synthesizer can render.
    fn catalog(&self) -> &VoiceCatalog;

    /// Whether the backing model is available.
    fn is_ready(&self) -> bool;

    /// Human-readable name of the model, for health reporting.
    fn model_name(&self) -> &str;

    /// Renders `text` with `voice` (or the model's only voice when `None`)
    /// and writes a WAV file to `output`.
    fn synthesize_to_file(
        &self,
        text: &str,
        voice: Option<&str>,
        output: &Path,
    ) -> Result<(), SynthesisError>;
}

#[derive(Debug, Default, Deserialize)]
struct ModelConfig {
    #[serde(default)]
    speaker_id_map: BTreeMap<String, i64>,
}

/// Drives the `piper` command-line synthesizer.
///
/// Voices are the speaker names of a multi-speaker model, read from the
/// `speaker_id_map` of the model's JSON config. The default voice is the
/// speaker with the lowest id.
#[derive(Debug, Clone)]
pub struct PiperSynthesizer {
    config: PiperConfig,
    speakers: BTreeMap<String, i64>,
    catalog: VoiceCatalog,
    model_name: String,
}

impl PiperSynthesizer {
    /// Loads the model config and builds the voice catalog.
    ///
    /// A missing model config is not an error: the model is treated as
    /// single-speaker and [`is_ready`](Synthesizer::is_ready) reports whether
    /// the model file itself exists.
    ///
    /// # Errors
    ///
    /// Returns `SynthesisError::Config` if the model config exists but cannot
    /// be read or parsed.
    pub fn load(config: PiperConfig) -> Result<Self, SynthesisError> {
        let config_path = config.model_config_path();
        let model_config = match fs::read_to_string(&config_path) {
            Ok(raw) => serde_json::from_str::<ModelConfig>(&raw).map_err(|e| {
                SynthesisError::Config(format!("{}: {e}", config_path.display()))
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(
                    path = %config_path.display(),
                    "piper model config not found; assuming a single-speaker model"
                );
                ModelConfig::default()
            }
            Err(e) => {
                return Err(SynthesisError::Config(format!(
                    "{}: {e}",
                    config_path.display()
                )))
            }
        };

        let catalog = catalog_from_speaker_map(&model_config.speaker_id_map);
        let model_name = config
            .model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| config.model_path.display().to_string());

        tracing::info!(
            model = %model_name,
            voices = catalog.voices.len(),
            default_voice = ?catalog.default_voice,
            "loaded piper voice catalog"
        );

        Ok(Self {
            config,
            speakers: model_config.speaker_id_map,
            catalog,
            model_name,
        })
    }

    pub fn config(&self) -> &PiperConfig {
        &self.config
    }

    fn speaker_id(&self, voice: Option<&str>) -> Result<Option<i64>, SynthesisError> {
        match voice {
            None => Ok(None),
            Some(voice) => self
                .speakers
                .get(voice)
                .copied()
                .map(Some)
                .ok_or_else(|| SynthesisError::UnknownVoice(voice.to_string())),
        }
    }
}

impl Synthesizer for PiperSynthesizer {
    fn catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    fn is_ready(&self) -> bool {
        self.config.model_path.is_file()
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn synthesize_to_file(
        &self,
        text: &str,
        voice: Option<&str>,
        output: &Path,
    ) -> Result<(), SynthesisError> {
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(SynthesisError::Backend(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_TTS_INPUT_BYTES
            )));
        }
        if !self.is_ready() {
            return Err(SynthesisError::Config(format!(
                "model file not found: {}",
                self.config.model_path.display()
            )));
        }
        let speaker = self.speaker_id(voice)?;

        let mut command = Command::new(&self.config.piper_binary);
        command
            .arg("--model")
            .arg(&self.config.model_path)
            .arg("--config")
            .arg(self.config.model_config_path())
            .arg("--output_file")
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        if let Some(speaker) = speaker {
            command.arg("--speaker").arg(speaker.to_string());
        }

        tracing::debug!(voice = ?voice, speaker = ?speaker, output = %output.display(), "running piper");
        let mut child = command
            .spawn()
            .map_err(|e| SynthesisError::Spawn(e.to_string()))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| SynthesisError::Spawn("failed to open stdin".to_string()))?;
        let text_owned = text.to_string();
        // Written on its own thread so a child that stops reading cannot block us.
        let writer = thread::spawn(move || stdin.write_all(text_owned.as_bytes()));

        let mut stderr_pipe = child.stderr.take();
        let stderr_reader = thread::spawn(move || {
            let mut buf = String::new();
            if let Some(pipe) = stderr_pipe.as_mut() {
                let _ = pipe.read_to_string(&mut buf);
            }
            buf
        });

        let timeout = self.config.timeout();
        let status = match wait_with_timeout(&mut child, timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SynthesisError::Timeout(timeout.as_secs()));
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SynthesisError::Backend(format!(
                    "failed to wait for piper: {e}"
                )));
            }
        };
        let stderr = stderr_reader.join().unwrap_or_default();

        if !status.success() {
            return Err(SynthesisError::Failed {
                status: status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        match writer.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(SynthesisError::Backend(format!(
                    "failed to write to piper stdin: {e}"
                )))
            }
            Err(_) => {
                return Err(SynthesisError::Backend(
                    "stdin writer thread panicked".to_string(),
                ))
            }
        }

        match fs::metadata(output) {
            Ok(meta) if meta.len() > 0 => Ok(()),
            Ok(_) => Err(SynthesisError::Output(format!(
                "{} is empty",
                output.display()
            ))),
            Err(e) => Err(SynthesisError::Output(format!(
                "{}: {e}",
                output.display()
            ))),
        }
    }
}

/// Builds a catalog from a Piper `speaker_id_map`, ordered by speaker id.
pub fn catalog_from_speaker_map(speakers: &BTreeMap<String, i64>) -> VoiceCatalog {
    let mut by_id: Vec<(&String, &i64)> = speakers.iter().collect();
    by_id.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)));
    VoiceCatalog::new(by_id.into_iter().map(|(name, _)| name.clone()).collect())
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
