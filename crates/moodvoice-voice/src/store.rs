//! Persistence of waveforms as WAV artifacts.

use crate::error::StoreError;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use moodvoice_types::Waveform;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Extension of every artifact the store manages.
const ARTIFACT_EXTENSION: &str = "wav";

/// Suffix of the file a write goes to before it is renamed into place.
const PART_SUFFIX: &str = ".part";

/// What an artifact path is used for; determines its file name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Raw synthesizer output, deleted before the request completes.
    Temp,
    /// Final processed speech returned to the caller.
    Speech,
}

impl ArtifactKind {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Temp => "temp_",
            Self::Speech => "speech_",
        }
    }

    /// Classifies a file name produced by [`ArtifactStore::allocate`].
    ///
    /// A `.part` leftover from an interrupted write counts as the artifact
    /// it was meant to become.
    pub fn of_file_name(name: &str) -> Option<Self> {
        let name = name.strip_suffix(PART_SUFFIX).unwrap_or(name);
        let stem = name.strip_suffix(".wav")?;
        if stem.starts_with(Self::Temp.prefix()) {
            Some(Self::Temp)
        } else if stem.starts_with(Self::Speech.prefix()) {
            Some(Self::Speech)
        } else {
            None
        }
    }
}

/// Storage for waveform artifacts.
///
/// Implementations must be safe to share between concurrent requests.
pub trait ArtifactStore: Send + Sync {
    /// Directory (or namespace) holding the artifacts.
    fn root(&self) -> &Path;

    fn write(&self, path: &Path, wave: &Waveform) -> Result<(), StoreError>;

    fn read(&self, path: &Path) -> Result<Waveform, StoreError>;

    /// Removes an artifact. Removing a missing artifact succeeds.
    fn delete(&self, path: &Path) -> Result<(), StoreError>;

    /// Managed artifacts last modified more than `age` ago.
    fn list_older_than(&self, age: Duration) -> Result<Vec<PathBuf>, StoreError>;

    /// A fresh, never-reused path for an artifact of `kind`.
    fn allocate(&self, kind: ArtifactKind) -> PathBuf {
        self.root().join(format!(
            "{}{}.{}",
            kind.prefix(),
            Uuid::new_v4(),
            ARTIFACT_EXTENSION
        ))
    }
}

/// Stores artifacts as mono 16-bit PCM WAV files in a single directory.
#[derive(Debug, Clone)]
pub struct WavDirectoryStore {
    root: PathBuf,
}

impl WavDirectoryStore {
    /// Opens the store, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        Ok(Self { root })
    }
}

impl ArtifactStore for WavDirectoryStore {
    fn root(&self) -> &Path {
        &self.root
    }

    /// Writes to a sibling `.part` file and renames it into place, so a
    /// reader never observes a half-written artifact.
    fn write(&self, path: &Path, wave: &Waveform) -> Result<(), StoreError> {
        let mut partial = path.as_os_str().to_owned();
        partial.push(PART_SUFFIX);
        let partial = PathBuf::from(partial);

        if let Err(e) = write_wav(&partial, wave) {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
        fs::rename(&partial, path).map_err(|e| {
            let _ = fs::remove_file(&partial);
            StoreError::io(path, e)
        })
    }

    fn read(&self, path: &Path) -> Result<Waveform, StoreError> {
        read_wav(path)
    }

    fn delete(&self, path: &Path) -> Result<(), StoreError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    fn list_older_than(&self, age: Duration) -> Result<Vec<PathBuf>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.root, e)),
        };

        let now = SystemTime::now();
        let mut stale = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.root, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if ArtifactKind::of_file_name(name).is_none() {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                // Removed concurrently by another request.
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StoreError::io(entry.path(), e)),
            };
            let modified = metadata
                .modified()
                .map_err(|e| StoreError::io(entry.path(), e))?;
            if now.duration_since(modified).unwrap_or_default() > age {
                stale.push(entry.path());
            }
        }
        stale.sort();
        Ok(stale)
    }
}

/// Scoped ownership of a temporary artifact.
///
/// The artifact is deleted when the guard drops, on every exit path of the
/// owning scope, including early returns through `?` and unwinding.
pub struct TempArtifact<'a> {
    store: &'a dyn ArtifactStore,
    path: PathBuf,
}

impl<'a> TempArtifact<'a> {
    pub fn allocate(store: &'a dyn ArtifactStore) -> Self {
        let path = store.allocate(ArtifactKind::Temp);
        Self { store, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArtifact<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.store.delete(&self.path) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove temporary artifact"
            );
        }
    }
}

/// Writes `wave` as a mono 16-bit PCM WAV file. Samples are clamped to
/// \[-1.0, 1.0\].
pub fn write_wav(path: &Path, wave: &Waveform) -> Result<(), StoreError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: wave.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).map_err(|e| StoreError::wav(path, e))?;
    for &sample in &wave.samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        writer
            .write_sample(value)
            .map_err(|e| StoreError::wav(path, e))?;
    }
    writer.finalize().map_err(|e| StoreError::wav(path, e))
}

/// Reads a WAV file as mono `f32` samples, averaging channels if needed.
pub fn read_wav(path: &Path) -> Result<Waveform, StoreError> {
    let reader = WavReader::open(path).map_err(|e| StoreError::wav(path, e))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::wav(path, e))?,
        SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| StoreError::wav(path, e))?
        }
    };

    let samples = if channels > 1 {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        samples
    };

    Ok(Waveform::new(samples, spec.sample_rate))
}
