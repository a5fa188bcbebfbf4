use moodvoice_dsp::Stage;
use moodvoice_types::{VoiceCatalog, Waveform};
use moodvoice_voice::store::write_wav;
use moodvoice_voice::{
    ArtifactKind, ArtifactStore, EmotionTable, GenerationError, HousekeepingPolicy,
    SpeechGenerator, StoreError, SynthesisError, Synthesizer, WavDirectoryStore,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

const SAMPLE_RATE: u32 = 22_050;

/// Test double for the external synthesizer: writes one second of a 220 Hz
/// tone framed by silence, or fails on demand.
struct FakeSynthesizer {
    catalog: VoiceCatalog,
    fail: bool,
    silent: bool,
    calls: AtomicUsize,
    voices_seen: Mutex<Vec<Option<String>>>,
    temp_paths: Mutex<Vec<PathBuf>>,
}

impl FakeSynthesizer {
    fn new(voices: &[&str]) -> Self {
        Self {
            catalog: VoiceCatalog::new(voices.iter().map(|v| v.to_string()).collect()),
            fail: false,
            silent: false,
            calls: AtomicUsize::new(0),
            voices_seen: Mutex::new(Vec::new()),
            temp_paths: Mutex::new(Vec::new()),
        }
    }

    fn vctk() -> Self {
        Self::new(&["p224", "p228", "p229"])
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::vctk()
        }
    }

    fn silent() -> Self {
        Self {
            silent: true,
            ..Self::vctk()
        }
    }
}

impl Synthesizer for FakeSynthesizer {
    fn catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn model_name(&self) -> &str {
        "fake-vctk"
    }

    fn synthesize_to_file(
        &self,
        _text: &str,
        voice: Option<&str>,
        output: &Path,
    ) -> Result<(), SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.voices_seen
            .lock()
            .unwrap()
            .push(voice.map(str::to_string));
        self.temp_paths.lock().unwrap().push(output.to_path_buf());

        if self.fail {
            // Leave a partial file behind, like a crashed model would.
            fs::write(output, b"RIFF").unwrap();
            return Err(SynthesisError::Failed {
                status: "exit status: 1".into(),
                stderr: "model exploded".into(),
            });
        }

        let silence = vec![0.0f32; SAMPLE_RATE as usize / 4];
        let tone: Vec<f32> = if self.silent {
            vec![0.0; SAMPLE_RATE as usize]
        } else {
            (0..SAMPLE_RATE)
                .map(|i| {
                    0.4 * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / SAMPLE_RATE as f32)
                        .sin()
                })
                .collect()
        };
        let samples = [silence.clone(), tone, silence].concat();
        write_wav(output, &Waveform::new(samples, SAMPLE_RATE))
            .map_err(|e| SynthesisError::Backend(e.to_string()))
    }
}

fn generator(dir: &Path, synth: Arc<FakeSynthesizer>) -> SpeechGenerator {
    let store = WavDirectoryStore::open(dir).unwrap();
    SpeechGenerator::new(EmotionTable::builtin(), synth, Arc::new(store))
}

fn files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    files.sort();
    files
}

#[test]
fn hello_world_in_youngwoman_voice() {
    let dir = tempfile::tempdir().unwrap();
    let synth = Arc::new(FakeSynthesizer::vctk());
    let generator = generator(dir.path(), synth.clone());

    let artifact = generator.generate("hello world", "youngwoman").unwrap();

    assert_eq!(artifact.emotion, "youngwoman");
    assert!(artifact.duration_seconds > 0.0);
    assert_eq!(artifact.voice_used.as_deref(), Some("p224"));
    assert_eq!(artifact.configured_voice, "p224");
    assert_eq!(artifact.parameters.speed, 1.04);
    assert_eq!(artifact.sample_rate, SAMPLE_RATE);
    assert!(artifact.degraded_stages.is_empty());
    assert_eq!(
        synth.voices_seen.lock().unwrap().as_slice(),
        &[Some("p224".to_string())]
    );

    // Only the final artifact remains.
    assert_eq!(files_in(dir.path()), vec![artifact.path.clone()]);
    let name = artifact.path.file_name().unwrap().to_str().unwrap();
    assert_eq!(ArtifactKind::of_file_name(name), Some(ArtifactKind::Speech));

    // Trimmed of the framing silence and stretched by 1/1.04.
    let wave = moodvoice_voice::store::read_wav(&artifact.path).unwrap();
    assert!((wave.peak() - 1.0).abs() < 1e-3);
    assert!(artifact.duration_seconds < 1.5 / 1.04);
    assert!((wave.duration_seconds() - artifact.duration_seconds).abs() < 1e-6);
}

#[test]
fn unknown_emotion_creates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let synth = Arc::new(FakeSynthesizer::vctk());
    let generator = generator(dir.path(), synth.clone());

    let err = generator.generate("hi", "robot").unwrap_err();

    match err {
        GenerationError::InvalidEmotion(label) => assert_eq!(label, "robot"),
        other => panic!("expected InvalidEmotion, got {other:?}"),
    }
    assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
    assert!(files_in(dir.path()).is_empty());
}

#[test]
fn concurrent_requests_never_collide() {
    let dir = tempfile::tempdir().unwrap();
    let synth = Arc::new(FakeSynthesizer::vctk());
    let generator = generator(dir.path(), synth.clone());

    let (a, b) = std::thread::scope(|s| {
        let a = s.spawn(|| generator.generate("first request", "oldman"));
        let b = s.spawn(|| generator.generate("second request", "oldman"));
        (a.join().unwrap(), b.join().unwrap())
    });
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a.path, b.path);
    let temps = synth.temp_paths.lock().unwrap();
    assert_eq!(temps.len(), 2);
    assert_ne!(temps[0], temps[1]);
    assert!(!temps.contains(&a.path) && !temps.contains(&b.path));

    let mut expected = vec![a.path, b.path];
    expected.sort();
    assert_eq!(files_in(dir.path()), expected);
}

#[test]
fn synthesis_failure_removes_temporary_file() {
    let dir = tempfile::tempdir().unwrap();
    let synth = Arc::new(FakeSynthesizer::failing());
    let generator = generator(dir.path(), synth.clone());

    let err = generator.generate("hello", "youngmale").unwrap_err();

    assert!(matches!(err, GenerationError::Synthesis(_)), "{err:?}");
    assert!(!err.is_client_error());
    let temps = synth.temp_paths.lock().unwrap();
    assert_eq!(temps.len(), 1);
    assert!(!temps[0].exists());
    assert!(files_in(dir.path()).is_empty());
}

/// Store whose disk is full: reads and deletes work, writes never land.
struct FullDiskStore(WavDirectoryStore);

impl ArtifactStore for FullDiskStore {
    fn root(&self) -> &Path {
        self.0.root()
    }

    fn write(&self, path: &Path, _wave: &Waveform) -> Result<(), StoreError> {
        Err(StoreError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::other("disk full"),
        })
    }

    fn read(&self, path: &Path) -> Result<Waveform, StoreError> {
        self.0.read(path)
    }

    fn delete(&self, path: &Path) -> Result<(), StoreError> {
        self.0.delete(path)
    }

    fn list_older_than(&self, age: Duration) -> Result<Vec<PathBuf>, StoreError> {
        self.0.list_older_than(age)
    }
}

#[test]
fn persistence_failure_leaves_no_files() {
    let dir = tempfile::tempdir().unwrap();
    let synth = Arc::new(FakeSynthesizer::vctk());
    let store = FullDiskStore(WavDirectoryStore::open(dir.path()).unwrap());
    let generator = SpeechGenerator::new(EmotionTable::builtin(), synth.clone(), Arc::new(store));

    let err = generator.generate("hello", "youngwoman").unwrap_err();

    assert!(
        matches!(err, GenerationError::Persistence(StoreError::Io { .. })),
        "{err:?}"
    );
    assert!(!err.is_client_error());
    let temps = synth.temp_paths.lock().unwrap();
    assert_eq!(temps.len(), 1);
    assert!(!temps[0].exists());
    assert!(files_in(dir.path()).is_empty());
}

#[test]
fn unavailable_voice_falls_back_to_catalog_default() {
    let dir = tempfile::tempdir().unwrap();
    let synth = Arc::new(FakeSynthesizer::new(&["p225", "p226"]));
    let generator = generator(dir.path(), synth.clone());

    let artifact = generator.generate("hello", "oldman").unwrap();

    assert_eq!(artifact.configured_voice, "p228");
    assert_eq!(artifact.voice_used.as_deref(), Some("p225"));
    assert_eq!(
        synth.voices_seen.lock().unwrap().as_slice(),
        &[Some("p225".to_string())]
    );
}

#[test]
fn single_speaker_model_gets_no_voice() {
    let dir = tempfile::tempdir().unwrap();
    let synth = Arc::new(FakeSynthesizer::new(&[]));
    let generator = generator(dir.path(), synth.clone());

    let artifact = generator.generate("hello", "youngmale").unwrap();

    assert_eq!(artifact.voice_used, None);
    assert_eq!(synth.voices_seen.lock().unwrap().as_slice(), &[None]);
}

#[test]
fn silent_synthesis_degrades_instead_of_failing() {
    let dir = tempfile::tempdir().unwrap();
    let generator = generator(dir.path(), Arc::new(FakeSynthesizer::silent()));

    // Trimming leaves nothing; stretch and pitch shift cannot run on it.
    let artifact = generator.generate("hello", "oldman").unwrap();

    assert_eq!(artifact.duration_seconds, 0.0);
    assert_eq!(
        artifact.degraded_stages,
        vec![Stage::RateStretch, Stage::PitchShift]
    );
    assert!(artifact.path.exists());
}

#[test]
fn stale_artifacts_are_swept_before_generating() {
    let dir = tempfile::tempdir().unwrap();
    let store = WavDirectoryStore::open(dir.path()).unwrap();
    let stale = store.allocate(ArtifactKind::Speech);
    store
        .write(&stale, &Waveform::new(vec![0.1; 16], SAMPLE_RATE))
        .unwrap();
    fs::File::options()
        .write(true)
        .open(&stale)
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(2 * 3600))
        .unwrap();

    let generator = generator(dir.path(), Arc::new(FakeSynthesizer::vctk()));
    let artifact = generator.generate("hello", "youngmale").unwrap();

    assert!(!stale.exists());
    assert_eq!(files_in(dir.path()), vec![artifact.path]);
}

#[test]
fn sweeping_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let store = WavDirectoryStore::open(dir.path()).unwrap();
    let stale = store.allocate(ArtifactKind::Temp);
    store
        .write(&stale, &Waveform::new(vec![0.1; 16], SAMPLE_RATE))
        .unwrap();
    fs::File::options()
        .write(true)
        .open(&stale)
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(2 * 3600))
        .unwrap();

    let generator =
        generator(dir.path(), Arc::new(FakeSynthesizer::vctk())).with_housekeeping(
            HousekeepingPolicy {
                sweep_before_generate: false,
                ..HousekeepingPolicy::default()
            },
        );
    generator.generate("hello", "youngmale").unwrap();

    assert!(stale.exists());
}
