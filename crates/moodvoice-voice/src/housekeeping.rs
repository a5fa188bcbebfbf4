//! Removal of stale audio artifacts.

use crate::store::ArtifactStore;
use std::time::Duration;

/// Default age after which artifacts are removed (one hour).
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(3600);

/// When and how aggressively the generator sweeps its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HousekeepingPolicy {
    /// Sweep before every generation request.
    pub sweep_before_generate: bool,
    pub max_age: Duration,
}

impl Default for HousekeepingPolicy {
    fn default() -> Self {
        Self {
            sweep_before_generate: true,
            max_age: DEFAULT_MAX_AGE,
        }
    }
}

/// Deletes managed artifacts older than `max_age`.
///
/// Never fails: listing and deletion errors are logged and the sweep moves
/// on. Returns the number of artifacts removed.
pub fn sweep_stale(store: &dyn ArtifactStore, max_age: Duration) -> usize {
    let stale = match store.list_older_than(max_age) {
        Ok(stale) => stale,
        Err(e) => {
            tracing::warn!(error = %e, "failed to list stale artifacts");
            return 0;
        }
    };

    let mut removed = 0;
    for path in stale {
        match store.delete(&path) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(error = %e, "failed to remove stale artifact"),
        }
    }

    if removed > 0 {
        tracing::info!(removed, root = %store.root().display(), "swept stale audio artifacts");
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ArtifactKind, WavDirectoryStore};
    use moodvoice_types::Waveform;
    use std::fs::File;
    use std::time::SystemTime;

    #[test]
    fn removes_only_artifacts_past_max_age() {
        let dir = tempfile::tempdir().unwrap();
        let store = WavDirectoryStore::open(dir.path()).unwrap();
        let wave = Waveform::new(vec![0.1; 8], 8_000);

        let old = store.allocate(ArtifactKind::Speech);
        let fresh = store.allocate(ArtifactKind::Speech);
        store.write(&old, &wave).unwrap();
        store.write(&fresh, &wave).unwrap();
        File::options()
            .write(true)
            .open(&old)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(2 * 3600))
            .unwrap();

        assert_eq!(sweep_stale(&store, DEFAULT_MAX_AGE), 1);
        assert!(!old.exists());
        assert!(fresh.exists());
        assert_eq!(sweep_stale(&store, DEFAULT_MAX_AGE), 0);
    }

    #[test]
    fn removes_abandoned_partial_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = WavDirectoryStore::open(dir.path()).unwrap();
        let partial = dir.path().join("speech_interrupted.wav.part");
        std::fs::write(&partial, b"RIFF").unwrap();
        File::options()
            .write(true)
            .open(&partial)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(2 * 3600))
            .unwrap();

        assert_eq!(sweep_stale(&store, DEFAULT_MAX_AGE), 1);
        assert!(!partial.exists());
    }

    #[test]
    fn missing_directory_sweeps_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = WavDirectoryStore::open(dir.path().join("audio")).unwrap();
        std::fs::remove_dir(store.root()).unwrap();
        assert_eq!(sweep_stale(&store, Duration::ZERO), 0);
    }
}
