//! Background task for removing stale audio artifacts.

use moodvoice_voice::{sweep_stale, ArtifactStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Starts a background task that periodically sweeps the artifact store.
///
/// This task runs indefinitely.
///
/// # Arguments
///
/// * `store` - Artifact store to sweep.
/// * `interval` - Time to wait between sweeps.
/// * `max_age` - Artifacts older than this are removed.
pub async fn start_housekeeping_task(
    store: Arc<dyn ArtifactStore>,
    interval: Duration,
    max_age: Duration,
) {
    tracing::info!(
        interval_seconds = interval.as_secs(),
        max_age_seconds = max_age.as_secs(),
        "starting audio housekeeping task"
    );

    loop {
        sleep(interval).await;

        let store = store.clone();
        let result =
            tokio::task::spawn_blocking(move || sweep_stale(store.as_ref(), max_age)).await;

        match result {
            Ok(0) => tracing::debug!("no stale audio artifacts to remove"),
            Ok(count) => tracing::debug!(count, "housekeeping pass complete"),
            Err(e) => {
                tracing::error!(error = %e, "housekeeping task panicked or was cancelled");
            }
        }
    }
}
