//! Moodvoice server binary: emotion-colored text-to-speech over HTTP.
//!
//! Starts an axum HTTP server with structured logging, a Piper-backed
//! speech generator, and graceful shutdown on SIGTERM/SIGINT.

use moodvoice_server::config::{self, Config};
use moodvoice_server::housekeeping::start_housekeeping_task;
use moodvoice_server::{app, AppState};
use moodvoice_voice::{
    ArtifactStore, EmotionTable, PiperSynthesizer, SpeechGenerator, WavDirectoryStore,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("MOODVOICE_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

fn emotion_table(config: &Config) -> EmotionTable {
    if config.emotions.is_empty() {
        return EmotionTable::builtin();
    }
    EmotionTable::from_profiles(config.emotions.clone())
        .expect("invalid emotion profile in configuration")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    let profiles = emotion_table(&config);
    tracing::info!(
        emotions = ?profiles.labels().collect::<Vec<_>>(),
        "loaded emotion profiles"
    );

    let synthesizer = PiperSynthesizer::load(config.synthesizer.clone())
        .expect("failed to load piper voice model config");
    if !moodvoice_voice::Synthesizer::is_ready(&synthesizer) {
        tracing::warn!(
            model = %config.synthesizer.model_path.display(),
            "piper model not found; generation requests will fail until it is installed"
        );
    }

    let store: Arc<dyn ArtifactStore> = Arc::new(
        WavDirectoryStore::open(&config.storage.audio_dir)
            .expect("failed to create audio directory (check storage.audio_dir)"),
    );

    let generator = SpeechGenerator::new(profiles, Arc::new(synthesizer), store.clone())
        .with_housekeeping(config.storage.housekeeping());

    if config.storage.sweep_interval_seconds > 0 {
        tokio::spawn(start_housekeeping_task(
            store,
            Duration::from_secs(config.storage.sweep_interval_seconds),
            config.storage.max_age(),
        ));
    }

    // Build application
    let app = app(AppState {
        generator: Arc::new(generator),
        audio_dir: config.storage.audio_dir.clone(),
        client_dir: config.client_dir.clone(),
    });
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting moodvoice server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("moodvoice server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
