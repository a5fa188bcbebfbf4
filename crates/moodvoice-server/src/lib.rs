//! Moodvoice server library logic.

pub mod api;
pub mod config;
pub mod housekeeping;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use moodvoice_voice::SpeechGenerator;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Speech generation pipeline.
    pub generator: Arc<SpeechGenerator>,
    /// Directory holding generated audio, served at [`api::AUDIO_URL_PREFIX`].
    pub audio_dir: PathBuf,
    /// Static web client, if configured.
    pub client_dir: Option<PathBuf>,
}

/// Maximum request body size (1 MiB). Text is capped at 64 KiB anyway.
const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(api::health_handler))
        .route("/generate", post(api::generate_handler))
        .nest_service(api::AUDIO_URL_PREFIX, ServeDir::new(&state.audio_dir));

    let router = match &state.client_dir {
        Some(client_dir) if client_dir.join("index.html").exists() => {
            tracing::info!(path = %client_dir.display(), "serving client static files");
            let index = client_dir.join("index.html");
            router.fallback_service(ServeDir::new(client_dir).fallback(ServeFile::new(index)))
        }
        Some(client_dir) => {
            tracing::info!(
                path = %client_dir.display(),
                "client directory not found, skipping static file serving"
            );
            router
        }
        None => router,
    };

    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
