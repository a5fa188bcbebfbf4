//! HTTP handlers for speech generation and health reporting.

use crate::AppState;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use moodvoice_dsp::Stage;
use moodvoice_types::{ProfileParameters, DEFAULT_EMOTION};
use moodvoice_voice::{GenerationArtifact, GenerationError, SynthesisError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// URL prefix under which generated audio is served.
pub const AUDIO_URL_PREFIX: &str = "/static/audio";

fn default_emotion() -> String {
    DEFAULT_EMOTION.to_string()
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub text: String,
    #[serde(default = "default_emotion")]
    pub emotion: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub audio_path: String,
    pub audio_url: String,
    pub emotion: String,
    pub duration_seconds: f64,
    pub voice_used: Option<String>,
    pub configured_voice: String,
    pub profile_parameters: ProfileParameters,
    pub degraded_stages: Vec<Stage>,
}

impl From<GenerationArtifact> for GenerateResponse {
    fn from(artifact: GenerationArtifact) -> Self {
        let file_name = artifact
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            audio_path: artifact.path.display().to_string(),
            audio_url: format!("{AUDIO_URL_PREFIX}/{file_name}"),
            emotion: artifact.emotion,
            duration_seconds: artifact.duration_seconds,
            voice_used: artifact.voice_used,
            configured_voice: artifact.configured_voice,
            profile_parameters: artifact.parameters,
            degraded_stages: artifact.degraded_stages,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub synthesizer_ready: bool,
    pub model: String,
    pub emotion_profiles: BTreeMap<String, String>,
    pub available_voices: Vec<String>,
    pub default_voice: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<GenerationError> for ApiError {
    fn from(e: GenerationError) -> Self {
        match e {
            GenerationError::InvalidEmotion(_) | GenerationError::InvalidInput(_) => {
                ApiError::BadRequest(e.to_string())
            }
            GenerationError::Synthesis(SynthesisError::Spawn(_) | SynthesisError::Config(_)) => {
                ApiError::ServiceUnavailable(e.to_string())
            }
            GenerationError::Synthesis(_) | GenerationError::Persistence(_) => {
                ApiError::InternalServerError(e.to_string())
            }
        }
    }
}

/// Handler for `POST /generate`.
pub async fn generate_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let generator = state.generator.clone();
    let artifact =
        tokio::task::spawn_blocking(move || generator.generate(&payload.text, &payload.emotion))
            .await
            .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok(Json(artifact.into()))
}

/// Handler for `GET /health`.
///
/// Always `200 OK`; `status` is `"degraded"` while the synthesizer model is
/// unavailable.
pub async fn health_handler(Extension(state): Extension<Arc<AppState>>) -> Json<HealthResponse> {
    let snapshot = state.generator.health();
    Json(HealthResponse {
        status: if snapshot.synthesizer_ready {
            "ok"
        } else {
            "degraded"
        },
        version: env!("CARGO_PKG_VERSION"),
        synthesizer_ready: snapshot.synthesizer_ready,
        model: snapshot.model,
        emotion_profiles: snapshot.emotion_profiles,
        available_voices: snapshot.catalog.voices,
        default_voice: snapshot.catalog.default_voice,
    })
}
