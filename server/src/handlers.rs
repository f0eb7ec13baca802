use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tts_core::SpeechAudio;

use crate::error::ApiError;
use crate::metrics::MetricsResponse;
use crate::validation::{validate_identifier, validate_speech_request};
use crate::AppState;

/// Body of `POST /v1/audio/speech`. Unset fields take the pipeline defaults.
#[derive(Debug, Default, Deserialize)]
pub struct SpeechRequest {
    /// Accepted for client compatibility; the loaded model is always used.
    pub model: Option<String>,
    pub input: Option<String>,
    pub voice: Option<String>,
    pub speed: Option<f32>,
    pub lang_code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub object: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelInfo>,
}

pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_models(State(state): State<AppState>) -> Json<ModelList> {
    Json(ModelList {
        object: "list".to_string(),
        data: vec![ModelInfo {
            id: state.pipeline.model_id().to_string(),
            object: "model".to_string(),
        }],
    })
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(state.metrics.snapshot())
}

pub async fn create_speech(
    State(state): State<AppState>,
    Json(req): Json<SpeechRequest>,
) -> Result<Response, ApiError> {
    let start = Instant::now();
    let result = synthesize(&state, req).await;
    let latency_ms = start.elapsed().as_millis() as u64;
    state.metrics.speech.record_request(latency_ms);

    let audio = match result {
        Ok(audio) => audio,
        Err(e) => {
            state.metrics.speech.record_error();
            return Err(e);
        }
    };

    state
        .metrics
        .synthesis
        .record_synthesis(audio.chunk_count, audio.sample_count, audio.duration_ms());
    info!(
        "Speech ready in {}ms: {} chunk(s), {}ms of audio at {} Hz",
        latency_ms,
        audio.chunk_count,
        audio.duration_ms(),
        audio.sample_rate
    );

    Ok(([(header::CONTENT_TYPE, "audio/wav")], audio.wav).into_response())
}

/// Raises the cancel flag when the handler future is dropped (client gone).
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

async fn synthesize(state: &AppState, req: SpeechRequest) -> Result<SpeechAudio, ApiError> {
    let text = validate_speech_request(req.input.as_deref(), req.speed)?.to_string();
    validate_identifier("voice", req.voice.as_deref())?;
    validate_identifier("lang_code", req.lang_code.as_deref())?;

    let params = state
        .pipeline
        .params(text, req.voice, req.speed, req.lang_code);
    let pipeline = Arc::clone(&state.pipeline);
    let cancel = Arc::new(AtomicBool::new(false));
    let _guard = CancelOnDrop(Arc::clone(&cancel));

    // Engine calls block; keep them off the async workers.
    let task = tokio::task::spawn_blocking({
        let cancel = Arc::clone(&cancel);
        move || pipeline.synthesize_until(&params, &cancel)
    });

    let timeout = state.config.request_timeout();
    let joined = match tokio::time::timeout(timeout, task).await {
        Ok(joined) => joined,
        Err(_) => {
            cancel.store(true, Ordering::Release);
            warn!("Synthesis exceeded {}s, cancelling remaining chunks", timeout.as_secs());
            return Err(ApiError::InternalError(format!(
                "synthesis timed out after {}s",
                timeout.as_secs()
            )));
        }
    };

    let audio = joined.map_err(|e| ApiError::InternalError(format!("Task join error: {e}")))??;
    Ok(audio)
}
