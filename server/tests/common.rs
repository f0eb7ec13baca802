//! Common utilities for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    Router,
};
use server::config::ServerConfig;
use server::{build_app, AppState};
use tower::ServiceExt;
use tts_core::{EngineAudio, PipelineConfig, SpeechEngine, SpeechPipeline, SynthesisCoordinator};

pub const MOCK_SAMPLE_RATE: u32 = 1000;
pub const SAMPLES_PER_CHAR: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MockBehavior {
    Speak,
    Fail,
    Silent,
}

/// One recorded engine call
#[derive(Clone, Debug, PartialEq)]
pub struct EngineCall {
    pub text: String,
    pub voice: String,
    pub speed: f32,
    pub lang_code: String,
}

#[derive(Clone, Default)]
pub struct EngineStats {
    pub calls: Arc<Mutex<Vec<EngineCall>>>,
    pub in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

impl EngineStats {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }
}

/// Stand-in engine: `SAMPLES_PER_CHAR` samples of 0.25 per input character.
pub struct MockEngine {
    pub behavior: MockBehavior,
    pub stats: EngineStats,
    pub delay: Duration,
}

impl SpeechEngine for MockEngine {
    fn model_id(&self) -> &str {
        "mock-kokoro"
    }

    fn generate(
        &mut self,
        text: &str,
        voice: &str,
        speed: f32,
        lang_code: &str,
    ) -> anyhow::Result<Vec<EngineAudio>> {
        let now = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.stats.calls.lock().unwrap().push(EngineCall {
            text: text.to_string(),
            voice: voice.to_string(),
            speed,
            lang_code: lang_code.to_string(),
        });
        std::thread::sleep(self.delay);
        self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Speak => {
                let n = text.chars().count() * SAMPLES_PER_CHAR;
                Ok(vec![EngineAudio::mono(vec![0.25; n], MOCK_SAMPLE_RATE)])
            }
            MockBehavior::Fail => anyhow::bail!("metal command buffer failed"),
            MockBehavior::Silent => Ok(Vec::new()),
        }
    }
}

/// Create a test app instance backed by a mock engine
pub fn create_test_app(behavior: MockBehavior) -> (Router, EngineStats) {
    create_test_app_with_delay(behavior, Duration::ZERO)
}

pub fn create_test_app_with_delay(behavior: MockBehavior, delay: Duration) -> (Router, EngineStats) {
    create_test_app_with_config(behavior, delay, ServerConfig::default())
}

pub fn create_test_app_with_config(
    behavior: MockBehavior,
    delay: Duration,
    config: ServerConfig,
) -> (Router, EngineStats) {
    let stats = EngineStats::default();
    let engine = MockEngine {
        behavior,
        stats: stats.clone(),
        delay,
    };

    let pipeline_config = PipelineConfig::default();
    let coordinator = SynthesisCoordinator::new(engine, pipeline_config.fallback_sample_rate);
    let pipeline = SpeechPipeline::new(coordinator, pipeline_config);

    let app = build_app(AppState::new(pipeline, config)).expect("test app should build");
    (app, stats)
}

pub fn speech_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/audio/speech")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Decode a WAV body into (spec, i16 samples)
pub fn decode_wav(bytes: &[u8]) -> (hound::WavSpec, Vec<i16>) {
    let mut reader = hound::WavReader::new(std::io::Cursor::new(bytes)).unwrap();
    let spec = reader.spec();
    let samples = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    (spec, samples)
}
