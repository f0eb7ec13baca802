pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod validation;

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use tower_governor::{governor::GovernorConfigBuilder, key_extractor::GlobalKeyExtractor, GovernorLayer};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tts_core::SpeechPipeline;

use crate::config::ServerConfig;
use crate::handlers::{create_speech, health_check, list_models, metrics_endpoint};
use crate::metrics::AppMetrics;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SpeechPipeline>,
    pub metrics: AppMetrics,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(pipeline: SpeechPipeline, config: ServerConfig) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            metrics: AppMetrics::new(),
            config,
        }
    }
}

/// Request ID middleware for tracing
async fn add_request_id(mut request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let Ok(value) = HeaderValue::from_str(&request_id) else {
        return next.run(request).await;
    };
    request.headers_mut().insert("x-request-id", value.clone());
    let mut response = next.run(request).await;
    response.headers_mut().insert("x-request-id", value);
    response
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let permissive = || {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };

    let Some(ref allowed_origins) = config.cors_allowed_origins else {
        warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (development mode)");
        return permissive();
    };

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();
    if origins.is_empty() {
        warn!("CORS_ALLOWED_ORIGINS is empty, falling back to permissive CORS");
        return permissive();
    }

    info!("CORS configured for {} origin(s)", origins.len());
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Routes only, with request ids and tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .route("/v1/models", get(list_models))
        .route("/v1/audio/speech", post(create_speech))
        .route("/metrics", get(metrics_endpoint))
        .layer(axum::middleware::from_fn(add_request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Full application: routes plus CORS, and the rate limit when one is configured.
///
/// The request timeout is enforced in the speech handler, which can stop synthesis.
pub fn build_app(state: AppState) -> anyhow::Result<Router> {
    let config = state.config.clone();
    let mut app = router(state).layer(cors_layer(&config));

    if let Some(per_minute) = config.rate_limit_per_minute {
        // Global limit: the engine is one shared resource regardless of caller.
        let governor_conf = Arc::new(
            GovernorConfigBuilder::default()
                .per_second(ServerConfig::replenish_secs(per_minute))
                .burst_size(per_minute)
                .key_extractor(GlobalKeyExtractor)
                .finish()
                .ok_or_else(|| anyhow::anyhow!("invalid rate limit configuration"))?,
        );
        info!("Rate limiting: {} requests per minute", per_minute);
        app = app.layer(GovernorLayer::new(governor_conf));
    } else {
        info!("Rate limiting disabled");
    }

    Ok(app)
}
