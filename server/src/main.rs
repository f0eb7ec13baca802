use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use server::config::ServerConfig;
use server::{build_app, AppState};
use tts_core::{PiperEngine, PipelineConfig, SpeechPipeline, SynthesisCoordinator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    info!(
        "Server configuration loaded: port={}, rate_limit_per_minute={:?}, request_timeout={}s",
        config.port, config.rate_limit_per_minute, config.request_timeout_secs
    );

    info!("Loading model: {} (voices from {})", config.model_name, config.voice_map_path);
    let engine = PiperEngine::from_voice_map(&config.model_name, &config.voice_map_path)
        .with_context(|| format!("Could not load voices from {}", config.voice_map_path))?;
    info!("Model loaded with voices: {}", engine.voice_ids().join(", "));

    let pipeline_config = PipelineConfig::default();
    let coordinator = SynthesisCoordinator::new(engine, pipeline_config.fallback_sample_rate);
    let pipeline = SpeechPipeline::new(coordinator, pipeline_config);

    let state = AppState::new(pipeline, config.clone());
    let app = build_app(state)?;

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {addr}: {e}. Try a different PORT."))?;

    info!("Server listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
