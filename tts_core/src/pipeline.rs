use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::coordinator::{ChunkAudio, SynthesisCoordinator};
use crate::error::TtsError;
use crate::stitch::stitch;
use crate::text::{char_len, split_text};
use crate::wav::encode_wav;

/// Fixed synthesis defaults. Changing them means redeploying.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub max_chunk_chars: usize,
    pub gap_seconds: f32,
    pub default_voice: String,
    pub default_speed: f32,
    pub default_lang_code: String,
    /// Used only when the engine never reports a sample rate.
    pub fallback_sample_rate: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: 220,
            gap_seconds: 0.10,
            default_voice: "ff_siwis".to_string(),
            default_speed: 0.9,
            default_lang_code: "f".to_string(),
            fallback_sample_rate: 24000,
        }
    }
}

/// Per-request synthesis parameters, already resolved against defaults.
#[derive(Debug, Clone)]
pub struct SpeechParams {
    pub text: String,
    pub voice: String,
    pub speed: f32,
    pub lang_code: String,
}

/// Result of one synthesis request.
#[derive(Debug, Clone)]
pub struct SpeechAudio {
    pub wav: Vec<u8>,
    pub sample_rate: u32,
    pub chunk_count: usize,
    pub sample_count: usize,
}

impl SpeechAudio {
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.sample_count as f64 / self.sample_rate as f64 * 1000.0) as u64
    }
}

/// Segment, synthesize, stitch and encode arbitrary-length text.
#[derive(Debug)]
pub struct SpeechPipeline {
    coordinator: SynthesisCoordinator,
    config: PipelineConfig,
}

impl SpeechPipeline {
    pub fn new(coordinator: SynthesisCoordinator, config: PipelineConfig) -> Self {
        Self {
            coordinator,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn model_id(&self) -> &str {
        self.coordinator.model_id()
    }

    /// Fill unset request fields from the configured defaults.
    pub fn params(
        &self,
        text: impl Into<String>,
        voice: Option<String>,
        speed: Option<f32>,
        lang_code: Option<String>,
    ) -> SpeechParams {
        SpeechParams {
            text: text.into(),
            voice: voice.unwrap_or_else(|| self.config.default_voice.clone()),
            speed: speed.unwrap_or(self.config.default_speed),
            lang_code: lang_code.unwrap_or_else(|| self.config.default_lang_code.clone()),
        }
    }

    /// Blocking: runs every chunk through the engine in order.
    ///
    /// Any chunk failure aborts the whole request; no partial audio is returned.
    pub fn synthesize(&self, params: &SpeechParams) -> Result<SpeechAudio, TtsError> {
        self.synthesize_until(params, &AtomicBool::new(false))
    }

    /// Like [`synthesize`](Self::synthesize), but stops before the next chunk
    /// once `cancel` is set. A chunk already inside the engine runs to completion.
    pub fn synthesize_until(
        &self,
        params: &SpeechParams,
        cancel: &AtomicBool,
    ) -> Result<SpeechAudio, TtsError> {
        let chunks = split_text(&params.text, self.config.max_chunk_chars);
        if chunks.is_empty() {
            return Err(TtsError::Validation("input is required".to_string()));
        }

        let preview: String = params.text.trim().chars().take(60).collect();
        info!(
            "Synthesizing ({} chars, {} chunk(s)): \"{}...\"",
            char_len(params.text.trim()),
            chunks.len(),
            preview
        );

        let mut segments: Vec<ChunkAudio> = Vec::with_capacity(chunks.len());
        for (idx, chunk) in chunks.iter().enumerate() {
            if cancel.load(Ordering::Acquire) {
                warn!("Request abandoned after {}/{} chunk(s)", idx, chunks.len());
                return Err(TtsError::Cancelled);
            }
            if chunks.len() > 1 {
                debug!("chunk {}/{} ({} chars)", idx + 1, chunks.len(), char_len(chunk));
            }
            segments.push(self.coordinator.generate(
                chunk,
                &params.voice,
                params.speed,
                &params.lang_code,
            )?);
        }

        let audio = stitch(segments, self.config.gap_seconds)?;
        let wav = encode_wav(&audio.samples, audio.sample_rate)?;
        info!("Generated {} bytes", wav.len());

        Ok(SpeechAudio {
            wav,
            sample_rate: audio.sample_rate,
            chunk_count: chunks.len(),
            sample_count: audio.samples.len(),
        })
    }
}
