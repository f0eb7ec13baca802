use std::sync::Mutex;

use tracing::{error, warn};

use crate::engine::SpeechEngine;
use crate::error::TtsError;

/// Mono audio synthesized for one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Owns the process' only engine handle and lets exactly one synthesis run at a time.
pub struct SynthesisCoordinator {
    engine: Mutex<Box<dyn SpeechEngine>>,
    model_id: String,
    fallback_sample_rate: u32,
}

impl std::fmt::Debug for SynthesisCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesisCoordinator")
            .field("engine", &"<SpeechEngine>")
            .field("model_id", &self.model_id)
            .field("fallback_sample_rate", &self.fallback_sample_rate)
            .finish()
    }
}

impl SynthesisCoordinator {
    pub fn new<E: SpeechEngine + 'static>(engine: E, fallback_sample_rate: u32) -> Self {
        let model_id = engine.model_id().to_string();
        Self {
            engine: Mutex::new(Box::new(engine)),
            model_id,
            fallback_sample_rate,
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Synthesize one chunk, concatenating every non-empty buffer the engine emits.
    ///
    /// Blocks while another chunk is being synthesized. The lock is held only
    /// around the engine call itself.
    pub fn generate(
        &self,
        chunk: &str,
        voice: &str,
        speed: f32,
        lang_code: &str,
    ) -> Result<ChunkAudio, TtsError> {
        let outputs = {
            // A panic inside the engine poisons the lock; the handle itself is still usable.
            let mut engine = self.engine.lock().unwrap_or_else(|poisoned| {
                warn!("engine lock was poisoned by an earlier panic, recovering");
                poisoned.into_inner()
            });
            engine.generate(chunk, voice, speed, lang_code)
        };

        let outputs = outputs.map_err(|e| {
            error!("engine failed on chunk ({} chars): {e:#}", chunk.chars().count());
            TtsError::Engine(format!("{e:#}"))
        })?;

        let mut samples: Vec<f32> = Vec::new();
        let mut sample_rate = None;
        let mut produced = false;
        for output in outputs {
            if output.samples.is_empty() {
                continue;
            }
            if let Some(rate) = output.sample_rate.filter(|r| *r > 0) {
                sample_rate = Some(rate);
            }
            samples.extend(output.into_mono());
            produced = true;
        }

        if !produced {
            return Err(TtsError::Engine("no audio generated".to_string()));
        }

        Ok(ChunkAudio {
            samples,
            sample_rate: sample_rate.unwrap_or(self.fallback_sample_rate),
        })
    }
}
