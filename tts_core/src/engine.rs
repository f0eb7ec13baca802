/// One raw audio buffer emitted by an engine for a single `generate` call.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineAudio {
    /// Interleaved samples when `channels > 1`.
    pub samples: Vec<f32>,
    pub channels: u16,
    /// `None` when the engine did not report a rate for this buffer.
    pub sample_rate: Option<u32>,
}

impl EngineAudio {
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            channels: 1,
            sample_rate: Some(sample_rate),
        }
    }

    /// Average interleaved channels down to one.
    pub fn into_mono(self) -> Vec<f32> {
        let channels = usize::from(self.channels.max(1));
        if channels == 1 {
            return self.samples;
        }
        self.samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    }
}

/// A text-to-speech backend.
///
/// `generate` takes `&mut self` because engines are not reentrant; callers
/// reach it only through [`crate::SynthesisCoordinator`], which serializes calls.
pub trait SpeechEngine: Send {
    /// Identifier reported by `/v1/models`.
    fn model_id(&self) -> &str;

    /// Synthesize one short chunk. An engine may emit several buffers.
    fn generate(
        &mut self,
        text: &str,
        voice: &str,
        speed: f32,
        lang_code: &str,
    ) -> anyhow::Result<Vec<EngineAudio>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_passthrough() {
        let audio = EngineAudio::mono(vec![0.1, 0.2, 0.3], 24000);
        assert_eq!(audio.into_mono(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_stereo_is_averaged() {
        let audio = EngineAudio {
            samples: vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0],
            channels: 2,
            sample_rate: Some(16000),
        };
        assert_eq!(audio.into_mono(), vec![0.5, 0.5, 0.0]);
    }
}
