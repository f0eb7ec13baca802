use std::{collections::HashMap, fs, path::Path};

use anyhow::Context;
use piper_rs::synth::{AudioOutputConfig, PiperSpeechStreamParallel, PiperSpeechSynthesizer};
use serde::Deserialize;
use tracing::{debug, info};

use crate::engine::{EngineAudio, SpeechEngine};

/// Entry of the voice map file: either a bare config path or an object.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum VoiceSpec {
    Path(String),
    Detailed {
        config: String,
        #[serde(default)]
        speaker_id: Option<i64>,
    },
}

impl VoiceSpec {
    pub fn config(&self) -> &str {
        match self {
            VoiceSpec::Path(path) => path,
            VoiceSpec::Detailed { config, .. } => config,
        }
    }

    pub fn speaker_id(&self) -> Option<i64> {
        match self {
            VoiceSpec::Path(_) => None,
            VoiceSpec::Detailed { speaker_id, .. } => *speaker_id,
        }
    }
}

/// Speed factors Piper's output rate can express (percent 0..=100 maps onto this range).
const PIPER_SPEED_RANGE: (f32, f32) = (0.5, 5.5);

/// Map a speed factor onto Piper's output `rate` percent, clamped to what it supports.
pub fn speed_to_rate(speed: f32) -> u8 {
    let (min, max) = PIPER_SPEED_RANGE;
    if !speed.is_finite() {
        return speed_to_rate(1.0);
    }
    let percent = (speed.clamp(min, max) - min) / (max - min) * 100.0;
    percent.round() as u8
}

/// Parse a voice map (`voice id -> VoiceSpec`) from JSON text.
pub fn parse_voice_map(text: &str) -> anyhow::Result<HashMap<String, VoiceSpec>> {
    let map: HashMap<String, VoiceSpec> = serde_json::from_str(text)
        .with_context(|| "voice map must be a JSON object of voice id -> config path")?;
    if map.is_empty() {
        anyhow::bail!("voice map defines no voices");
    }
    Ok(map)
}

/// Read the sample rate from a Piper model config JSON.
fn read_sample_rate<P: AsRef<Path>>(cfg_path: P) -> anyhow::Result<u32> {
    let text = fs::read_to_string(cfg_path.as_ref())
        .with_context(|| format!("Failed to read config file: {}", cfg_path.as_ref().display()))?;
    let json: serde_json::Value =
        serde_json::from_str(&text).with_context(|| "Config file is not valid JSON")?;

    let sample_rate = json
        .get("audio")
        .and_then(|a| a.get("sample_rate"))
        .and_then(|sr| sr.as_u64())
        .ok_or_else(|| anyhow::anyhow!("Missing or invalid 'audio.sample_rate' in config"))?;

    Ok(sample_rate as u32)
}

struct LoadedVoice {
    synth: PiperSpeechSynthesizer,
    sample_rate: u32,
}

/// Piper-backed engine with every configured voice loaded up front.
///
/// The language is fixed by each voice model, so `lang_code` is not applied.
/// `speed` goes through Piper's output rate, which cannot go below 0.5.
pub struct PiperEngine {
    model_id: String,
    voices: HashMap<String, LoadedVoice>,
}

impl PiperEngine {
    /// Load every voice listed in the voice map file.
    pub fn from_voice_map<P: AsRef<Path>>(model_id: &str, path: P) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to load {}", path.as_ref().display()))?;
        let specs = parse_voice_map(&text)?;

        let mut voices = HashMap::with_capacity(specs.len());
        for (voice_id, spec) in specs {
            let cfg_path = spec.config();
            let sample_rate = read_sample_rate(cfg_path)?;
            let model = piper_rs::from_config_path(Path::new(cfg_path))
                .map_err(|e| anyhow::anyhow!("piper load error for voice {voice_id}: {e}"))?;
            if let Some(sid) = spec.speaker_id() {
                if let Some(e) = model.set_speaker(sid) {
                    anyhow::bail!("voice {voice_id}: cannot select speaker {sid}: {e}");
                }
            }
            let synth = PiperSpeechSynthesizer::new(model)?;
            info!("Loaded voice {voice_id} ({cfg_path}, {sample_rate} Hz)");
            voices.insert(voice_id, LoadedVoice { synth, sample_rate });
        }

        Ok(Self {
            model_id: model_id.to_string(),
            voices,
        })
    }

    pub fn voice_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.voices.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl SpeechEngine for PiperEngine {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn generate(
        &mut self,
        text: &str,
        voice: &str,
        speed: f32,
        lang_code: &str,
    ) -> anyhow::Result<Vec<EngineAudio>> {
        let loaded = self.voices.get(voice).ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown voice '{}'. Available voices: {}",
                voice,
                self.voice_ids().join(", ")
            )
        })?;
        let output_config = AudioOutputConfig {
            rate: Some(speed_to_rate(speed)),
            volume: None,
            pitch: None,
            appended_silence_ms: None,
        };
        debug!(
            "piper generate: voice={voice} speed={speed} rate={:?} lang_code={lang_code}",
            output_config.rate
        );

        let iter: PiperSpeechStreamParallel = loaded
            .synth
            .synthesize_parallel(text.to_string(), Some(output_config))
            .map_err(|e| anyhow::anyhow!("piper synth error: {e}"))?;

        let mut parts = Vec::new();
        for part in iter {
            let samples = part.map_err(|e| anyhow::anyhow!("chunk error: {e}"))?.into_vec();
            parts.push(EngineAudio::mono(samples, loaded.sample_rate));
        }
        Ok(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_voice_map_accepts_both_forms() {
        let map = parse_voice_map(
            r#"{
                "ff_siwis": "models/fr_FR/fr_FR-siwis-medium.onnx.json",
                "thorsten": { "config": "models/de_DE/de_DE-thorsten-medium.onnx.json", "speaker_id": 2 }
            }"#,
        )
        .unwrap();

        assert_eq!(map["ff_siwis"].config(), "models/fr_FR/fr_FR-siwis-medium.onnx.json");
        assert_eq!(
            map["thorsten"],
            VoiceSpec::Detailed {
                config: "models/de_DE/de_DE-thorsten-medium.onnx.json".to_string(),
                speaker_id: Some(2),
            }
        );
    }

    #[test]
    fn test_speed_to_rate() {
        assert_eq!(speed_to_rate(0.5), 0);
        assert_eq!(speed_to_rate(1.0), 10);
        assert_eq!(speed_to_rate(0.9), 8);
        assert_eq!(speed_to_rate(3.0), 50);
        assert_eq!(speed_to_rate(5.5), 100);
        // Out of range speeds clamp to the ends Piper supports
        assert_eq!(speed_to_rate(0.25), 0);
        assert_eq!(speed_to_rate(9.0), 100);
        assert_eq!(speed_to_rate(f32::NAN), 10);
    }

    #[test]
    fn test_speaker_id_only_on_detailed_entries() {
        assert_eq!(VoiceSpec::Path("a.onnx.json".into()).speaker_id(), None);
        let detailed = VoiceSpec::Detailed {
            config: "a.onnx.json".into(),
            speaker_id: Some(4),
        };
        assert_eq!(detailed.speaker_id(), Some(4));
    }

    #[test]
    fn test_parse_voice_map_rejects_bad_input() {
        assert!(parse_voice_map("[]").is_err());
        assert!(parse_voice_map("{}").is_err());
        assert!(parse_voice_map(r#"{ "x": 42 }"#).is_err());
    }

    #[test]
    fn test_read_sample_rate_from_config() {
        let dir = std::env::temp_dir().join(format!("tts_core_piper_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let good = dir.join("good.onnx.json");
        fs::write(&good, r#"{ "audio": { "sample_rate": 22050 } }"#).unwrap();
        let bad = dir.join("bad.onnx.json");
        fs::write(&bad, r#"{ "audio": {} }"#).unwrap();

        assert_eq!(read_sample_rate(&good).unwrap(), 22050);
        assert!(read_sample_rate(&bad).is_err());
        assert!(read_sample_rate(dir.join("missing.json")).is_err());

        fs::remove_dir_all(&dir).unwrap();
    }
}
