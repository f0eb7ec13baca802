//! Long-text speech synthesis on top of a short-input, non-reentrant engine.
//!
//! Text is split into engine-sized chunks ([`text`]), each chunk goes through
//! the single shared engine ([`SynthesisCoordinator`]), the per-chunk audio is
//! joined with short pauses ([`stitch`]) and the result is encoded as WAV
//! ([`wav`]). [`SpeechPipeline`] runs the whole sequence for one request.

pub mod coordinator;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod piper;
pub mod stitch;
pub mod text;
pub mod wav;

pub use coordinator::{ChunkAudio, SynthesisCoordinator};
pub use engine::{EngineAudio, SpeechEngine};
pub use error::TtsError;
pub use pipeline::{PipelineConfig, SpeechAudio, SpeechParams, SpeechPipeline};
pub use piper::PiperEngine;
pub use stitch::stitch;
pub use text::split_text;
pub use wav::encode_wav;
