use thiserror::Error;

/// Failures of the speech pipeline.
#[derive(Debug, Error)]
pub enum TtsError {
    /// Caller supplied unusable input (empty after whitespace normalization).
    #[error("{0}")]
    Validation(String),

    /// The engine raised, or produced no usable audio for a chunk.
    #[error("engine error: {0}")]
    Engine(String),

    /// Stitching was asked to join zero segments.
    #[error("no audio segments to stitch")]
    EmptyInput,

    /// The request was abandoned before all chunks were synthesized.
    #[error("synthesis cancelled")]
    Cancelled,

    #[error("wav encoding error: {0}")]
    Encoding(String),
}

impl TtsError {
    pub fn is_validation(&self) -> bool {
        matches!(self, TtsError::Validation(_))
    }
}

impl From<hound::Error> for TtsError {
    fn from(e: hound::Error) -> Self {
        TtsError::Encoding(e.to_string())
    }
}
