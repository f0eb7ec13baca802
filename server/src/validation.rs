use crate::error::ApiError;

/// Accepted playback speed range
const MIN_SPEED: f32 = 0.25;
const MAX_SPEED: f32 = 4.0;

/// Validate a speech request before any engine work is scheduled.
/// Returns the trimmed input text.
pub fn validate_speech_request(input: Option<&str>, speed: Option<f32>) -> Result<&str, ApiError> {
    let text = input.map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Err(ApiError::InvalidInput("input is required".to_string()));
    }

    if let Some(speed) = speed {
        if !speed.is_finite() || !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
            return Err(ApiError::InvalidInput(format!(
                "speed must be between {} and {}",
                MIN_SPEED, MAX_SPEED
            )));
        }
    }

    Ok(text)
}

/// Validate an optional identifier field (voice, lang_code).
pub fn validate_identifier(field: &str, value: Option<&str>) -> Result<(), ApiError> {
    if let Some(v) = value {
        if v.trim().is_empty() {
            return Err(ApiError::InvalidInput(format!("{field} cannot be empty")));
        }
    }
    Ok(())
}
