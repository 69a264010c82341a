//! Normalization of raw JSON request bodies into [`GenerationRequest`]s.
//!
//! Only the prompt is a hard requirement. Every other field falls back to its
//! default when missing or of the wrong shape.

use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::types::{GenerationRequest, RequestDefaults};

/// Validate a decoded JSON object.
pub fn validate(
    raw: &Map<String, Value>,
    defaults: &RequestDefaults,
) -> Result<GenerationRequest, ValidationError> {
    let prompt = match raw.get("prompt") {
        Some(Value::String(prompt)) if !prompt.trim().is_empty() => prompt.clone(),
        _ => return Err(ValidationError::MissingPrompt),
    };

    let model = raw
        .get("model")
        .and_then(Value::as_str)
        .filter(|model| !model.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| defaults.model.clone());

    let max_tokens = raw
        .get("max_tokens")
        .and_then(Value::as_u64)
        .filter(|&n| n > 0)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(defaults.max_tokens);

    let temperature = raw
        .get("temperature")
        .and_then(Value::as_f64)
        .map(|t| t as f32)
        .filter(|t| t.is_finite())
        .unwrap_or(defaults.temperature);

    let stream = raw.get("stream").and_then(Value::as_bool).unwrap_or(false);

    Ok(GenerationRequest {
        prompt,
        model,
        max_tokens,
        temperature,
        stream,
    })
}

/// Validate any JSON value; anything but an object has no prompt.
pub fn validate_value(
    raw: &Value,
    defaults: &RequestDefaults,
) -> Result<GenerationRequest, ValidationError> {
    match raw {
        Value::Object(map) => validate(map, defaults),
        _ => Err(ValidationError::MissingPrompt),
    }
}
