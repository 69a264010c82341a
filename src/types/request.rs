use serde::Serialize;

use super::config::RequestDefaults;

/// A validated text-generation request.
///
/// Built once per inbound call by [`crate::validator::validate`] and never
/// mutated afterwards. Only `prompt` is checked; range checks on the other
/// fields are left to the upstream provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stream: bool,
}

impl GenerationRequest {
    /// Create a buffered request for `prompt` with the given defaults.
    pub fn new(prompt: impl Into<String>, defaults: &RequestDefaults) -> Self {
        Self {
            prompt: prompt.into(),
            model: defaults.model.clone(),
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
            stream: false,
        }
    }

    /// Return a copy of this request with streaming switched on or off.
    pub fn streaming(self, stream: bool) -> Self {
        Self { stream, ..self }
    }

    /// Return a copy of this request targeting another model.
    pub fn with_model(self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self
        }
    }
}
