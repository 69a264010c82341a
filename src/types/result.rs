use serde::{Deserialize, Serialize};

/// Outcome of a buffered generation.
///
/// Serializes to the wire shape the gateway answers with: `{"text": ...}` or
/// `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerationResult {
    /// The provider produced a complete answer.
    Text { text: String },
    /// The provider call failed.
    Failure {
        #[serde(rename = "error")]
        message: String,
    },
}

impl GenerationResult {
    pub fn text(text: impl Into<String>) -> Self {
        GenerationResult::Text { text: text.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        GenerationResult::Failure {
            message: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, GenerationResult::Failure { .. })
    }
}
