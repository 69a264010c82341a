use crate::{Error, EventStream, GenerationRequest};

/// A trait for upstream LLM providers.
///
/// `complete` waits for the whole answer. `complete_streaming` returns a lazy
/// stream: nothing is sent upstream until it is first polled, and any failure
/// surfaces as a single terminal [`crate::StreamEvent::Error`] instead of an `Err`.
/// Neither method retries.
#[async_trait::async_trait]
pub trait LLMProvider: Send + Sync + 'static {
    /// Generate the full completion in one round trip, trimmed of surrounding whitespace.
    async fn complete(&self, request: &GenerationRequest) -> Result<String, Error>;

    /// Generate a completion as a stream of text deltas.
    fn complete_streaming(&self, request: &GenerationRequest) -> EventStream;
}
