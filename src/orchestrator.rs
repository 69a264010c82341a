//! Dispatch of validated requests to buffered or streamed execution.

use crate::provider::LLMProvider;
use crate::{EventStream, GenerationRequest, GenerationResult};
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Output of [`Orchestrator::handle`].
pub enum Generation {
    /// The full answer, or the reason there is none.
    Buffered(GenerationResult),
    /// Upstream events, passed through exactly as produced.
    Streamed(EventStream),
}

impl Generation {
    pub fn into_buffered(self) -> Option<GenerationResult> {
        match self {
            Generation::Buffered(result) => Some(result),
            Generation::Streamed(_) => None,
        }
    }

    pub fn into_stream(self) -> Option<EventStream> {
        match self {
            Generation::Streamed(events) => Some(events),
            Generation::Buffered(_) => None,
        }
    }
}

impl std::fmt::Debug for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Generation::Buffered(result) => f.debug_tuple("Buffered").field(result).finish(),
            Generation::Streamed(_) => f.debug_tuple("Streamed").field(&"<stream>").finish(),
        }
    }
}

/// Drives one upstream provider on behalf of each request.
///
/// Holds no per-request state, so a single instance serves any number of
/// concurrent requests.
#[derive(Clone)]
pub struct Orchestrator {
    provider: Arc<dyn LLMProvider>,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }

    /// Run a request. Provider failures come back as data, never as `Err`.
    pub async fn handle(&self, request: GenerationRequest) -> Generation {
        let span = info_span!(
            "generation",
            request_id = %Uuid::new_v4(),
            model = %request.model,
            stream = request.stream,
        );

        if request.stream {
            return span.in_scope(|| {
                info!(prompt_chars = request.prompt.chars().count(), "Starting streamed generation");
                Generation::Streamed(self.provider.complete_streaming(&request))
            });
        }

        async {
            info!(prompt_chars = request.prompt.chars().count(), "Starting buffered generation");
            match self.provider.complete(&request).await {
                Ok(text) => {
                    info!(chars = text.chars().count(), "Generation completed");
                    Generation::Buffered(GenerationResult::text(text))
                }
                Err(e) => {
                    warn!(error = %e, "Generation failed");
                    Generation::Buffered(GenerationResult::failure(e.to_string()))
                }
            }
        }
        .instrument(span)
        .await
    }
}
