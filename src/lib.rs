//! A small HTTP gateway in front of an LLM provider.
//!
//! Requests are validated, handed to an [`Orchestrator`], and answered either
//! with one buffered result or with a stream of `data: <json>\n\n` frames
//! produced by the [`relay`]. Provider failures are values
//! ([`GenerationResult::Failure`], [`StreamEvent::Error`]) rather than errors,
//! so every caller gets a well-formed answer.

pub mod cli;
pub mod error;
pub mod orchestrator;
pub mod provider;
pub mod providers;
pub mod relay;
pub mod server;
pub mod sse_stream;
pub mod types;
pub mod validator;

// Re-export core types for easy usage
pub use error::{Error, ValidationError};
pub use orchestrator::{Generation, Orchestrator};
pub use provider::LLMProvider;
pub use providers::*;
pub use sse_stream::SseEvent;
pub use types::*;
