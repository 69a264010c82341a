//! Provider implementations for different LLM services.

pub mod openai;

// Re-export commonly used provider types
pub use openai::OpenAIProvider;
