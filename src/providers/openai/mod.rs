//! OpenAI Chat Completions provider.

pub mod client;
pub mod types;

pub use client::OpenAIProvider;
