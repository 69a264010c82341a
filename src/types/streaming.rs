//! Types for streaming responses.

use futures_util::stream::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Events that can be emitted during streaming.
///
/// Failures are ordinary values: an `Error` is always the last event of a
/// stream, whether or not deltas came before it. A stream that simply ends
/// completed successfully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamEvent {
    /// A fragment of generated text.
    Delta { text: String },
    /// The upstream failed; nothing follows.
    Error {
        #[serde(rename = "error")]
        message: String,
    },
}

impl StreamEvent {
    pub fn delta(text: impl Into<String>) -> Self {
        StreamEvent::Delta { text: text.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        StreamEvent::Error {
            message: message.into(),
        }
    }

    /// Returns true if no event may follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Error { .. })
    }

    /// Text carried by a `Delta`, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StreamEvent::Delta { text } => Some(text),
            StreamEvent::Error { .. } => None,
        }
    }
}

/// A lazy, finite, single-pass sequence of stream events.
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;
