//! Encoding of stream events into `data: <json>\n\n` frames.
//!
//! The relay pulls one event at a time from upstream and turns it into one
//! frame, so at most a single frame is ever held in memory. There is no
//! end-of-stream sentinel; the body simply closes.

use crate::sse_stream::SseDecoder;
use crate::{Error, EventStream, StreamEvent};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde_json::Value;
use std::convert::Infallible;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tracing::{debug, info, warn};

/// Lifecycle of a relayed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// Upstream has not been polled yet.
    Idle,
    /// Deltas are flowing.
    Streaming,
    /// Upstream ended without error.
    Completed,
    /// An error frame was sent.
    Failed,
}

impl RelayState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RelayState::Completed | RelayState::Failed)
    }
}

/// Encode one event as a complete frame.
///
/// JSON separators carry a trailing space, matching `{"text": "He"}`.
pub fn encode_frame(event: &StreamEvent) -> Bytes {
    let (key, value) = match event {
        StreamEvent::Delta { text } => ("text", text),
        StreamEvent::Error { message } => ("error", message),
    };
    let value = Value::String(value.clone());
    Bytes::from(format!("data: {{\"{key}\": {value}}}\n\n"))
}

/// Decode the data payload of one frame back into an event.
pub fn decode(data: &str) -> Result<StreamEvent, Error> {
    Ok(serde_json::from_str(data)?)
}

/// Decode a complete relayed body into its events.
pub fn decode_frames(body: &[u8]) -> Result<Vec<StreamEvent>, Error> {
    let mut decoder = SseDecoder::new();
    let mut frames = decoder.push(body)?;
    frames.extend(decoder.finish());
    frames.iter().map(|frame| decode(&frame.data)).collect()
}

/// Wrap an event stream so it yields encoded frames.
pub fn encode(events: EventStream) -> RelayStream {
    RelayStream::new(events)
}

/// Byte stream of frames, suitable as a streaming HTTP body.
///
/// Dropping it drops the upstream stream with it, which releases the
/// upstream connection.
pub struct RelayStream {
    events: EventStream,
    state: RelayState,
    frames: usize,
}

impl RelayStream {
    pub fn new(events: EventStream) -> Self {
        Self {
            events,
            state: RelayState::Idle,
            frames: 0,
        }
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Number of frames emitted so far.
    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl Stream for RelayStream {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.state {
            RelayState::Completed | RelayState::Failed => return Poll::Ready(None),
            RelayState::Idle => self.state = RelayState::Streaming,
            RelayState::Streaming => {}
        }

        match ready!(self.events.poll_next_unpin(cx)) {
            Some(event) => {
                self.frames += 1;
                if let StreamEvent::Error { message } = &event {
                    warn!(frames = self.frames, error = %message, "Relaying upstream error");
                    self.state = RelayState::Failed;
                }
                Poll::Ready(Some(Ok(encode_frame(&event))))
            }
            None => {
                info!(frames = self.frames, "Stream completed");
                self.state = RelayState::Completed;
                Poll::Ready(None)
            }
        }
    }
}

impl Drop for RelayStream {
    fn drop(&mut self) {
        if self.state == RelayState::Streaming {
            debug!(frames = self.frames, "Client went away mid-stream, dropping upstream");
        }
    }
}
