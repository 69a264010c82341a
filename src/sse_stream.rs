//! Incremental Server-Sent Events decoding over byte chunks.
//!
//! Upstream providers deliver streamed completions as SSE; the relay's own
//! output uses the same `data: ...\n\n` framing, so the decoder here reads both.

use crate::Error;
use futures_util::{Stream, StreamExt};
use memchr::memmem;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

/// Largest amount of undelimited data held while waiting for a frame boundary.
pub const MAX_EVENT_BYTES: usize = 1_000_000;

const SEPARATOR: &[u8] = b"\n\n";

/// A Server-Sent Events (SSE) event.
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    /// Event type (optional).
    pub event_type: Option<String>,
    /// Event data, multiple `data:` lines joined with `\n`.
    pub data: String,
    /// Event ID (optional).
    pub id: Option<String>,
}

impl SseEvent {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            event_type: None,
            data: data.into(),
            id: None,
        }
    }

    /// OpenAI-style end-of-stream marker.
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }

    /// Parse the text of one event (without its trailing blank line).
    ///
    /// Returns `None` for comment-only or data-less blocks.
    pub fn parse(block: &str) -> Option<Self> {
        let mut event_type = None;
        let mut id = None;
        let mut data: Option<String> = None;

        for line in block.lines() {
            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };

            match field {
                "data" => match data.as_mut() {
                    Some(existing) => {
                        existing.push('\n');
                        existing.push_str(value);
                    }
                    None => data = Some(value.to_string()),
                },
                "event" => event_type = Some(value.to_string()),
                "id" => id = Some(value.to_string()),
                _ => {}
            }
        }

        data.map(|data| SseEvent {
            event_type,
            data,
            id,
        })
    }
}

/// Push-based decoder that turns arbitrary byte chunks into complete events.
///
/// Bytes are kept raw until a full event is delimited, so multi-byte UTF-8
/// sequences may be split across chunks. Line endings may be `\n`, `\r\n`
/// or a lone `\r`, and a `\r\n` pair may straddle two chunks.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    // The last byte seen was `\r`; a `\n` opening the next chunk belongs to it.
    after_cr: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect every event it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>, Error> {
        self.extend_normalized(chunk);

        let finder = memmem::Finder::new(SEPARATOR);
        let mut events = Vec::new();
        let mut start = 0;

        while let Some(pos) = finder.find(&self.buffer[start..]) {
            let end = start + pos;
            let block = std::str::from_utf8(&self.buffer[start..end])
                .map_err(|e| Error::streaming(format!("Invalid UTF-8 in SSE event: {e}")))?;
            events.extend(SseEvent::parse(block));
            start = end + SEPARATOR.len();
        }

        if start > 0 {
            self.buffer.drain(..start);
        }

        if self.buffer.len() > MAX_EVENT_BYTES {
            self.buffer.clear();
            return Err(Error::streaming("SSE buffer exceeded maximum size"));
        }

        Ok(events)
    }

    /// Flush whatever is left once the byte stream has ended.
    ///
    /// A final event that lacks its trailing blank line is still returned.
    pub fn finish(&mut self) -> Option<SseEvent> {
        self.after_cr = false;
        let rest = std::mem::take(&mut self.buffer);
        let text = std::str::from_utf8(&rest).ok()?;
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        SseEvent::parse(text)
    }

    /// Append a chunk with every line ending rewritten to `\n`.
    fn extend_normalized(&mut self, mut chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        if std::mem::take(&mut self.after_cr) {
            chunk = chunk.strip_prefix(b"\n").unwrap_or(chunk);
        }
        if memchr::memchr(b'\r', chunk).is_none() {
            self.buffer.extend_from_slice(chunk);
            return;
        }

        let mut bytes = chunk.iter().copied().peekable();
        while let Some(b) = bytes.next() {
            if b == b'\r' {
                if bytes.next_if_eq(&b'\n').is_none() && bytes.peek().is_none() {
                    self.after_cr = true;
                }
                self.buffer.push(b'\n');
            } else {
                self.buffer.push(b);
            }
        }
    }
}

/// A stream adapter that parses SSE events from a byte stream.
pub struct SseStream<S> {
    inner: S,
    decoder: SseDecoder,
    pending: VecDeque<SseEvent>,
    finished: bool,
}

impl<S> SseStream<S> {
    pub fn new(stream: S) -> Self {
        Self {
            inner: stream,
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }
}

impl<S, E> Stream for SseStream<S>
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    type Item = Result<SseEvent, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if self.finished {
                return Poll::Ready(None);
            }

            match ready!(self.inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => match self.decoder.push(&chunk) {
                    Ok(events) => self.pending.extend(events),
                    Err(e) => {
                        self.finished = true;
                        return Poll::Ready(Some(Err(e)));
                    }
                },
                Some(Err(e)) => {
                    self.finished = true;
                    return Poll::Ready(Some(Err(Error::streaming(format!("Stream error: {e}")))));
                }
                None => {
                    self.finished = true;
                    if let Some(event) = self.decoder.finish() {
                        return Poll::Ready(Some(Ok(event)));
                    }
                }
            }
        }
    }
}

/// Extension trait to add SSE parsing to byte streams.
pub trait SseStreamExt: Stream {
    /// Parse this byte stream as SSE events.
    fn sse_events(self) -> SseStream<Self>
    where
        Self: Sized,
    {
        SseStream::new(self)
    }
}

impl<S: Stream> SseStreamExt for S {}
