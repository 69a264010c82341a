#![allow(dead_code)]

use futures_util::stream;
use llm_relay::{Error, EventStream, GenerationRequest, LLMProvider, StreamEvent};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Test double that replays a fixed answer and counts how often it is called.
pub struct ScriptedProvider {
    answer: Result<String, String>,
    events: Vec<StreamEvent>,
    calls: AtomicUsize,
    last_request: Mutex<Option<GenerationRequest>>,
}

impl ScriptedProvider {
    pub fn answering(text: &str) -> Arc<Self> {
        Arc::new(Self::new(Ok(text.to_string()), vec![]))
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self::new(Err(message.to_string()), vec![]))
    }

    pub fn streaming(events: Vec<StreamEvent>) -> Arc<Self> {
        Arc::new(Self::new(Err("buffered call not scripted".to_string()), events))
    }

    fn new(answer: Result<String, String>, events: Vec<StreamEvent>) -> Self {
        Self {
            answer,
            events,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.last_request.lock().unwrap().clone()
    }

    fn record(&self, request: &GenerationRequest) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
    }
}

#[async_trait::async_trait]
impl LLMProvider for ScriptedProvider {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, Error> {
        self.record(request);
        self.answer
            .clone()
            .map_err(|message| Error::provider("Scripted", message))
    }

    fn complete_streaming(&self, request: &GenerationRequest) -> EventStream {
        self.record(request);
        Box::pin(stream::iter(self.events.clone()))
    }
}

/// Split a relayed body into its raw frames, keeping the delimiters.
pub fn frames(body: &str) -> Vec<String> {
    body.split_inclusive("\n\n").map(str::to_string).collect()
}
