mod common;

use common::{frames, ScriptedProvider};
use futures_util::StreamExt;
use llm_relay::relay::{self, RelayState};
use llm_relay::validator::validate_value;
use llm_relay::{
    Generation, GenerationResult, Orchestrator, RequestDefaults, StreamEvent, ValidationError,
};
use serde_json::json;
use std::sync::Arc;

async fn relay_body(orchestrator: &Orchestrator, body: serde_json::Value) -> String {
    let request = validate_value(&body, &RequestDefaults::default()).unwrap();
    let events = orchestrator
        .handle(request)
        .await
        .into_stream()
        .expect("streamed request should produce a stream");
    let chunks: Vec<bytes::Bytes> = relay::encode(events).map(|c| c.unwrap()).collect().await;
    String::from_utf8(chunks.concat()).unwrap()
}

#[tokio::test]
async fn test_buffered_hello() {
    let provider = ScriptedProvider::answering("Hello!");
    let orchestrator = Orchestrator::new(provider.clone());

    let request = validate_value(&json!({"prompt": "Hi"}), &RequestDefaults::default()).unwrap();
    let result = orchestrator.handle(request).await.into_buffered().unwrap();

    assert_eq!(result, GenerationResult::text("Hello!"));
    assert_eq!(serde_json::to_value(&result).unwrap(), json!({"text": "Hello!"}));
    assert_eq!(provider.calls(), 1);
    assert_eq!(provider.last_request().unwrap().max_tokens, 1000);
}

#[tokio::test]
async fn test_buffered_failure_never_panics() {
    let provider = ScriptedProvider::failing("invalid api key");
    let orchestrator = Orchestrator::new(provider.clone());

    let request = validate_value(&json!({"prompt": "Hi"}), &RequestDefaults::default()).unwrap();
    match orchestrator.handle(request).await {
        Generation::Buffered(GenerationResult::Failure { message }) => {
            assert!(message.contains("invalid api key"));
        }
        other => panic!("expected a buffered failure, got {other:?}"),
    }
}

/// Run a raw body through validation and, only if it passes, the orchestrator.
async fn submit(
    orchestrator: &Orchestrator,
    body: serde_json::Value,
) -> Result<Generation, ValidationError> {
    let request = validate_value(&body, &RequestDefaults::default())?;
    Ok(orchestrator.handle(request).await)
}

#[tokio::test]
async fn test_missing_prompt_never_reaches_upstream() {
    let provider = ScriptedProvider::answering("should not be used");
    let orchestrator = Orchestrator::new(provider.clone());

    for body in [
        json!({}),
        json!({"prompt": ""}),
        json!({"prompt": "   "}),
        json!({"prompt": "", "stream": true}),
        json!(["not", "an", "object"]),
    ] {
        let outcome = submit(&orchestrator, body.clone()).await;
        assert!(
            matches!(outcome, Err(ValidationError::MissingPrompt)),
            "{body} was accepted"
        );
    }
    assert_eq!(provider.calls(), 0);

    let outcome = submit(&orchestrator, json!({"prompt": "Hi"})).await;
    assert!(matches!(outcome, Ok(Generation::Buffered(_))));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_streamed_hello_frames() {
    let provider = ScriptedProvider::streaming(vec![
        StreamEvent::delta("He"),
        StreamEvent::delta("llo"),
    ]);
    let orchestrator = Orchestrator::new(provider.clone());

    let body = relay_body(&orchestrator, json!({"prompt": "Hi", "stream": true})).await;

    assert_eq!(
        frames(&body),
        vec!["data: {\"text\": \"He\"}\n\n", "data: {\"text\": \"llo\"}\n\n"]
    );
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_n_deltas_then_success() {
    let deltas: Vec<StreamEvent> = (0..25).map(|i| StreamEvent::delta(format!("part-{i} "))).collect();
    let orchestrator = Orchestrator::new(ScriptedProvider::streaming(deltas.clone()));

    let body = relay_body(&orchestrator, json!({"prompt": "Count", "stream": true})).await;
    let decoded = relay::decode_frames(body.as_bytes()).unwrap();

    assert_eq!(decoded, deltas);
    assert!(!body.contains("\"error\""));
}

#[tokio::test]
async fn test_failure_after_k_deltas() {
    for k in [0usize, 1, 3] {
        let mut upstream: Vec<StreamEvent> =
            (0..k).map(|i| StreamEvent::delta(format!("d{i}"))).collect();
        upstream.push(StreamEvent::error("upstream hung up"));

        let orchestrator = Orchestrator::new(ScriptedProvider::streaming(upstream.clone()));
        let body = relay_body(&orchestrator, json!({"prompt": "Hi", "stream": true})).await;
        let raw = frames(&body);

        assert_eq!(raw.len(), k + 1, "k = {k}");
        assert!(raw[..k].iter().all(|f| f.starts_with("data: {\"text\": ")));
        assert_eq!(raw[k], "data: {\"error\": \"upstream hung up\"}\n\n");
        assert_eq!(relay::decode_frames(body.as_bytes()).unwrap(), upstream);
    }
}

#[tokio::test]
async fn test_relay_stops_at_first_error() {
    let orchestrator = Orchestrator::new(ScriptedProvider::streaming(vec![
        StreamEvent::error("first"),
        StreamEvent::error("second"),
        StreamEvent::delta("after"),
    ]));
    let request = validate_value(&json!({"prompt": "Hi", "stream": true}), &RequestDefaults::default())
        .unwrap();
    let mut relay = relay::encode(orchestrator.handle(request).await.into_stream().unwrap());

    let only = relay.next().await.unwrap().unwrap();
    assert_eq!(&only[..], b"data: {\"error\": \"first\"}\n\n");
    assert!(relay.next().await.is_none());
    assert_eq!(relay.state(), RelayState::Failed);
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let orchestrator = Arc::new(Orchestrator::new(ScriptedProvider::streaming(vec![
        StreamEvent::delta("a"),
        StreamEvent::delta("b"),
        StreamEvent::delta("c"),
    ])));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move {
                relay_body(&orchestrator, json!({"prompt": "Hi", "stream": true})).await
            })
        })
        .collect();

    for handle in handles {
        let body = handle.await.unwrap();
        assert_eq!(
            body,
            "data: {\"text\": \"a\"}\n\ndata: {\"text\": \"b\"}\n\ndata: {\"text\": \"c\"}\n\n"
        );
    }
}
