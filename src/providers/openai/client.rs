use super::types::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, OpenAIError,
};
use crate::provider::LLMProvider;
use crate::sse_stream::{SseStream, SseStreamExt};
use crate::{Error, EventStream, GenerationRequest, ProviderConfig, StreamEvent};
use bytes::Bytes;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use reqwest::Client;
use tracing::{debug, warn};

const PROVIDER: &str = "OpenAI";

type ByteStream = BoxStream<'static, reqwest::Result<Bytes>>;

/// OpenAI provider implementation, speaking the Chat Completions API.
///
/// Works against any OpenAI-compatible endpoint given the right base URL.
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider from configuration.
    pub fn new(config: &ProviderConfig) -> Result<Self, Error> {
        // Bounds connecting and idle gaps only, never total stream length.
        let client = Client::builder()
            .connect_timeout(config.timeout)
            .read_timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Convert a generation request to the Chat Completions format.
    fn convert_request(request: &GenerationRequest, stream: bool) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: stream.then_some(true),
        }
    }

    /// Extract the text fragment carried by one streamed chunk.
    ///
    /// A chunk that reports an error yields that error even if it also carries content.
    fn chunk_delta(data: &str) -> Result<Option<String>, Error> {
        let chunk: ChatCompletionChunk = serde_json::from_str(data)?;

        if let Some(error) = chunk.error {
            return Err(Error::provider(PROVIDER, error.message));
        }

        Ok(chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty()))
    }
}

/// Turn a non-2xx response into a provider error, preferring the API's own message.
async fn error_from_response(response: reqwest::Response) -> Error {
    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return Error::Http(e),
    };

    let message = match serde_json::from_str::<OpenAIError>(&body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => format!("API error: HTTP {status}"),
        Err(_) => format!("API error: HTTP {status}: {body}"),
    };

    Error::provider(PROVIDER, message)
}

/// A streaming call that has not been sent yet.
struct PendingCall {
    client: Client,
    url: String,
    api_key: String,
    body: ChatCompletionRequest,
}

impl PendingCall {
    async fn open(self) -> Result<SseStream<ByteStream>, Error> {
        debug!(url = %self.url, model = %self.body.model, "Opening upstream stream");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&self.body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response.bytes_stream().boxed().sse_events())
    }
}

/// Progress of one upstream streaming call.
enum Upstream {
    Idle(PendingCall),
    Reading(SseStream<ByteStream>),
    Finished,
}

impl Upstream {
    /// Advance until the next event is available or the call is over.
    async fn advance(mut self) -> Option<(StreamEvent, Upstream)> {
        loop {
            self = match self {
                Upstream::Idle(call) => match call.open().await {
                    Ok(events) => Upstream::Reading(events),
                    Err(e) => return Some(Self::fail(e)),
                },
                Upstream::Reading(mut events) => match events.next().await {
                    None => return None,
                    Some(Err(e)) => return Some(Self::fail(e)),
                    Some(Ok(event)) if event.is_done() => return None,
                    Some(Ok(event)) => match OpenAIProvider::chunk_delta(&event.data) {
                        Ok(Some(text)) => {
                            return Some((StreamEvent::delta(text), Upstream::Reading(events)))
                        }
                        Ok(None) => Upstream::Reading(events),
                        Err(e) => return Some(Self::fail(e)),
                    },
                },
                Upstream::Finished => return None,
            };
        }
    }

    fn fail(error: Error) -> (StreamEvent, Upstream) {
        warn!(error = %error, "Upstream stream failed");
        (StreamEvent::error(error.to_string()), Upstream::Finished)
    }
}

#[async_trait::async_trait]
impl LLMProvider for OpenAIProvider {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, Error> {
        let body = Self::convert_request(request, false);

        debug!(model = %body.model, "Sending buffered completion request");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let text = response.text().await?;
        let completion: ChatCompletionResponse = serde_json::from_str(&text)?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| Error::provider(PROVIDER, "response contained no message content"))
    }

    fn complete_streaming(&self, request: &GenerationRequest) -> EventStream {
        let call = PendingCall {
            client: self.client.clone(),
            url: self.endpoint(),
            api_key: self.api_key.clone(),
            body: Self::convert_request(request, true),
        };

        Box::pin(stream::unfold(Upstream::Idle(call), Upstream::advance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RequestDefaults;

    #[test]
    fn test_provider_creation() {
        let provider = OpenAIProvider::new(&ProviderConfig::openai("test-key".to_string()));
        assert!(provider.is_ok());
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let config = ProviderConfig::openai("test-key".to_string())
            .with_base_url("http://localhost:9999/v1/");
        let provider = OpenAIProvider::new(&config).unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:9999/v1/chat/completions");
    }

    #[test]
    fn test_request_conversion() {
        let request = GenerationRequest::new("Hello", &RequestDefaults::default());

        let buffered = OpenAIProvider::convert_request(&request, false);
        let json = serde_json::to_value(&buffered).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "gpt-3.5-turbo",
                "messages": [{"role": "user", "content": "Hello"}],
                "max_tokens": 1000,
                "temperature": 0.7f32,
            })
        );

        let streamed = OpenAIProvider::convert_request(&request, true);
        assert_eq!(streamed.stream, Some(true));
    }

    #[test]
    fn test_chunk_delta() {
        let content = r#"{"choices":[{"index":0,"delta":{"content":"He"}}]}"#;
        assert_eq!(OpenAIProvider::chunk_delta(content).unwrap().as_deref(), Some("He"));

        let role_only = r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#;
        assert_eq!(OpenAIProvider::chunk_delta(role_only).unwrap(), None);

        let empty = r#"{"choices":[{"index":0,"delta":{"content":""}}]}"#;
        assert_eq!(OpenAIProvider::chunk_delta(empty).unwrap(), None);

        let finish = r#"{"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#;
        assert_eq!(OpenAIProvider::chunk_delta(finish).unwrap(), None);

        let no_choices = r#"{"choices":[]}"#;
        assert_eq!(OpenAIProvider::chunk_delta(no_choices).unwrap(), None);
    }

    #[test]
    fn test_chunk_error_wins_over_content() {
        let mixed = r#"{"choices":[{"delta":{"content":"tail"}}],"error":{"message":"overloaded"}}"#;
        let err = OpenAIProvider::chunk_delta(mixed).unwrap_err();
        assert!(err.to_string().contains("overloaded"));
    }

    #[test]
    fn test_malformed_chunk() {
        assert!(matches!(
            OpenAIProvider::chunk_delta("not json"),
            Err(Error::Serialization(_))
        ));
    }
}
