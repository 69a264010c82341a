//! Stream a completion and print the relayed frames as they arrive.

use futures_util::StreamExt;
use llm_relay::{relay, GenerationRequest, Orchestrator, OpenAIProvider, ProviderConfig};
use std::io::Write;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = ProviderConfig::from_env()?;

    let orchestrator = Orchestrator::new(Arc::new(OpenAIProvider::new(&config)?));
    let request = GenerationRequest::new("Write a haiku about rivers.", &config.defaults).streaming(true);

    let Some(events) = orchestrator.handle(request).await.into_stream() else {
        return Err("expected a streamed generation".into());
    };

    let mut frames = relay::encode(events);
    let mut stdout = std::io::stdout();
    while let Some(Ok(frame)) = frames.next().await {
        stdout.write_all(&frame)?;
        stdout.flush()?;
    }

    Ok(())
}
