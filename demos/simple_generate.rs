//! Minimal buffered generation against the configured provider.

use llm_relay::{GenerationRequest, LLMProvider, OpenAIProvider, ProviderConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = ProviderConfig::from_env()?;

    let provider = OpenAIProvider::new(&config)?;
    let request = GenerationRequest::new("What is the capital of France?", &config.defaults);

    let text = provider.complete(&request).await?;
    println!("AI: {text}");

    Ok(())
}
