use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use llm_relay::cli::Cli;
use llm_relay::server::{build_router, AppState};
use llm_relay::{OpenAIProvider, Orchestrator, ProviderConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Credentials may come from a .env file.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        "llm_relay=debug,tower_http=debug"
    } else {
        "llm_relay=info,tower_http=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    info!("llm-relay v{}", env!("CARGO_PKG_VERSION"));

    let config = ProviderConfig::from_env()?;
    info!(
        base_url = %config.base_url,
        default_model = %config.defaults.model,
        timeout_secs = config.timeout.as_secs(),
        "Configuration loaded"
    );

    let provider = OpenAIProvider::new(&config)?;
    let state = Arc::new(AppState {
        orchestrator: Orchestrator::new(Arc::new(provider)),
        defaults: config.defaults.clone(),
    });

    let static_dir = if cli.static_dir.is_dir() {
        Some(cli.static_dir.clone())
    } else {
        warn!(dir = %cli.static_dir.display(), "Static directory not found, serving API only");
        None
    };

    let app = build_router(state, static_dir);

    let listener = TcpListener::bind(&cli.listen).await?;
    info!("Listening on {}", cli.listen);

    axum::serve(listener, app).await?;

    Ok(())
}
