//! Command-line arguments for the gateway binary.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "llm-relay", about = "HTTP gateway relaying text generation to an LLM provider")]
pub struct Cli {
    /// HTTP listen address.
    #[arg(long, env = "LLM_RELAY_LISTEN", default_value = "0.0.0.0:5000")]
    pub listen: String,

    /// Directory of static files served outside the API routes.
    #[arg(long, env = "LLM_RELAY_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}
