use crate::Error;
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Values substituted for request fields the caller left out.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDefaults {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Configuration for the upstream provider.
///
/// Built once at startup and handed to the provider constructor; nothing
/// reads the environment after that.
#[derive(Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    /// Limit on connecting and on silence between upstream reads; a response
    /// that keeps producing data is never cut off.
    pub timeout: Duration,
    pub defaults: RequestDefaults,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl ProviderConfig {
    /// Create configuration for the public OpenAI endpoint.
    pub fn openai(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            defaults: RequestDefaults::default(),
        }
    }

    /// Point the provider at another OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// Recognized keys: `OPENAI_API_KEY` (required), `OPENAI_BASE_URL`,
    /// `LLM_RELAY_DEFAULT_MODEL`, `LLM_RELAY_TIMEOUT_SECS`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::config("OPENAI_API_KEY environment variable is required"))?;

        let mut config = Self::openai(api_key);

        if let Some(base_url) = lookup("OPENAI_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }

        if let Some(model) = lookup("LLM_RELAY_DEFAULT_MODEL").filter(|m| !m.is_empty()) {
            config.defaults.model = model;
        }

        if let Some(raw) = lookup("LLM_RELAY_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                Error::config(format!("LLM_RELAY_TIMEOUT_SECS must be a whole number of seconds, got '{raw}'"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
