pub mod mock;
pub mod perplexity;

use std::fmt;
use std::time::Duration;

pub use mock::MockClient;
pub use perplexity::PerplexityClient;

use crate::config::Config;
use crate::error::ChatError;
use crate::provider::Provider;

pub const DEFAULT_API_URL: &str = "https://api.perplexity.ai/chat/completions";
pub const DEFAULT_MODEL: &str = "sonar-pro";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a professional AI assistant. Provide clear, \
concise, and accurate responses. Use professional language and avoid markdown formatting. \
For letters and emails, structure them with proper line breaks: Subject on its own line, \
greeting on a new line, each paragraph separated, and closing on a new line. Keep responses \
informative but conversational.";

/// Everything the HTTP client needs, handed over explicitly at construction
#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub system_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub timeout: Duration,
    pub retry_transient: bool,
    pub retry_backoff: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: 1000,
            temperature: 0.2,
            top_p: 0.9,
            timeout: Duration::from_secs(60),
            retry_transient: true,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

// Keeps the key out of logs.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("timeout", &self.timeout)
            .field("retry_transient", &self.retry_transient)
            .finish()
    }
}

/// The client for whichever provider is active
#[derive(Debug, Clone)]
pub enum Backend {
    Perplexity(PerplexityClient),
    Mock(MockClient),
}

impl Backend {
    pub fn from_config(provider: Provider, config: &Config) -> Result<Self, ChatError> {
        match provider {
            Provider::Perplexity => Ok(Backend::Perplexity(PerplexityClient::new(
                config.client_config(),
            )?)),
            Provider::Mock => Ok(Backend::Mock(MockClient::new())),
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            Backend::Perplexity(_) => Provider::Perplexity,
            Backend::Mock(_) => Provider::Mock,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Backend::Perplexity(client) => client.model(),
            Backend::Mock(_) => "canned",
        }
    }

    /// Whether a credential is configured; providers without one always have it.
    pub fn has_api_key(&self) -> bool {
        match self {
            Backend::Perplexity(client) => client.has_api_key(),
            Backend::Mock(_) => true,
        }
    }

    /// One stateless request: the reply to `text` alone, no history.
    pub async fn send_message(&self, text: &str) -> Result<String, ChatError> {
        match self {
            Backend::Perplexity(client) => client.send_message(text).await,
            Backend::Mock(client) => client.send_message(text).await,
        }
    }
}
