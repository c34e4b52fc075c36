use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::ClientConfig;
use crate::error::ChatError;
use crate::format::clean_reply;

/// Shown when a well-formed reply carries no text
pub const EMPTY_REPLY_PLACEHOLDER: &str = "Sorry, I couldn't generate a response.";

/// Longest provider error message carried into a `ChatError`
const MAX_ERROR_DETAIL: usize = 200;

#[derive(Serialize)]
struct ChatCompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatCompletionMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct ChatCompletionChoice {
    #[serde(default)]
    message: Option<ChatCompletionReply>,
}

#[derive(Deserialize)]
struct ChatCompletionReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// One failed attempt, and whether trying again could help
struct AttemptError {
    error: ChatError,
    transient: bool,
}

impl AttemptError {
    fn transient(error: ChatError) -> Self {
        Self { error, transient: true }
    }

    fn fatal(error: ChatError) -> Self {
        Self { error, transient: false }
    }
}

#[derive(Debug, Clone)]
pub struct PerplexityClient {
    client: Client,
    config: ClientConfig,
}

impl PerplexityClient {
    pub fn new(config: ClientConfig) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChatError::Request(format!("could not build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_ok()
    }

    fn api_key(&self) -> Result<&str, ChatError> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                ChatError::Configuration(format!(
                    "set {} or add api_key to the config file",
                    crate::config::API_KEY_ENV
                ))
            })
    }

    /// Send a single message and return the cleaned-up reply.
    ///
    /// Fails before touching the network when no key is configured. A
    /// transient failure (connection error, timeout, 429, 5xx) is retried
    /// once when the config allows it.
    pub async fn send_message(&self, text: &str) -> Result<String, ChatError> {
        let api_key = self.api_key()?;

        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatCompletionMessage {
                    role: "system",
                    content: &self.config.system_prompt,
                },
                ChatCompletionMessage {
                    role: "user",
                    content: text,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
        };

        let max_attempts = if self.config.retry_transient { 2 } else { 1 };
        let mut attempt = 1;
        loop {
            match self.post(api_key, &request).await {
                Ok(raw) => {
                    tracing::debug!(
                        chars = raw.chars().count(),
                        attempt,
                        "Received reply from {}",
                        self.config.model
                    );
                    return Ok(clean_reply(&raw));
                }
                Err(failure) if failure.transient && attempt < max_attempts => {
                    tracing::warn!("Transient failure, retrying once: {}", failure.error);
                    tokio::time::sleep(self.config.retry_backoff).await;
                    attempt += 1;
                }
                Err(failure) => {
                    tracing::error!("Chat completion failed: {}", failure.error);
                    return Err(failure.error);
                }
            }
        }
    }

    async fn post(
        &self,
        api_key: &str,
        request: &ChatCompletionRequest<'_>,
    ) -> Result<String, AttemptError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let error = ChatError::Request(e.to_string());
                if e.is_timeout() || e.is_connect() {
                    AttemptError::transient(error)
                } else {
                    AttemptError::fatal(error)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::debug!(%status, body = %text, "Error response from provider");
            let error = status_error(status, &text);
            return Err(if is_transient_status(status) {
                AttemptError::transient(error)
            } else {
                AttemptError::fatal(error)
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| AttemptError::fatal(ChatError::Request(e.to_string())))?;

        extract_content(&body).map_err(AttemptError::fatal)
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Keep the status, plus the provider's own message when the body is a JSON
/// error object. Anything else (HTML pages, plain text) stays in the log.
fn status_error(status: StatusCode, body: &str) -> ChatError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => {
            let message = parsed.error.message.trim();
            let detail: String = message.chars().take(MAX_ERROR_DETAIL).collect();
            let ellipsis = if detail.len() < message.len() { "..." } else { "" };
            ChatError::Request(format!("status {}: {}{}", status, detail, ellipsis))
        }
        Err(_) => ChatError::Request(format!("status {}", status)),
    }
}

/// Pull `choices[0].message.content` out of a response body.
fn extract_content(body: &str) -> Result<String, ChatError> {
    let parsed: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| ChatError::Response(e.to_string()))?;

    Ok(parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .filter(|content| !content.is_empty())
        .unwrap_or_else(|| EMPTY_REPLY_PLACEHOLDER.to_string()))
}
