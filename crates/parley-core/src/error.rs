use thiserror::Error;

/// Failures surfaced by a send, shown verbatim in the error banner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// No provider credential is configured. Fatal for the send, not the app.
    #[error("API key is not configured: {0}")]
    Configuration(String),

    /// The HTTP call failed or came back with a non-success status.
    #[error("API request failed: {0}")]
    Request(String),

    /// The payload could not be parsed into the expected shape.
    #[error("Unexpected API response: {0}")]
    Response(String),

    /// A send is already outstanding.
    #[error("A message is already being processed")]
    Busy,
}
