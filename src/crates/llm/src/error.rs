//! Error types for LLM provider adapters.

use thiserror::Error;

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors that can occur when calling a provider. Under the engine's retry
/// handler, each of these counts as one failed attempt.
#[derive(Debug, Error)]
pub enum LlmError {
    /// API key for the provider is not configured.
    #[error("missing API key for provider {0}")]
    MissingApiKey(String),

    /// Transport-level failure (connect, timeout, TLS).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned a non-success status.
    #[error("{provider} API error (status {status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    /// Response body did not match the expected shape.
    #[error("unexpected {provider} response: {message}")]
    Parse { provider: String, message: String },
}

impl From<LlmError> for engine::EngineError {
    fn from(err: LlmError) -> Self {
        engine::EngineError::Llm(err.to_string())
    }
}
