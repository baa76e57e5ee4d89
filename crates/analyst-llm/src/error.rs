//! Error types for language-model calls

use thiserror::Error;

/// Result type for language-model operations
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors raised while talking to a language-model service
#[derive(Error, Debug)]
pub enum LlmError {
    /// API request failed
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Invalid API key or authentication failed
    #[error("Invalid API key or authentication failed")]
    AuthenticationFailed,

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// The service rejected the request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Model not found
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Request timed out
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// HTTP transport error
    #[cfg(feature = "openai")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Response did not have the expected shape
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl LlmError {
    /// Whether a caller-side retry could plausibly succeed
    ///
    /// Nothing in this workspace retries; the flag is surfaced for
    /// orchestrators that do.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimitExceeded(_) | Self::Timeout(_) | Self::RequestFailed(_) => true,
            #[cfg(feature = "openai")]
            Self::HttpError(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LlmError::RateLimitExceeded("slow down".to_string());
        assert_eq!(err.to_string(), "Rate limit exceeded: slow down");
        assert_eq!(LlmError::Timeout(30).to_string(), "Request timed out after 30s");
    }

    #[test]
    fn test_transient_classification() {
        assert!(LlmError::Timeout(5).is_transient());
        assert!(LlmError::RateLimitExceeded(String::new()).is_transient());
        assert!(!LlmError::AuthenticationFailed.is_transient());
        assert!(!LlmError::UnexpectedResponse("x".into()).is_transient());
    }
}
