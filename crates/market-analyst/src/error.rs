//! Error types for analyst construction and invocation

use analyst_llm::LlmError;
use thiserror::Error;

/// Analyst errors
#[derive(Debug, Error)]
pub enum AnalystError {
    /// Rejected at construction time (unknown mode, bad settings)
    ///
    /// Not retryable; the call site must change.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The language-model call failed (timeout, transport, malformed reply)
    ///
    /// Surfaced as-is; the analyst never retries.
    #[error("Language model service error: {0}")]
    Service(#[from] LlmError),

    /// The system prompt template failed to render
    #[error("Prompt template error: {0}")]
    Template(String),
}

/// Result type alias for analyst operations
pub type Result<T> = std::result::Result<T, AnalystError>;

impl From<minijinja::Error> for AnalystError {
    fn from(err: minijinja::Error) -> Self {
        Self::Template(err.to_string())
    }
}

impl AnalystError {
    /// Whether the failure came from the model service
    pub fn is_service(&self) -> bool {
        matches!(self, Self::Service(_))
    }
}
