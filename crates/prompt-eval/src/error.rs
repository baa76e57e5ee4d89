//! Error types for the evaluator

use market_analyst::AnalystError;
use thiserror::Error;

/// Evaluator errors
///
/// Per-case analyst failures are recorded as failed metric records, not
/// returned; only problems that make the whole run meaningless surface here.
#[derive(Debug, Error)]
pub enum EvalError {
    /// Bad evaluator settings or inputs
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A return source could not supply a return
    #[error("Return lookup failed for {ticker}: {reason}")]
    ReturnSource { ticker: String, reason: String },

    /// Analyst construction failed
    #[error(transparent)]
    Analyst(#[from] AnalystError),

    /// Report serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for evaluator operations
pub type Result<T> = std::result::Result<T, EvalError>;
