//! Language-model trait

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// A language-model completion service
///
/// Implementations wrap a concrete service (an OpenAI-compatible endpoint,
/// a local model, a test stub). One call is one request/response round trip;
/// implementations do not retry.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Provider name (e.g., "openai")
    fn name(&self) -> &str;
}
