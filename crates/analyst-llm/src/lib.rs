//! Language-model abstraction for the market analyst
//!
//! This crate provides the provider-agnostic pieces the analyst and the
//! evaluator talk to:
//!
//! - Message types, including assistant tool calls and tool results
//! - Completion request/response types with token usage
//! - Tool definitions for function calling
//! - The `LanguageModel` trait and `BoundModel`, a model with a fixed toolset
//! - An OpenAI-compatible chat-completions client (feature `openai`)

pub mod binding;
pub mod completion;
pub mod error;
pub mod messages;
pub mod model;
pub mod tools;

pub use binding::{BoundModel, GenerationSettings};
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LlmError, Result};
pub use messages::{Message, Role, ToolCall};
pub use model::LanguageModel;
#[cfg(any(test, feature = "mock"))]
pub use model::MockLanguageModel;
pub use tools::ToolDefinition;

#[cfg(feature = "openai")]
pub mod providers;
