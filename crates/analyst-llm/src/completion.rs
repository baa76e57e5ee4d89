//! Completion request and response types

use crate::{Message, ToolDefinition};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Request for one model completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier (provider-specific)
    pub model: String,

    /// System instructions, sent ahead of the conversation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Conversation history
    pub messages: Vec<Message>,

    /// Maximum tokens to generate
    pub max_tokens: usize,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Tools the model may call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

/// Response from a model completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Assistant message
    pub message: Message,

    /// Why generation stopped
    pub stop_reason: StopReason,

    /// Token usage reported by the service
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Plain text reply with the given usage, ending the turn
    pub fn text(content: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            message: Message::assistant(content),
            stop_reason: StopReason::EndTurn,
            usage,
        }
    }
}

/// Reason the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural completion
    EndTurn,
    /// Hit max tokens limit
    MaxTokens,
    /// Stop sequence encountered
    StopSequence,
    /// Tool use requested
    ToolUse,
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of input tokens
    pub input_tokens: usize,

    /// Number of output tokens
    pub output_tokens: usize,
}

impl TokenUsage {
    /// Create a usage record
    pub fn new(input_tokens: usize, output_tokens: usize) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Total tokens used (input + output)
    pub fn total(&self) -> usize {
        self.input_tokens + self.output_tokens
    }

    /// Whether the service reported nothing
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl Add for TokenUsage {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            input_tokens: self.input_tokens + rhs.input_tokens,
            output_tokens: self.output_tokens + rhs.output_tokens,
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl CompletionRequest {
    /// Create a builder for completion requests
    pub fn builder(model: impl Into<String>) -> CompletionRequestBuilder {
        CompletionRequestBuilder::new(model)
    }
}

/// Builder for CompletionRequest
#[derive(Debug)]
pub struct CompletionRequestBuilder {
    request: CompletionRequest,
}

impl CompletionRequestBuilder {
    /// Create a new builder
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            request: CompletionRequest {
                model: model.into(),
                system: None,
                messages: Vec::new(),
                max_tokens: 1024,
                temperature: None,
                tools: Vec::new(),
            },
        }
    }

    /// Set the conversation messages
    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.request.messages = messages;
        self
    }

    /// Add a single message
    pub fn add_message(mut self, message: Message) -> Self {
        self.request.messages.push(message);
        self
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.request.system = Some(system.into());
        self
    }

    /// Set the maximum tokens
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.request.max_tokens = max_tokens;
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: Option<f32>) -> Self {
        self.request.temperature = temperature;
        self
    }

    /// Set the available tools
    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.request.tools = tools;
        self
    }

    /// Build the completion request
    pub fn build(self) -> CompletionRequest {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Message;

    #[test]
    fn test_builder() {
        let request = CompletionRequest::builder("qwen-plus")
            .add_message(Message::user("请分析股票 000858.SZ"))
            .system("您是一位资深的A股市场分析师")
            .max_tokens(2048)
            .temperature(Some(0.2))
            .build();

        assert_eq!(request.model, "qwen-plus");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.max_tokens, 2048);
        assert_eq!(request.temperature, Some(0.2));
        assert!(request.tools.is_empty());
    }

    #[test]
    fn test_token_usage_sum() {
        let mut usage = TokenUsage::new(1000, 200);
        usage += TokenUsage::new(50, 30);
        assert_eq!(usage, TokenUsage::new(1050, 230));
        assert_eq!(usage.total(), 1280);
        assert!(TokenUsage::default().is_empty());
    }
}
