//! Message types for language-model conversations
//!
//! A conversation is an ordered list of [`Message`]s. Assistant messages may
//! carry tool calls instead of (or next to) text; each tool call is answered
//! by a [`Role::Tool`] message that references the call id.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions
    System,
    /// User message
    User,
    /// Assistant reply
    Assistant,
    /// Result of a tool call
    Tool,
}

/// A tool invocation requested by the assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id, echoed back in the tool result
    pub id: String,
    /// Name of the requested tool
    pub name: String,
    /// Arguments as parsed JSON
    pub arguments: Value,
}

impl ToolCall {
    /// Create a tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Text content, empty when an assistant message only calls tools
    #[serde(default)]
    pub content: String,

    /// Tool calls requested by the assistant
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// For tool messages, the call this answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// For tool messages, whether the tool failed
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            is_error: false,
        }
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::with_role(Role::User, text)
    }

    /// Create an assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, text)
    }

    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        Self::with_role(Role::System, text)
    }

    /// Create an assistant message that requests tool calls
    pub fn assistant_tool_calls(text: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::with_role(Role::Assistant, text)
        }
    }

    /// Create a tool result message
    pub fn tool_result(tool_call_id: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::with_role(Role::Tool, result)
        }
    }

    /// Create a failed tool result message
    pub fn tool_error(tool_call_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::tool_result(tool_call_id, error)
        }
    }

    /// Text content
    pub fn text(&self) -> &str {
        &self.content
    }

    /// Check if this message contains any tool calls
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_message() {
        let msg = Message::user("请分析股票 600519.SH");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), "请分析股票 600519.SH");
        assert!(!msg.has_tool_calls());
    }

    #[test]
    fn test_tool_call_message() {
        let call = ToolCall::new("call_1", "get_china_stock_data", json!({"ticker": "600519"}));
        let msg = Message::assistant_tool_calls("", vec![call.clone()]);
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.has_tool_calls());
        assert_eq!(msg.tool_calls[0], call);
    }

    #[test]
    fn test_tool_error() {
        let msg = Message::tool_error("call_1", "boom");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
        assert!(msg.is_error);
    }

    #[test]
    fn test_plain_message_serializes_without_tool_fields() {
        let value = serde_json::to_value(Message::assistant("ok")).unwrap();
        assert_eq!(value, json!({"role": "assistant", "content": "ok"}));
    }
}
