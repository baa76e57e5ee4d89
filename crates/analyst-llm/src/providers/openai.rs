//! OpenAI-compatible chat-completions client
//!
//! Works with api.openai.com and with the many services that expose the
//! same `/chat/completions` shape (DashScope, DeepSeek, vLLM, LM Studio).
//!
//! ```no_run
//! use analyst_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! # fn main() -> analyst_llm::Result<()> {
//! let config = OpenAIConfig::new("not-needed")
//!     .with_api_base("http://localhost:1234/v1")
//!     .with_timeout(180);
//! let provider = OpenAIProvider::with_config(config)?;
//! # Ok(())
//! # }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, LanguageModel, LlmError, Message, Result, Role,
    StopReason, TokenUsage, ToolCall, ToolDefinition,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the OpenAI-compatible client
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key, sent as a bearer token
    pub api_key: String,

    /// Base URL, without the `/chat/completions` suffix
    pub api_base: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    /// Config with the given key and default endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Config from `OPENAI_API_KEY` and, if set, `OPENAI_API_BASE`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            LlmError::ConfigurationError("OPENAI_API_KEY environment variable not set".to_string())
        })?;

        let api_base = std::env::var("OPENAI_API_BASE")
            .unwrap_or_else(|_| DEFAULT_OPENAI_API_BASE.to_string());

        Ok(Self {
            api_key,
            api_base,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// OpenAI-compatible language model
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a client with custom configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        if config.timeout_secs == 0 {
            return Err(LlmError::ConfigurationError(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a client with an API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    /// Create a client from the environment, see [`OpenAIConfig::from_env`]
    pub fn from_env() -> Result<Self> {
        Self::with_config(OpenAIConfig::from_env()?)
    }

    /// Current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

#[async_trait]
impl LanguageModel for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = ChatRequest::from_request(&request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.config.timeout_secs)
                } else {
                    LlmError::HttpError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            warn!(status = %status, "Chat completion rejected");

            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthenticationFailed,
                429 => LlmError::RateLimitExceeded(error_text),
                400 => LlmError::InvalidRequest(error_text),
                404 => LlmError::ModelNotFound(request.model),
                _ => LlmError::RequestFailed(format!("HTTP {status}: {error_text}")),
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::UnexpectedResponse(format!("Failed to parse response: {e}")))?;

        chat.into_completion()
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ChatTool>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: ChatFunction,
}

#[derive(Debug, Serialize)]
struct ChatFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

impl ChatRequest {
    fn from_request(request: &CompletionRequest) -> Self {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system",
                content: Some(system.clone()),
                tool_calls: Vec::new(),
                tool_call_id: None,
            });
        }
        messages.extend(request.messages.iter().map(to_chat_message));

        Self {
            model: request.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools: request.tools.iter().map(to_chat_tool).collect(),
        }
    }
}

fn to_chat_message(msg: &Message) -> ChatMessage {
    let role = match msg.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };

    // Assistant turns that only call tools carry a null content
    let content = if msg.content.is_empty() && msg.has_tool_calls() {
        None
    } else {
        Some(msg.content.clone())
    };

    ChatMessage {
        role,
        content,
        tool_calls: msg
            .tool_calls
            .iter()
            .map(|call| WireToolCall {
                id: call.id.clone(),
                kind: function_kind(),
                function: WireFunctionCall {
                    name: call.name.clone(),
                    arguments: call.arguments.to_string(),
                },
            })
            .collect(),
        tool_call_id: msg.tool_call_id.clone(),
    }
}

fn to_chat_tool(tool: &ToolDefinition) -> ChatTool {
    ChatTool {
        kind: "function",
        function: ChatFunction {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.input_schema.clone(),
        },
    }
}

impl ChatResponse {
    fn into_completion(self) -> Result<CompletionResponse> {
        let usage = self
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::UnexpectedResponse("No choices in response".to_string()))?;

        let calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| {
                let arguments = if call.function.arguments.trim().is_empty() {
                    serde_json::Value::Object(serde_json::Map::new())
                } else {
                    serde_json::from_str(&call.function.arguments).map_err(|e| {
                        LlmError::UnexpectedResponse(format!("Failed to parse tool arguments: {e}"))
                    })?
                };
                Ok(ToolCall::new(call.id, call.function.name, arguments))
            })
            .collect::<Result<Vec<_>>>()?;

        let stop_reason = map_stop_reason(choice.finish_reason.as_deref(), !calls.is_empty());
        debug!(
            stop_reason = ?stop_reason,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "Chat completion received"
        );

        Ok(CompletionResponse {
            message: Message::assistant_tool_calls(choice.message.content.unwrap_or_default(), calls),
            stop_reason,
            usage,
        })
    }
}

fn map_stop_reason(reason: Option<&str>, has_tool_calls: bool) -> StopReason {
    match reason {
        Some("length") => StopReason::MaxTokens,
        Some("tool_calls" | "function_call") => StopReason::ToolUse,
        _ if has_tool_calls => StopReason::ToolUse,
        _ => StopReason::EndTurn,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_creation() {
        let provider = OpenAIProvider::new("test-key").unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.config().api_base, DEFAULT_OPENAI_API_BASE);
    }

    #[test]
    fn test_custom_config() {
        let config = OpenAIConfig::new("k")
            .with_api_base("http://localhost:1234/v1/")
            .with_timeout(60);
        assert_eq!(config.api_base, "http://localhost:1234/v1");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = OpenAIProvider::with_config(OpenAIConfig::new("k").with_timeout(0));
        assert!(matches!(result, Err(LlmError::ConfigurationError(_))));
    }

    #[test]
    fn test_request_puts_system_first() {
        let request = CompletionRequest::builder("m")
            .system("您是一位资深的A股市场分析师")
            .add_message(Message::user("请分析股票 600519.SH"))
            .tools(vec![ToolDefinition::new(
                "get_china_stock_data",
                "quotes",
                json!({"type": "object"}),
            )])
            .build();

        let body = serde_json::to_value(ChatRequest::from_request(&request)).unwrap();
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "get_china_stock_data");
    }

    #[test]
    fn test_tool_turns_round_trip_to_wire() {
        let call = ToolCall::new("call_1", "get_china_stock_data", json!({"ticker": "600519"}));
        let assistant = to_chat_message(&Message::assistant_tool_calls("", vec![call]));
        assert!(assistant.content.is_none());
        assert_eq!(assistant.tool_calls[0].function.arguments, r#"{"ticker":"600519"}"#);

        let tool = to_chat_message(&Message::tool_result("call_1", "price: 1500"));
        assert_eq!(tool.role, "tool");
        assert_eq!(tool.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_parse_text_response() {
        let raw = json!({
            "choices": [{"message": {"role": "assistant", "content": "## 600519 快速评估"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 650, "completion_tokens": 180}
        });
        let chat: ChatResponse = serde_json::from_value(raw).unwrap();
        let completion = chat.into_completion().unwrap();
        assert_eq!(completion.stop_reason, StopReason::EndTurn);
        assert_eq!(completion.usage, TokenUsage::new(650, 180));
        assert!(completion.message.text().starts_with("## 600519"));
    }

    #[test]
    fn test_parse_tool_call_response() {
        let raw = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_9",
                        "type": "function",
                        "function": {"name": "get_china_market_overview", "arguments": ""}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        });
        let chat: ChatResponse = serde_json::from_value(raw).unwrap();
        let completion = chat.into_completion().unwrap();
        assert_eq!(completion.stop_reason, StopReason::ToolUse);
        assert_eq!(completion.message.tool_calls[0].name, "get_china_market_overview");
        assert_eq!(completion.message.tool_calls[0].arguments, json!({}));
        assert!(completion.usage.is_empty());
    }

    #[test]
    fn test_empty_choices_is_unexpected() {
        let chat: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(
            chat.into_completion(),
            Err(LlmError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(map_stop_reason(Some("stop"), false), StopReason::EndTurn);
        assert_eq!(map_stop_reason(Some("length"), false), StopReason::MaxTokens);
        assert_eq!(map_stop_reason(Some("tool_calls"), true), StopReason::ToolUse);
        assert_eq!(map_stop_reason(None, true), StopReason::ToolUse);
    }
}
