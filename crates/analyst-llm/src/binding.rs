//! A language model bound to a fixed toolset and generation settings

use crate::{CompletionRequest, CompletionResponse, LanguageModel, Message, Result, ToolDefinition};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Generation parameters applied to every call of a [`BoundModel`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Model identifier passed to the service
    pub model: String,
    /// Max tokens per completion
    pub max_tokens: usize,
    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 2048,
            temperature: Some(0.3),
        }
    }
}

/// A model with its tool definitions attached
///
/// Binding happens once; every [`invoke`](Self::invoke) sends the same tool
/// list and settings, so two calls with the same prompt and history produce
/// identical requests.
#[derive(Clone)]
pub struct BoundModel {
    model: Arc<dyn LanguageModel>,
    tools: Vec<ToolDefinition>,
    settings: GenerationSettings,
}

impl BoundModel {
    /// Bind `tools` and `settings` to `model`
    pub fn new(
        model: Arc<dyn LanguageModel>,
        tools: Vec<ToolDefinition>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            model,
            tools,
            settings,
        }
    }

    /// Bound tool definitions
    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Generation settings
    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Build the request that [`invoke`](Self::invoke) would send
    pub fn request(&self, system: &str, messages: &[Message]) -> CompletionRequest {
        CompletionRequest::builder(&self.settings.model)
            .system(system)
            .messages(messages.to_vec())
            .max_tokens(self.settings.max_tokens)
            .temperature(self.settings.temperature)
            .tools(self.tools.clone())
            .build()
    }

    /// Submit `system` plus `messages` to the model in a single call
    pub async fn invoke(&self, system: &str, messages: &[Message]) -> Result<CompletionResponse> {
        let request = self.request(system, messages);
        debug!(
            model = %request.model,
            message_count = request.messages.len(),
            tool_count = request.tools.len(),
            "Sending completion request"
        );
        self.model.complete(request).await
    }
}

impl std::fmt::Debug for BoundModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundModel")
            .field("tools", &self.tools)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LlmError, MockLanguageModel, TokenUsage};
    use serde_json::json;

    fn quote_tool() -> ToolDefinition {
        ToolDefinition::new("get_china_stock_data", "A-share quotes", json!({"type": "object"}))
    }

    #[tokio::test]
    async fn test_invoke_sends_system_tools_and_history() {
        let mut mock = MockLanguageModel::new();
        mock.expect_complete()
            .withf(|req| {
                req.system.as_deref() == Some("system text")
                    && req.tools.len() == 1
                    && req.tools[0].name == "get_china_stock_data"
                    && req.messages.len() == 1
                    && req.model == "test-model"
            })
            .times(1)
            .returning(|_| Ok(CompletionResponse::text("done", TokenUsage::new(10, 2))));

        let bound = BoundModel::new(
            Arc::new(mock),
            vec![quote_tool()],
            GenerationSettings {
                model: "test-model".to_string(),
                ..GenerationSettings::default()
            },
        );

        let response = bound
            .invoke("system text", &[Message::user("hi")])
            .await
            .unwrap();
        assert_eq!(response.message.text(), "done");
        assert_eq!(response.usage.input_tokens, 10);
    }

    #[tokio::test]
    async fn test_invoke_propagates_service_error() {
        let mut mock = MockLanguageModel::new();
        mock.expect_complete()
            .returning(|_| Err(LlmError::Timeout(30)));

        let bound = BoundModel::new(Arc::new(mock), Vec::new(), GenerationSettings::default());
        let err = bound.invoke("s", &[]).await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout(30)));
    }

    #[test]
    fn test_request_is_stable() {
        let bound = BoundModel::new(
            Arc::new(MockLanguageModel::new()),
            vec![quote_tool()],
            GenerationSettings::default(),
        );
        let history = [Message::user("请分析股票 600519.SH")];
        let a = serde_json::to_value(bound.request("p", &history)).unwrap();
        let b = serde_json::to_value(bound.request("p", &history)).unwrap();
        assert_eq!(a, b);
    }
}
