//! Immutable, ordered set of tools

use crate::{Result, Tool, ToolError};
use analyst_llm::{Message, ToolCall, ToolDefinition};
use analyst_utils::truncate_chars;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Fixed set of tools handed to an analyst
///
/// Order is preserved so the definitions sent to the model are identical
/// across invocations.
#[derive(Clone, Default)]
pub struct Toolset {
    tools: Vec<Arc<dyn Tool>>,
}

impl Toolset {
    /// Build a toolset, rejecting duplicate names
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for tool in &tools {
            if !seen.insert(tool.name().to_string()) {
                return Err(ToolError::DuplicateName(tool.name().to_string()));
            }
        }
        Ok(Self { tools })
    }

    /// A toolset with no tools
    pub fn empty() -> Self {
        Self::default()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Tool names, in order
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Tool names joined with `", "`, for prompt rendering
    pub fn joined_names(&self) -> String {
        self.names().join(", ")
    }

    /// Definitions to bind to the model
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Number of tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the toolset is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute the tool called `name`
    pub async fn execute(&self, name: &str, params: Value) -> Result<Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.execute(params).await
    }

    /// Execute one model-requested call and wrap the outcome as a tool message
    ///
    /// Failures and unknown tools become error results rather than `Err`, so
    /// the conversation can continue. Output is cut to `max_chars` chars.
    pub async fn execute_call(&self, call: &ToolCall, max_chars: usize) -> Message {
        match self.execute(&call.name, call.arguments.clone()).await {
            Ok(value) => {
                let rendered = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                info!(tool_name = %call.name, result_length = rendered.len(), "Tool call succeeded");
                Message::tool_result(&call.id, truncate_chars(&rendered, max_chars))
            }
            Err(ToolError::UnknownTool(name)) => {
                warn!(tool_name = %name, "Model requested unknown tool");
                Message::tool_error(&call.id, format!("未知工具: {name}"))
            }
            Err(e) => {
                warn!(tool_name = %call.name, error = %e, "Tool call failed");
                Message::tool_error(&call.id, format!("工具调用失败: {e}"))
            }
        }
    }

    /// Execute every call in order
    pub async fn execute_calls(&self, calls: &[ToolCall], max_chars: usize) -> Vec<Message> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            results.push(self.execute_call(call, max_chars).await);
        }
        results
    }
}

impl std::fmt::Debug for Toolset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
