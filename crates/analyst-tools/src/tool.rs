//! Tool trait definition

use crate::Result;
use analyst_llm::ToolDefinition;
use async_trait::async_trait;
use serde_json::Value;

/// A function the language model may call
///
/// Each tool provides a name, a description and a JSON Schema for its
/// input. Market-data tools (quotes, market overview) implement this in the
/// surrounding application.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with the model-supplied arguments
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Tool name, unique within a toolset
    fn name(&self) -> &str;

    /// What the tool does, as shown to the model
    fn description(&self) -> &str;

    /// JSON Schema of the input
    fn input_schema(&self) -> Value;

    /// Definition advertised to the model
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}
