//! Tool definitions sent to the model

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool definition advertised to the model
///
/// Carries the name, a description the model reads to decide when to call
/// the tool, and the JSON Schema of its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name, unique within a toolset
    pub name: String,

    /// What the tool does
    pub description: String,

    /// JSON schema for the tool's arguments
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// JSON schema builders for tool arguments
pub mod schema {
    use serde_json::{Value, json};

    /// Object schema with the given properties
    ///
    /// ```
    /// use analyst_llm::tools::schema;
    /// use serde_json::json;
    ///
    /// let schema = schema::object(
    ///     json!({
    ///         "ticker": schema::string("Stock code, e.g. 600519.SH"),
    ///         "days": schema::integer("Lookback window in trading days"),
    ///     }),
    ///     &["ticker"],
    /// );
    /// assert_eq!(schema["required"][0], "ticker");
    /// ```
    pub fn object(properties: Value, required: &[&str]) -> Value {
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// String property schema
    pub fn string(description: &str) -> Value {
        json!({
            "type": "string",
            "description": description,
        })
    }

    /// Integer property schema
    pub fn integer(description: &str) -> Value {
        json!({
            "type": "integer",
            "description": description,
        })
    }

    /// Number property schema
    pub fn number(description: &str) -> Value {
        json!({
            "type": "number",
            "description": description,
        })
    }
}
