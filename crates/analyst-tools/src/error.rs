//! Error types for tool execution

use thiserror::Error;

/// Result type alias for tool operations
pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors raised by tools and toolsets
#[derive(Error, Debug)]
pub enum ToolError {
    /// No tool with this name in the toolset
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Two tools share a name
    #[error("Duplicate tool name: {0}")]
    DuplicateName(String),

    /// Arguments did not match the tool's schema
    #[error("Invalid input for {tool}: {reason}")]
    InvalidInput {
        tool: String,
        reason: String,
    },

    /// The tool ran and failed
    #[error("Tool {tool} failed: {reason}")]
    ExecutionFailed {
        tool: String,
        reason: String,
    },
}
