//! Tools that an analyst's language model may call
//!
//! A [`Tool`] is a named async function with a JSON Schema for its input.
//! A [`Toolset`] is the fixed, ordered set of tools handed to an analyst at
//! construction time; it produces the tool definitions bound to the model
//! and executes the tool calls the model requests.

pub mod error;
pub mod tool;
pub mod toolset;

pub use error::{Result, ToolError};
pub use tool::Tool;
pub use toolset::Toolset;
