//! Tool error types

use thiserror::Error;

/// Errors that can occur during tool execution
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Missing required parameter: {name}")]
    MissingParameter { name: &'static str },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    /// The tool ran but could not finish
    #[error("{0}")]
    Failed(String),
}
