//! Tool trait definition

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use super::context::ToolContext;
use super::error::ToolError;

/// A tool the agent can call through `tools/call`
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as advertised in `tools/list`
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Do the work, returning the text shown to the agent
    async fn call(&self, input: Value, ctx: &ToolContext) -> Result<String, ToolError>;

    /// Text put in front of failure messages, e.g. `Failed to log activity`
    fn failure_prefix(&self) -> Option<&'static str> {
        None
    }

    /// Run the tool; failures come back in-band as an error result
    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        match self.call(input, ctx).await {
            Ok(text) => ToolResult::success(text),
            Err(e) => {
                warn!(tool = self.name(), request_id = %ctx.request_id, error = %e, "Tool call failed");
                ToolResult::failure(self.failure_prefix(), &e)
            }
        }
    }
}

/// Outcome of a tool call, sent back as a single text item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }

    /// Error result for `err`, optionally prefixed (`<prefix>: <err>`)
    pub fn failure(prefix: Option<&str>, err: &ToolError) -> Self {
        match prefix {
            Some(prefix) => Self::error(format!("{}: {}", prefix, err)),
            None => Self::error(err.to_string()),
        }
    }
}
