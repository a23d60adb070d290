//! ToolExecutor - registry and dispatch of tools

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::activity::ActivityLogger;

use super::builtin::LogActivityTool;
use super::{Tool, ToolContext, ToolError, ToolResult};

/// Tool metadata as advertised in `tools/list`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Manages the tools offered by the server
pub struct ToolExecutor {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolExecutor {
    /// Create executor with the standard tools
    pub fn standard(activity: ActivityLogger) -> Self {
        let mut executor = Self::empty();
        executor.add_tool(Box::new(LogActivityTool::new(activity)));
        executor
    }

    /// Create an executor with no tools
    pub fn empty() -> Self {
        Self { tools: BTreeMap::new() }
    }

    /// Add a tool to the executor
    pub fn add_tool(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Tool definitions, sorted by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Execute a tool call by name
    pub async fn execute(&self, name: &str, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(%name, request_id = %ctx.request_id, "ToolExecutor::execute: called");
        match self.tools.get(name) {
            Some(tool) => tool.execute(input, ctx).await,
            None => {
                let err = ToolError::UnknownTool { name: name.to_string() };
                warn!(error = %err, "Tool call rejected");
                ToolResult::failure(None, &err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use tempfile::tempdir;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn description(&self) -> &'static str {
            "Echo the input back"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }

        async fn call(&self, input: Value, _ctx: &ToolContext) -> Result<String, ToolError> {
            Ok(input.to_string())
        }
    }

    fn ctx() -> ToolContext {
        ToolContext::new(std::env::temp_dir(), "1".to_string())
    }

    #[test]
    fn test_standard_executor_has_log_activity() {
        let temp = tempdir().unwrap();
        let executor = ToolExecutor::standard(ActivityLogger::new(temp.path().join("a.jsonl")));

        let names: Vec<String> = executor.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["log_activity"]);
    }

    #[test]
    fn test_definitions_shape() {
        let temp = tempdir().unwrap();
        let executor = ToolExecutor::standard(ActivityLogger::new(temp.path().join("a.jsonl")));
        let defs = executor.definitions();

        assert_eq!(defs.len(), 1);
        let json = serde_json::to_value(&defs[0]).unwrap();
        assert_eq!(json["name"], "log_activity");
        assert_eq!(json["inputSchema"]["type"], "object");
    }

    #[tokio::test]
    async fn test_execute_dispatches_by_name() {
        let mut executor = ToolExecutor::empty();
        executor.add_tool(Box::new(EchoTool));

        let result = executor.execute("echo", json!({"a": 1}), &ctx()).await;
        assert!(!result.is_error);
        assert_eq!(result.content, r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let executor = ToolExecutor::empty();

        let result = executor.execute("unknown_tool", json!({}), &ctx()).await;
        assert!(result.is_error);
        assert_eq!(result.content, "Unknown tool: unknown_tool");
    }
}
