//! LogActivity tool - record what the agent did

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use crate::activity::{ActivityInput, ActivityLogger};
use crate::tools::{Tool, ToolContext, ToolError};

/// LogActivity tool - append an entry to the project's activity log
pub struct LogActivityTool {
    logger: ActivityLogger,
}

impl LogActivityTool {
    pub fn new(logger: ActivityLogger) -> Self {
        Self { logger }
    }

    fn parse_input(input: Value) -> Result<ActivityInput, ToolError> {
        for name in ["activity", "tool_name"] {
            match input.get(name) {
                Some(Value::String(s)) if !s.trim().is_empty() => {}
                _ => {
                    return Err(ToolError::MissingParameter { name });
                }
            }
        }
        serde_json::from_value(input).map_err(|e| ToolError::InvalidArgument(e.to_string()))
    }
}

#[async_trait]
impl Tool for LogActivityTool {
    fn name(&self) -> &'static str {
        "log_activity"
    }

    fn description(&self) -> &'static str {
        "Log your AI-assisted development activities to track progress and patterns.

Required parameters:
- activity: Describe what you did (e.g., \"Created GitHub issue for authentication refactor\")
- tool_name: The tool or feature used (e.g., \"create-task\", \"github-cli\", \"code-analysis\")

Optional parameters:
- success: Whether the operation succeeded (defaults to true)
- error: Error message if the operation failed
- tags: Up to 3 categories from: [task-management, github, feature, improvement, refactoring, bug-fix, research, documentation, testing, configuration, review, planning, analysis] - or create your own if needed
- context: Additional notes or outcomes
- files_affected: List of files created/modified/deleted
- issue_number: Related GitHub issue number
- link: Relevant URL (GitHub issue, PR, documentation, etc.)

The system will automatically:
- Add a timestamp
- Determine activity type (create, update, fix, etc.) from your description
- Store the data for analysis and reporting

IMPORTANT: Only log factual information. Do not estimate or invent data."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "activity": {
                    "type": "string",
                    "description": "What was done"
                },
                "tool_name": {
                    "type": "string",
                    "description": "Tool or feature used"
                },
                "success": {
                    "type": "boolean",
                    "description": "Whether the operation succeeded",
                    "default": true
                },
                "error": {
                    "type": "string",
                    "description": "Error message if failed"
                },
                "tags": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Categories (max 3)"
                },
                "context": {
                    "type": "string",
                    "description": "Additional notes"
                },
                "files_affected": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Files created/modified/deleted"
                },
                "issue_number": {
                    "type": "number",
                    "description": "Related GitHub issue"
                },
                "link": {
                    "type": "string",
                    "description": "Related URL"
                }
            },
            "required": ["activity", "tool_name"]
        })
    }

    async fn call(&self, input: Value, ctx: &ToolContext) -> Result<String, ToolError> {
        let input = Self::parse_input(input)?;

        let logger = self.logger.clone();
        let result = tokio::task::spawn_blocking(move || logger.log_activity(input))
            .await
            .map_err(|e| ToolError::Failed(e.to_string()))?;

        match (result.success, result.activity_id) {
            (true, Some(id)) => {
                info!(request_id = %ctx.request_id, %id, "log_activity succeeded");
                Ok(format!("📋 Activity logged successfully (ID: {})", id))
            }
            _ => Err(ToolError::Failed(
                result.error.unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }

    fn failure_prefix(&self) -> Option<&'static str> {
        Some("Failed to log activity")
    }
}
