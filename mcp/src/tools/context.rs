//! ToolContext - execution context for tools

use std::path::PathBuf;
use tracing::debug;

/// Execution context for a single tool call
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Project root the server was started for
    pub project_path: PathBuf,

    /// JSON-RPC id of the call, for log correlation
    pub request_id: String,
}

impl ToolContext {
    pub fn new(project_path: PathBuf, request_id: String) -> Self {
        debug!(?project_path, %request_id, "ToolContext::new: called");
        Self {
            project_path,
            request_id,
        }
    }
}
