//! McpServer - JSON-RPC dispatch over stdio

use std::path::{Path, PathBuf};
use std::sync::Arc;

use eyre::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::activity::ActivityLogger;
use crate::config::{Config, ProjectPaths};
use crate::errlog::ErrorLog;
use crate::project::ConfigLoader;
use crate::prompts::{PromptHandler, TemplateEngine};
use crate::tools::{ToolContext, ToolExecutor};

use super::messages::{
    CallToolParams, CallToolResult, GetPromptParams, GetPromptResult, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListPromptsResult, ListToolsResult, PromptInfo,
    ServerNotification,
};

/// The Simone MCP server: prompts plus tools for one project
pub struct McpServer {
    paths: ProjectPaths,
    prompts: PromptHandler,
    tools: ToolExecutor,
    errlog: ErrorLog,
}

impl McpServer {
    pub fn new(paths: ProjectPaths, prompts: PromptHandler, tools: ToolExecutor, errlog: ErrorLog) -> Self {
        Self {
            paths,
            prompts,
            tools,
            errlog,
        }
    }

    /// Wire every component for the project at `project_root`
    pub fn from_config(config: &Config, project_root: impl Into<PathBuf>) -> Self {
        let paths = config.paths.for_project(project_root);
        debug!(root = %paths.root().display(), "McpServer::from_config: called");

        let errlog = ErrorLog::new(paths.error_log_file());
        let project = Arc::new(ConfigLoader::new(paths.clone()));
        if let Some(e) = project.load_error() {
            errlog.log(format!("Failed to load project configuration: {}", e));
        }

        let prompts = PromptHandler::new(paths.clone(), project, errlog.clone());
        let tools = ToolExecutor::standard(ActivityLogger::new(paths.activity_log_file()));
        Self::new(paths, prompts, tools, errlog)
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    pub fn project_root(&self) -> &Path {
        self.paths.root()
    }

    /// Template engine shared with the hot-reload watcher
    pub fn engine(&self) -> Arc<TemplateEngine> {
        self.prompts.engine()
    }

    pub fn prompts(&self) -> &PromptHandler {
        &self.prompts
    }

    pub fn errlog(&self) -> &ErrorLog {
        &self.errlog
    }

    /// Serve until `reader` reaches end of input
    ///
    /// Requests are handled one at a time; notifications from the watcher are
    /// written between requests.
    pub async fn serve<R, W>(
        &self,
        reader: R,
        mut writer: W,
        mut notifications: mpsc::Receiver<ServerNotification>,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(root = %self.project_root().display(), "MCP server started");
        let mut lines = BufReader::new(reader).lines();
        let mut notifications_open = true;

        loop {
            tokio::select! {
                biased;

                notification = notifications.recv(), if notifications_open => {
                    match notification {
                        Some(notification) => {
                            debug!(method = notification.method(), "Sending notification");
                            let line = serde_json::to_string(&notification.to_message())
                                .context("Failed to serialize notification")?;
                            write_line(&mut writer, &line).await?;
                        }
                        None => notifications_open = false,
                    }
                }

                line = lines.next_line() => {
                    let Some(line) = line.context("Failed to read request")? else {
                        info!("Input closed, shutting down");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    if let Some(response) = self.handle_line(&line).await {
                        write_line(&mut writer, &response).await?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Handle one line of input; `None` when no response is due
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let response = match parse_request(line) {
            Ok(request) => self.handle_request(request).await?,
            Err(response) => response,
        };

        match serde_json::to_string(&response) {
            Ok(json) => Some(json),
            Err(e) => {
                self.errlog.log(format!("Failed to serialize response: {}", e));
                None
            }
        }
    }

    /// Dispatch a parsed request
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, id = ?request.id, "McpServer::handle_request: called");

        if request.is_notification() {
            debug!(method = %request.method, "Notification received");
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        Some(match self.dispatch(&request, &id).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => {
                warn!(method = %request.method, code = error.code, message = %error.message, "Request failed");
                JsonRpcResponse::failure(id, error)
            }
        })
    }

    async fn dispatch(&self, request: &JsonRpcRequest, id: &Value) -> Result<Value, JsonRpcError> {
        match request.method.as_str() {
            "initialize" => {
                let params: InitializeParams = optional_params(request.params.as_ref())?;
                to_result(InitializeResult::new(params.protocol_version))
            }
            "ping" => Ok(Value::Object(Map::new())),
            "prompts/list" => {
                let prompts = self.prompts.list_available_prompts();
                to_result(ListPromptsResult {
                    prompts: prompts.iter().map(PromptInfo::from).collect(),
                })
            }
            "prompts/get" => {
                let params: GetPromptParams = required_params(request.params.as_ref())?;
                let arguments = params.arguments.unwrap_or_default();
                let description = self
                    .prompts
                    .load_prompt(&params.name)
                    .map(|p| p.description)
                    .filter(|d| !d.is_empty());
                let messages = self.prompts.get_prompt_messages(&params.name, &arguments);
                to_result(GetPromptResult { description, messages })
            }
            "tools/list" => to_result(ListToolsResult {
                tools: self.tools.definitions(),
            }),
            "tools/call" => {
                let params: CallToolParams = required_params(request.params.as_ref())?;
                let arguments = match params.arguments {
                    Some(Value::Null) | None => Value::Object(Map::new()),
                    Some(args) => args,
                };
                let ctx = ToolContext::new(self.paths.root().to_path_buf(), request_id(id));
                let result = self.tools.execute(&params.name, arguments, &ctx).await;
                to_result(CallToolResult::from(result))
            }
            method => Err(JsonRpcError::method_not_found(method)),
        }
    }
}

/// Parse a line into a request, or the error response it deserves
fn parse_request(line: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| JsonRpcResponse::failure(Value::Null, JsonRpcError::parse_error(e)))?;

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    if !value.is_object() {
        return Err(JsonRpcResponse::failure(
            id,
            JsonRpcError::invalid_request("expected a JSON object"),
        ));
    }

    serde_json::from_value(value).map_err(|e| JsonRpcResponse::failure(id, JsonRpcError::invalid_request(e)))
}

fn required_params<T: serde::de::DeserializeOwned>(params: Option<&Value>) -> Result<T, JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::invalid_params("missing params"))?;
    serde_json::from_value(params.clone()).map_err(JsonRpcError::invalid_params)
}

fn optional_params<T: serde::de::DeserializeOwned + Default>(params: Option<&Value>) -> Result<T, JsonRpcError> {
    match params {
        None | Some(Value::Null) => Ok(T::default()),
        Some(params) => serde_json::from_value(params.clone()).map_err(JsonRpcError::invalid_params),
    }
}

fn to_result<T: Serialize>(result: T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(result).map_err(JsonRpcError::internal)
}

fn request_id(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> Result<()> {
    writer.write_all(line.as_bytes()).await.context("Failed to write response")?;
    writer.write_all(b"\n").await.context("Failed to write newline")?;
    writer.flush().await.context("Failed to flush response")?;
    Ok(())
}
