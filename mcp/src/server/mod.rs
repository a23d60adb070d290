//! MCP server over stdio
//!
//! Newline-delimited JSON-RPC 2.0 on stdin/stdout. Stdout carries nothing
//! but protocol messages; all diagnostics go to the log file.

mod mcp_server;
mod messages;

pub use mcp_server::McpServer;
pub use messages::{
    CallToolResult, DEFAULT_PROTOCOL_VERSION, JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    PromptArgumentInfo, PromptInfo, SERVER_NAME, ServerNotification, error_codes,
};
