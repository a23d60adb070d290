//! Tool system
//!
//! Tools are the side-effecting half of the server: the agent calls them by
//! name with a JSON argument object and gets back text plus an error flag.

mod context;
mod error;
mod executor;
mod traits;

pub mod builtin;

pub use context::ToolContext;
pub use error::ToolError;
pub use executor::{ToolDefinition, ToolExecutor};
pub use traits::{Tool, ToolResult};
