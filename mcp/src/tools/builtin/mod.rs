//! Built-in tools

mod log_activity;

pub use log_activity::LogActivityTool;
