//! Simone MCP - project-aware prompt templating over the Model Context Protocol
//!
//! Serves Handlebars prompt templates, rendered against the project's
//! `.simone/` configuration, to AI coding agents over stdio, and records the
//! activities those agents report back.

pub mod activity;
pub mod cli;
pub mod config;
pub mod errlog;
pub mod project;
pub mod prompts;
pub mod server;
pub mod tools;
pub mod watcher;
