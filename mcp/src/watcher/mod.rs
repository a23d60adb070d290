//! Template hot reload
//!
//! The TemplateWatcher follows the project's prompt and partial directories.
//! When a template file changes it clears the template cache and tells the
//! client that the prompt list changed.

mod config;
mod template_watcher;

pub use config::WatcherConfig;
pub use template_watcher::TemplateWatcher;
