//! Prompt templating
//!
//! A prompt is a YAML definition (name, description, arguments, Handlebars
//! template). The [`PromptHandler`] looks it up, builds the template
//! context from the project, fills argument defaults and renders it.

mod context;
mod engine;
mod error;
mod handler;
mod helpers;
mod loader;
mod types;

pub mod embedded;

pub use context::{TemplateContext, build_template_context};
pub use engine::{CompiledTemplate, TemplateEngine};
pub use error::{PromptError, error_envelope};
pub use handler::PromptHandler;
pub use helpers::{FeatureHelper, FeaturePath};
pub use loader::{ERROR_PROMPT, TemplateLoader, validate_name};
pub use types::{MessageContent, PromptArgument, PromptMessage, PromptTemplate, Role};
