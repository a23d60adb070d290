//! Prompt errors and the in-band error envelope

use thiserror::Error;

/// Failures while producing a prompt
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt '{name}' not found")]
    NotFound { name: String },

    #[error("Invalid prompt name: {name}")]
    InvalidName { name: String },

    #[error("Template rendering error: {0}")]
    Render(String),
}

impl From<handlebars::RenderError> for PromptError {
    fn from(e: handlebars::RenderError) -> Self {
        Self::Render(e.to_string())
    }
}

impl From<handlebars::TemplateError> for PromptError {
    fn from(e: handlebars::TemplateError) -> Self {
        Self::Render(e.to_string())
    }
}

/// Wrap a failure so the agent relays it to the user instead of acting on it
pub fn error_envelope(detail: impl std::fmt::Display) -> String {
    format!(
        "Tell the user an error happened and show these error details <error_message>{}</error_message>",
        detail
    )
}
