//! Project configuration errors

use std::path::PathBuf;
use thiserror::Error;

/// Reasons a `project.yaml` could not be used
#[derive(Debug, Error)]
pub enum ProjectConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid project configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Project configuration must declare at least one context")]
    NoContexts,

    #[error("Duplicate context name: {name}")]
    DuplicateContext { name: String },
}
