//! Template Loader
//!
//! Finds prompt definitions: project overrides in `.simone/prompts/` first,
//! then the built-in prompts compiled into the binary.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::embedded::{self, BUILTIN_PROMPTS};
use super::error::PromptError;
use super::types::PromptTemplate;

/// Name of the prompt used to render error envelopes; never listed
pub const ERROR_PROMPT: &str = "error";

const EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Loads prompt templates by name
#[derive(Debug, Clone)]
pub struct TemplateLoader {
    /// Project override directory (`.simone/prompts/`)
    project_dir: Option<PathBuf>,
}

impl TemplateLoader {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: Some(project_dir.into()),
        }
    }

    /// A loader that only knows the built-in prompts
    pub fn embedded_only() -> Self {
        Self { project_dir: None }
    }

    /// Load a prompt by name; `None` when missing, invalid or malformed
    pub fn load_prompt(&self, name: &str) -> Option<PromptTemplate> {
        debug!(%name, "TemplateLoader::load_prompt: called");
        if let Err(e) = validate_name(name) {
            warn!(error = %e, "Rejected prompt name");
            return None;
        }

        if let Some(dir) = &self.project_dir {
            for ext in EXTENSIONS {
                let path = dir.join(format!("{}.{}", name, ext));
                if path.is_file() {
                    debug!(?path, "Loading prompt from project override");
                    return parse_file(&path, name);
                }
            }
        }

        let source = embedded::get_prompt(name)?;
        debug!(%name, "Using built-in prompt");
        parse(source, name, "built-in")
    }

    /// Every prompt available, project overrides first, without the error prompt
    pub fn list_available_prompts(&self) -> Vec<PromptTemplate> {
        let mut seen = HashSet::new();
        let mut prompts = Vec::new();

        let project_names = self.project_dir.as_deref().map(list_dir).unwrap_or_default();
        let builtin_names = BUILTIN_PROMPTS.iter().map(|(n, _)| n.to_string());

        for name in project_names.into_iter().chain(builtin_names) {
            if !seen.insert(name.clone()) {
                continue;
            }
            if let Some(prompt) = self.load_prompt(&name)
                && prompt.name != ERROR_PROMPT
            {
                prompts.push(prompt);
            }
        }

        prompts
    }

    pub fn project_dir(&self) -> Option<&Path> {
        self.project_dir.as_deref()
    }
}

/// Prompt names are file stems; anything that could leave the directory is rejected
pub fn validate_name(name: &str) -> Result<(), PromptError> {
    let invalid = name.is_empty()
        || name == "."
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        return Err(PromptError::InvalidName { name: name.to_string() });
    }
    Ok(())
}

/// Prompt names from `*.yaml`/`*.yml` files in `dir`, sorted
fn list_dir(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(?dir, error = %e, "list_dir: prompts directory unreadable");
            return Vec::new();
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| EXTENSIONS.contains(&ext))
        })
        .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
        .collect();
    names.sort();
    names.dedup();
    names
}

fn parse_file(path: &Path, name: &str) -> Option<PromptTemplate> {
    match fs::read_to_string(path) {
        Ok(content) => parse(&content, name, &path.display().to_string()),
        Err(e) => {
            warn!(?path, error = %e, "Failed to read prompt");
            None
        }
    }
}

fn parse(content: &str, name: &str, origin: &str) -> Option<PromptTemplate> {
    match serde_yaml::from_str::<PromptTemplate>(content) {
        Ok(mut prompt) => {
            if prompt.name.is_empty() {
                prompt.name = name.to_string();
            }
            Some(prompt)
        }
        Err(e) => {
            warn!(%name, %origin, error = %e, "Malformed prompt definition");
            None
        }
    }
}
