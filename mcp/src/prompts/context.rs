//! Template context builder
//!
//! Collects the fixed facts every prompt can use: where the project lives,
//! the current time, what Simone files exist and the constitution text.

use std::fs;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::ProjectPaths;

/// Files whose presence means the project already has code or docs
const MANIFESTS: &[&str] = &[
    "package.json",
    "Cargo.toml",
    "pyproject.toml",
    "go.mod",
    "pom.xml",
    "build.gradle",
    "Gemfile",
    "composer.json",
    "requirements.txt",
];
const SOURCE_DIRS: &[&str] = &["src", "lib", "app"];
const READMES: &[&str] = &["README.md", "README", "readme.md"];

/// Variables available to a prompt template
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TemplateContext(Map<String, Value>);

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Convenience accessor for string values
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Build the context for `paths`, with `args` merged last
///
/// Caller arguments are applied after the fixed keys, so an argument named
/// `PROJECT_NAME` replaces the derived one.
pub fn build_template_context(paths: &ProjectPaths, args: &Map<String, Value>) -> TemplateContext {
    debug!(root = %paths.root().display(), args = args.len(), "build_template_context: called");
    let root = paths.root();
    let mut context = TemplateContext::new();

    context.insert("PROJECT_PATH", root.display().to_string());
    context.insert("PROJECT_NAME", project_name(root));
    context.insert("TIMESTAMP", Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

    let constitution = paths.constitution_file();
    let has_constitution = constitution.is_file();
    context.insert("HAS_CONSTITUTION", has_constitution);
    context.insert(
        "HAS_PROJECT_CONFIG",
        paths.project_config_candidates().iter().any(|p| p.is_file()),
    );
    context.insert("HAS_ARCHITECTURE", paths.architecture_file().is_file());
    context.insert("IS_EMPTY_PROJECT", is_empty_project(root));

    if has_constitution {
        context.insert("CONSTITUTION", read_constitution(&constitution));
    }

    for (key, value) in args {
        context.insert(key.clone(), value.clone());
    }

    context
}

/// Final path segment; the whole path when there is none (e.g. `/`)
fn project_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}

fn is_empty_project(root: &Path) -> bool {
    let has_manifest = MANIFESTS.iter().any(|f| root.join(f).is_file());
    let has_source = SOURCE_DIRS.iter().any(|d| root.join(d).is_dir());
    let has_readme = READMES.iter().any(|f| root.join(f).is_file());
    !(has_manifest || has_source || has_readme)
}

/// The constitution text, or an agent-legible explanation of why it is missing
fn read_constitution(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!(?path, error = %e, "Failed to read constitution");
            format!(
                "<error_message>Failed to read {}: {}</error_message> \
                 Ask the user to check that the file exists and is readable, \
                 or run the initialize prompt to recreate it.",
                path.display(),
                e
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("args must be an object"),
        }
    }

    #[test]
    fn test_fixed_keys() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("my-app");
        fs::create_dir_all(&root).unwrap();

        let context = build_template_context(&ProjectPaths::new(&root), &Map::new());

        assert_eq!(context.get_str("PROJECT_NAME"), Some("my-app"));
        assert_eq!(context.get_str("PROJECT_PATH"), Some(root.display().to_string().as_str()));

        let timestamp = context.get_str("TIMESTAMP").unwrap();
        assert!(timestamp.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
        // Millisecond precision: "...:SS.mmmZ"
        assert_eq!(timestamp.split('.').nth(1).map(str::len), Some(4));
    }

    #[test]
    fn test_empty_project_probes() {
        let temp = tempdir().unwrap();
        let context = build_template_context(&ProjectPaths::new(temp.path()), &Map::new());

        assert_eq!(context.get("IS_EMPTY_PROJECT"), Some(&json!(true)));
        assert_eq!(context.get("HAS_CONSTITUTION"), Some(&json!(false)));
        assert_eq!(context.get("HAS_PROJECT_CONFIG"), Some(&json!(false)));
        assert_eq!(context.get("HAS_ARCHITECTURE"), Some(&json!(false)));
        assert!(!context.contains("CONSTITUTION"));
    }

    #[test]
    fn test_source_dir_means_not_empty() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();

        let context = build_template_context(&ProjectPaths::new(temp.path()), &Map::new());
        assert_eq!(context.get("IS_EMPTY_PROJECT"), Some(&json!(false)));
    }

    #[test]
    fn test_simone_files_detected() {
        let temp = tempdir().unwrap();
        let simone = temp.path().join(".simone");
        fs::create_dir_all(&simone).unwrap();
        fs::write(simone.join("constitution.md"), "# Rules\nBe kind.").unwrap();
        fs::write(simone.join("project.yml"), "project: {name: x}\ncontexts: []\n").unwrap();
        fs::write(simone.join("architecture.md"), "# Arch").unwrap();
        fs::write(temp.path().join("Cargo.toml"), "[package]").unwrap();

        let context = build_template_context(&ProjectPaths::new(temp.path()), &Map::new());

        assert_eq!(context.get("HAS_CONSTITUTION"), Some(&json!(true)));
        assert_eq!(context.get("HAS_PROJECT_CONFIG"), Some(&json!(true)));
        assert_eq!(context.get("HAS_ARCHITECTURE"), Some(&json!(true)));
        assert_eq!(context.get("IS_EMPTY_PROJECT"), Some(&json!(false)));
        assert_eq!(context.get_str("CONSTITUTION"), Some("# Rules\nBe kind."));
    }

    #[test]
    fn test_unreadable_constitution_gives_hint() {
        let temp = tempdir().unwrap();
        // Reading a directory fails
        let path = temp.path().join("constitution.md");
        fs::create_dir_all(&path).unwrap();

        let text = read_constitution(&path);
        assert!(text.contains("<error_message>"));
        assert!(text.contains("initialize"));
    }

    #[test]
    fn test_caller_args_override_fixed_keys() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("real-name");
        fs::create_dir_all(&root).unwrap();

        let context = build_template_context(
            &ProjectPaths::new(&root),
            &args(json!({"PROJECT_NAME": "spoofed", "issue": 42})),
        );

        assert_eq!(context.get_str("PROJECT_NAME"), Some("spoofed"));
        assert_eq!(context.get("issue"), Some(&json!(42)));
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let mut context = TemplateContext::new();
        context.insert("A", "b");
        assert_eq!(serde_json::to_value(&context).unwrap(), json!({"A": "b"}));
        assert_eq!(context.into_value(), json!({"A": "b"}));
    }
}
