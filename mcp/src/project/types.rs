//! Project configuration types
//!
//! Mirrors `.simone/project.yaml`. Every open record keeps its known fields
//! typed and passes anything else through an `extra` map, so templates can
//! reference custom keys without the loader knowing about them.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ProjectConfigError;

/// Named tool entries (`lint`, `test`, `format`, `commit`, or anything custom)
pub type ToolingConfig = BTreeMap<String, FeatureConfig>;

/// Root of `.simone/project.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub project: ProjectMetadata,

    /// Buildable units, in declaration order
    pub contexts: Vec<ProjectContext>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared: Option<SharedConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GitHubConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<FeaturesConfig>,
}

impl ProjectConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Self, ProjectConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the structural invariants the rest of the server relies on
    pub fn validate(&self) -> Result<(), ProjectConfigError> {
        if self.contexts.is_empty() {
            return Err(ProjectConfigError::NoContexts);
        }

        let mut seen = HashSet::new();
        for context in &self.contexts {
            if !seen.insert(context.name.as_str()) {
                return Err(ProjectConfigError::DuplicateContext {
                    name: context.name.clone(),
                });
            }
        }

        Ok(())
    }

    /// Find a context by name
    pub fn context(&self, name: &str) -> Option<&ProjectContext> {
        self.contexts.iter().find(|c| c.name == name)
    }
}

/// Project identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ProjectKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// 1 = careful, 5 = balanced, 10 = risky
    #[serde(rename = "riskLevel", default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    Single,
    Monorepo,
}

/// One buildable unit within the project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectContext {
    pub name: String,

    /// Root of this context, relative to the project root
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<StackConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooling: Option<ToolingConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methodology: Option<MethodologyConfig>,

    /// Overrides the project-level GitHub settings for this context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GitHubConfig>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Defaults merged into every context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooling: Option<ToolingConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methodology: Option<MethodologyConfig>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A capability that can be switched on or off
///
/// Entries are read leniently: `enabled` keeps whatever value the file holds,
/// and an entry that is not a mapping (`lint: eslint`) loads as a disabled
/// feature carrying the raw value under `value`. Only a literal `true` counts
/// as enabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct FeatureConfig {
    pub enabled: Value,

    pub command: Option<String>,

    /// Tool specific settings (`autofix`, `coverage`, `check`, ...)
    pub extra: Map<String, Value>,
}

impl FeatureConfig {
    pub fn is_enabled(&self) -> bool {
        is_true(&self.enabled)
    }
}

impl From<Value> for FeatureConfig {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(mut extra) => {
                let enabled = extra.remove("enabled").unwrap_or(Value::Null);
                let command = match extra.remove("command") {
                    Some(Value::String(command)) => Some(command),
                    Some(other) => {
                        extra.insert("command".to_string(), other);
                        None
                    }
                    None => None,
                };
                Self { enabled, command, extra }
            }
            Value::Null => Self::default(),
            other => Self {
                extra: Map::from_iter([("value".to_string(), other)]),
                ..Self::default()
            },
        }
    }
}

impl From<FeatureConfig> for Value {
    fn from(feature: FeatureConfig) -> Self {
        let mut map = feature.extra;
        if !feature.enabled.is_null() {
            map.insert("enabled".to_string(), feature.enabled);
        }
        if let Some(command) = feature.command {
            map.insert("command".to_string(), Value::String(command));
        }
        Value::Object(map)
    }
}

/// `true` only for a literal boolean `true`
fn is_true(value: &Value) -> bool {
    matches!(value, Value::Bool(true))
}

/// Reads any YAML value as a flag; anything but `true` is off
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(is_true(&Value::deserialize(deserializer)?))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<FrameworkConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styling: Option<StylingConfig>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameworkConfig {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub enabled: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub enabled: Value,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orm: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StylingConfig {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub enabled: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Development style tags (`tdd`, `clean`, `github-flow`, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodologyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub development: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MethodologyConfig {
    /// Overlay `over` on top of `self`, key by key
    ///
    /// Keys set in `over` win; keys only present in `self` carry over.
    pub fn overlay(&self, over: &MethodologyConfig) -> MethodologyConfig {
        let mut extra = self.extra.clone();
        for (key, value) in &over.extra {
            extra.insert(key.clone(), value.clone());
        }

        MethodologyConfig {
            development: over.development.clone().or_else(|| self.development.clone()),
            architecture: over.architecture.clone().or_else(|| self.architecture.clone()),
            workflow: over.workflow.clone().or_else(|| self.workflow.clone()),
            extra,
        }
    }
}

/// GitHub integration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// `owner/repo`
    pub repository: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<GitHubTool>,

    #[serde(rename = "defaultLabels", default, skip_serializing_if = "Option::is_none")]
    pub default_labels: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GitHubConfig {
    /// The configured tool, `cli` when unset
    pub fn tool(&self) -> GitHubTool {
        self.tool.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GitHubTool {
    Mcp,
    #[default]
    Cli,
}

/// Optional functionality toggles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeaturesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_worktree: Option<GitWorktreeConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_review_wait: Option<PrReviewWaitConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitWorktreeConfig {
    #[serde(default, deserialize_with = "lenient_flag")]
    pub enabled: bool,

    #[serde(default = "default_worktree_path")]
    pub path: String,
}

fn default_worktree_path() -> String {
    ".worktrees".to_string()
}

/// Waiting for automated PR reviews; all durations in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrReviewWaitConfig {
    #[serde(default, deserialize_with = "lenient_flag")]
    pub enabled: bool,

    #[serde(default = "default_initial_wait")]
    pub initial_wait: u64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    #[serde(default = "default_review_timeout")]
    pub timeout: u64,

    #[serde(default, deserialize_with = "lenient_flag")]
    pub auto_merge: bool,
}

fn default_initial_wait() -> u64 {
    30
}

fn default_poll_interval() -> u64 {
    30
}

fn default_review_timeout() -> u64 {
    600
}
