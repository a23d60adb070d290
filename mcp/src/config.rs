//! Server configuration types and loading
//!
//! This is the configuration of the MCP server process itself (where the
//! project layout lives, whether the template watcher runs). The project's
//! own `project.yaml` is handled by [`crate::project`].

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::watcher::WatcherConfig;

/// Environment variable consulted for the project root when `--project` is absent
pub const PROJECT_PATH_ENV: &str = "PROJECT_PATH";

/// Main server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project layout under the project root
    pub paths: PathsConfig,

    /// Template hot-reload configuration
    pub watcher: WatcherConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .simone-mcp.yml
        let local_config = PathBuf::from(".simone-mcp.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/simone-mcp/simone-mcp.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("simone-mcp").join("simone-mcp.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Resolve the project root: explicit flag, then `PROJECT_PATH`, then the current directory
pub fn resolve_project_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(PROJECT_PATH_ENV)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    std::env::current_dir().context("Failed to determine current directory")
}

/// Layout of the Simone files inside a project, relative to the project root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding all Simone files
    #[serde(rename = "simone-dir")]
    pub simone_dir: String,

    /// Project configuration file, inside `simone-dir`
    #[serde(rename = "project-file")]
    pub project_file: String,

    /// Project prompt overrides, inside `simone-dir`
    #[serde(rename = "prompts-dir")]
    pub prompts_dir: String,

    /// Project partial overrides, inside `simone-dir`
    #[serde(rename = "partials-dir")]
    pub partials_dir: String,

    #[serde(rename = "constitution-file")]
    pub constitution_file: String,

    #[serde(rename = "architecture-file")]
    pub architecture_file: String,

    /// Log directory, inside `simone-dir`
    #[serde(rename = "logs-dir")]
    pub logs_dir: String,

    #[serde(rename = "error-log-file")]
    pub error_log_file: String,

    #[serde(rename = "activity-log-file")]
    pub activity_log_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            simone_dir: ".simone".to_string(),
            project_file: "project.yaml".to_string(),
            prompts_dir: "prompts".to_string(),
            partials_dir: "partials".to_string(),
            constitution_file: "constitution.md".to_string(),
            architecture_file: "architecture.md".to_string(),
            logs_dir: "logs".to_string(),
            error_log_file: "mcp-server.error.log".to_string(),
            activity_log_file: "activity.jsonl".to_string(),
        }
    }
}

impl PathsConfig {
    /// Bind this layout to a concrete project root
    pub fn for_project(&self, root: impl Into<PathBuf>) -> ProjectPaths {
        ProjectPaths {
            root: root.into(),
            layout: self.clone(),
        }
    }
}

/// A [`PathsConfig`] bound to a project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    root: PathBuf,
    layout: PathsConfig,
}

impl ProjectPaths {
    /// Default layout rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        PathsConfig::default().for_project(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn simone_dir(&self) -> PathBuf {
        self.root.join(&self.layout.simone_dir)
    }

    /// Candidate project config files, in lookup order
    ///
    /// The configured name comes first; its `.yaml`/`.yml` sibling second.
    pub fn project_config_candidates(&self) -> Vec<PathBuf> {
        let primary = self.simone_dir().join(&self.layout.project_file);
        let sibling = match primary.extension().and_then(|e| e.to_str()) {
            Some("yaml") => Some(primary.with_extension("yml")),
            Some("yml") => Some(primary.with_extension("yaml")),
            _ => None,
        };
        std::iter::once(primary).chain(sibling).collect()
    }

    pub fn prompts_dir(&self) -> PathBuf {
        self.simone_dir().join(&self.layout.prompts_dir)
    }

    pub fn partials_dir(&self) -> PathBuf {
        self.simone_dir().join(&self.layout.partials_dir)
    }

    pub fn constitution_file(&self) -> PathBuf {
        self.simone_dir().join(&self.layout.constitution_file)
    }

    pub fn architecture_file(&self) -> PathBuf {
        self.simone_dir().join(&self.layout.architecture_file)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.simone_dir().join(&self.layout.logs_dir)
    }

    pub fn error_log_file(&self) -> PathBuf {
        self.logs_dir().join(&self.layout.error_log_file)
    }

    pub fn activity_log_file(&self) -> PathBuf {
        self.logs_dir().join(&self.layout.activity_log_file)
    }
}
