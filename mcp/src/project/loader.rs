//! ConfigLoader - owns the project configuration snapshot

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use crate::config::ProjectPaths;

use super::error::ProjectConfigError;
use super::resolve::{ResolvedContext, resolve_contexts};
use super::types::ProjectConfig;

#[derive(Debug, Default)]
struct LoadState {
    config: Option<Arc<ProjectConfig>>,
    source: Option<PathBuf>,
    error: Option<String>,
}

/// Loads `.simone/project.yaml` once and serves snapshots of it
///
/// Load failures never propagate: the loader simply reports "no config"
/// and keeps the failure message for [`ConfigLoader::load_error`].
#[derive(Debug)]
pub struct ConfigLoader {
    paths: ProjectPaths,
    state: RwLock<LoadState>,
}

impl ConfigLoader {
    /// Create a loader and read the configuration immediately
    pub fn new(paths: ProjectPaths) -> Self {
        debug!(root = %paths.root().display(), "ConfigLoader::new: called");
        let loader = Self {
            paths,
            state: RwLock::new(LoadState::default()),
        };
        loader.reload();
        loader
    }

    /// Re-read the configuration file
    pub fn reload(&self) {
        debug!("ConfigLoader::reload: called");
        let state = match self.read_config() {
            Ok(Some((source, config))) => {
                info!(path = %source.display(), contexts = config.contexts.len(), "Loaded project configuration");
                LoadState {
                    config: Some(Arc::new(config)),
                    source: Some(source),
                    error: None,
                }
            }
            Ok(None) => {
                debug!("ConfigLoader::reload: no project configuration found");
                LoadState::default()
            }
            Err((source, e)) => {
                warn!(path = %source.display(), error = %e, "Ignoring unusable project configuration");
                LoadState {
                    config: None,
                    source: Some(source),
                    error: Some(e.to_string()),
                }
            }
        };

        *self.write_state() = state;
    }

    fn read_config(&self) -> Result<Option<(PathBuf, ProjectConfig)>, (PathBuf, ProjectConfigError)> {
        for candidate in self.paths.project_config_candidates() {
            let content = match fs::read_to_string(&candidate) {
                Ok(content) => content,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(source) => {
                    let err = ProjectConfigError::Read {
                        path: candidate.clone(),
                        source,
                    };
                    return Err((candidate, err));
                }
            };

            return match ProjectConfig::from_yaml(&content) {
                Ok(config) => Ok(Some((candidate, config))),
                Err(e) => Err((candidate, e)),
            };
        }
        Ok(None)
    }

    /// Current configuration snapshot, if one loaded cleanly
    pub fn config(&self) -> Option<Arc<ProjectConfig>> {
        self.read_state().config.clone()
    }

    /// Why the last load produced no configuration, if it failed
    pub fn load_error(&self) -> Option<String> {
        self.read_state().error.clone()
    }

    /// File the configuration was (or failed to be) read from
    pub fn source(&self) -> Option<PathBuf> {
        self.read_state().source.clone()
    }

    pub fn has_config(&self) -> bool {
        self.read_state().config.is_some()
    }

    /// Resolved per-context views; empty without a configuration
    pub fn resolved_contexts(&self) -> Vec<ResolvedContext> {
        match self.config() {
            Some(config) => resolve_contexts(&config),
            None => Vec::new(),
        }
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    fn read_state(&self) -> RwLockReadGuard<'_, LoadState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, LoadState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{TempDir, tempdir};

    const CONFIG: &str = r#"
project:
  name: acme
contexts:
  - name: web
    path: web
    github:
      repository: acme/web
  - name: api
    path: api
github:
  repository: acme/acme
shared:
  tooling:
    lint:
      enabled: true
"#;

    fn project_with(file: &str, content: &str) -> (TempDir, ProjectPaths) {
        let temp = tempdir().unwrap();
        let simone = temp.path().join(".simone");
        fs::create_dir_all(&simone).unwrap();
        fs::write(simone.join(file), content).unwrap();
        let paths = ProjectPaths::new(temp.path());
        (temp, paths)
    }

    #[test]
    fn test_missing_config_is_none() {
        let temp = tempdir().unwrap();
        let loader = ConfigLoader::new(ProjectPaths::new(temp.path()));

        assert!(loader.config().is_none());
        assert!(loader.load_error().is_none());
        assert!(loader.resolved_contexts().is_empty());
    }

    #[test]
    fn test_loads_yaml() {
        let (_temp, paths) = project_with("project.yaml", CONFIG);
        let loader = ConfigLoader::new(paths);

        let config = loader.config().unwrap();
        assert_eq!(config.project.name, "acme");
        assert_eq!(loader.resolved_contexts().len(), 2);
        assert!(loader.source().unwrap().ends_with("project.yaml"));
    }

    #[test]
    fn test_accepts_yml_extension() {
        let (_temp, paths) = project_with("project.yml", CONFIG);
        let loader = ConfigLoader::new(paths);

        assert!(loader.has_config());
    }

    #[test]
    fn test_malformed_yaml_recorded_not_propagated() {
        let (_temp, paths) = project_with("project.yaml", "project: [unclosed");
        let loader = ConfigLoader::new(paths);

        assert!(loader.config().is_none());
        assert!(loader.load_error().is_some());
        assert!(loader.resolved_contexts().is_empty());
    }

    #[test]
    fn test_duplicate_contexts_means_no_config() {
        let yaml = "project:\n  name: x\ncontexts:\n  - {name: a, path: a}\n  - {name: a, path: b}\n";
        let (_temp, paths) = project_with("project.yaml", yaml);
        let loader = ConfigLoader::new(paths);

        assert!(loader.config().is_none());
        assert!(loader.load_error().unwrap().contains("Duplicate context name"));
    }

    #[test]
    fn test_reload_picks_up_changes() {
        let (temp, paths) = project_with("project.yaml", CONFIG);
        let loader = ConfigLoader::new(paths);
        assert_eq!(loader.config().unwrap().project.name, "acme");

        let updated = CONFIG.replace("name: acme", "name: renamed");
        fs::write(temp.path().join(".simone/project.yaml"), updated).unwrap();

        // Snapshot is stable until an explicit reload
        assert_eq!(loader.config().unwrap().project.name, "acme");
        loader.reload();
        assert_eq!(loader.config().unwrap().project.name, "renamed");
    }

    #[test]
    fn test_resolved_contexts_carry_github() {
        let (_temp, paths) = project_with("project.yaml", CONFIG);
        let loader = ConfigLoader::new(paths);

        let contexts = loader.resolved_contexts();
        assert_eq!(contexts[0].resolved_github.as_ref().unwrap().repository, "acme/web");
        assert_eq!(contexts[1].resolved_github.as_ref().unwrap().repository, "acme/acme");
    }

    #[test]
    fn test_non_boolean_enabled_still_loads() {
        let yaml = CONFIG.replace(
            "    lint:\n      enabled: true\n",
            "    lint:\n      enabled: true\n    fmt:\n      enabled: \"yes\"\n    check: eslint\n",
        );
        assert!(yaml.contains("enabled: \"yes\""));
        let (_temp, paths) = project_with("project.yaml", &yaml);
        let loader = ConfigLoader::new(paths);

        assert!(loader.has_config(), "load error: {:?}", loader.load_error());
        assert!(loader.load_error().is_none());
        let tooling = &loader.resolved_contexts()[0].resolved_tooling;
        assert!(tooling["lint"].is_enabled());
        assert!(!tooling["fmt"].is_enabled());
    }
}
