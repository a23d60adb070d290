//! Watcher configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the TemplateWatcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Whether template hot-reload runs at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// File extensions whose changes invalidate the template cache
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_extensions() -> Vec<String> {
    vec!["yaml".to_string(), "yml".to_string(), "hbs".to_string()]
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            extensions: default_extensions(),
        }
    }
}

impl WatcherConfig {
    /// Check whether a path has one of the watched extensions
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|w| w.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WatcherConfig::default();
        assert!(config.enabled);
        assert_eq!(config.extensions, vec!["yaml", "yml", "hbs"]);
    }

    #[test]
    fn test_matches_extension() {
        let config = WatcherConfig::default();
        assert!(config.matches(Path::new("/p/.simone/prompts/commit.yaml")));
        assert!(config.matches(Path::new("/p/.simone/partials/tooling-lint.HBS")));
        assert!(!config.matches(Path::new("/p/.simone/prompts/notes.md")));
        assert!(!config.matches(Path::new("/p/.simone/prompts/.commit.yaml.swp")));
        assert!(!config.matches(Path::new("/p/.simone/prompts/README")));
    }
}
