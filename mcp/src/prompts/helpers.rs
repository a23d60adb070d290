//! The `feature` Handlebars helper
//!
//! `{{feature "tooling.lint"}}` collects every resolved context whose
//! `tooling.lint` entry is enabled and renders the `tooling-lint` partial
//! once with `{ results: [{context, feature}, ...] }`. Anything that keeps
//! it from producing output (bad argument, nothing enabled, no partial,
//! a failing partial) renders nothing.

use std::sync::Arc;

use handlebars::{Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext};
use serde_json::{Value, json};
use tracing::debug;

use crate::errlog::ErrorLog;
use crate::project::{ConfigLoader, ResolvedContext};

/// A dotted path into a resolved context, e.g. `tooling.lint`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeaturePath {
    segments: Vec<String>,
}

impl FeaturePath {
    /// Parse a dotted path; empty paths or empty segments are rejected
    pub fn parse(path: &str) -> Option<Self> {
        if path.is_empty() {
            return None;
        }
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        Some(Self { segments })
    }

    /// Partial rendered for this path: dots become dashes
    pub fn partial_name(&self) -> String {
        self.segments.join("-")
    }

    /// Find the value at this path in `context`
    ///
    /// `tooling` and `methodology` read the resolved (shared-merged) views;
    /// every other root reads the context as written.
    pub fn lookup(&self, context: &ResolvedContext) -> Option<Value> {
        let (root, rest) = self.segments.split_first()?;
        match root.as_str() {
            "tooling" => match rest.split_first() {
                None => serde_json::to_value(&context.resolved_tooling).ok(),
                Some((tool, rest)) => {
                    let feature = context.resolved_tooling.get(tool)?;
                    let value = serde_json::to_value(feature).ok()?;
                    walk(&value, rest).cloned()
                }
            },
            "methodology" => {
                let value = serde_json::to_value(&context.resolved_methodology).ok()?;
                walk(&value, rest).cloned()
            }
            _ => {
                let value = serde_json::to_value(&context.context).ok()?;
                walk(&value, &self.segments).cloned()
            }
        }
    }
}

impl std::fmt::Display for FeaturePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Generic walker over an open JSON structure
fn walk<'a>(value: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments.iter().try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Only an object whose `enabled` is exactly `true` counts
fn is_enabled(value: &Value) -> bool {
    value.get("enabled") == Some(&Value::Bool(true))
}

/// Handlebars helper backed by the project's resolved contexts
#[derive(Clone)]
pub struct FeatureHelper {
    config: Arc<ConfigLoader>,
    errlog: ErrorLog,
}

impl FeatureHelper {
    pub fn new(config: Arc<ConfigLoader>, errlog: ErrorLog) -> Self {
        Self { config, errlog }
    }

    /// `{context, feature}` pairs for every context where `path` is enabled
    pub fn collect(&self, path: &FeaturePath) -> Vec<Value> {
        self.config
            .resolved_contexts()
            .into_iter()
            .filter_map(|context| {
                let feature = path.lookup(&context)?;
                if !is_enabled(&feature) {
                    return None;
                }
                let context = serde_json::to_value(&context).ok()?;
                Some(json!({ "context": context, "feature": feature }))
            })
            .collect()
    }
}

impl HelperDef for FeatureHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let Some(path) = h
            .param(0)
            .and_then(|p| p.value().as_str())
            .and_then(FeaturePath::parse)
        else {
            return Ok(());
        };

        let results = self.collect(&path);
        if results.is_empty() {
            debug!(%path, "FeatureHelper: no context enables feature");
            return Ok(());
        }

        let partial = path.partial_name();
        if !r.has_template(&partial) {
            debug!(%partial, "FeatureHelper: no partial for feature");
            return Ok(());
        }

        match r.render(&partial, &json!({ "results": results })) {
            Ok(text) => out.write(&text)?,
            Err(e) => self.errlog.log(format!(
                "Error rendering partial '{}' for feature '{}': {}",
                partial, path, e
            )),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectPaths;
    use crate::prompts::TemplateEngine;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    const CONFIG: &str = r#"
project:
  name: acme
contexts:
  - name: web
    path: apps/web
    tooling:
      lint:
        enabled: true
        command: pnpm lint
    stack:
      database:
        enabled: true
        type: postgres
    flags:
      - enabled: true
  - name: api
    path: services/api
    tooling:
      lint:
        enabled: false
        command: cargo clippy
    flags:
      - enabled: "yes"
shared:
  tooling:
    test:
      enabled: true
      command: make test
  methodology:
    development: tdd
"#;

    struct Fixture {
        _temp: TempDir,
        engine: TemplateEngine,
        errlog_path: std::path::PathBuf,
    }

    fn fixture(partials: &[(&str, &str)]) -> Fixture {
        fixture_with(CONFIG, partials)
    }

    fn fixture_with(config: &str, partials: &[(&str, &str)]) -> Fixture {
        let temp = tempdir().unwrap();
        let simone = temp.path().join(".simone");
        let partials_dir = simone.join("partials");
        fs::create_dir_all(&partials_dir).unwrap();
        fs::write(simone.join("project.yaml"), config).unwrap();
        for (name, source) in partials {
            fs::write(partials_dir.join(format!("{}.hbs", name)), source).unwrap();
        }

        let paths = ProjectPaths::new(temp.path());
        let errlog_path = paths.error_log_file();
        let config = Arc::new(ConfigLoader::new(paths));
        let helper = FeatureHelper::new(config, ErrorLog::new(&errlog_path));
        let engine = TemplateEngine::new(Some(partials_dir), Some(helper));

        Fixture {
            _temp: temp,
            engine,
            errlog_path,
        }
    }

    fn render(fixture: &Fixture, source: &str) -> String {
        fixture.engine.render_source(source, &json!({})).unwrap()
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(FeaturePath::parse("").is_none());
        assert!(FeaturePath::parse("tooling.").is_none());
        assert!(FeaturePath::parse(".lint").is_none());
        assert_eq!(FeaturePath::parse("tooling.lint").unwrap().partial_name(), "tooling-lint");
    }

    #[test]
    fn test_only_enabled_context_contributes() {
        let f = fixture(&[("tooling-lint", "{{#each results}}[{{context.name}}:{{feature.command}}]{{/each}}")]);
        assert_eq!(render(&f, r#"{{feature "tooling.lint"}}"#), "[web:pnpm lint]");
    }

    #[test]
    fn test_string_enabled_does_not_hide_other_contexts() {
        let config = r#"
project:
  name: acme
contexts:
  - name: web
    path: apps/web
    tooling:
      lint:
        enabled: "yes"
        command: pnpm lint
      format: prettier
  - name: api
    path: services/api
    tooling:
      lint:
        enabled: true
        command: cargo clippy
"#;
        let f = fixture_with(config, &[("tooling-lint", "{{#each results}}[{{context.name}}:{{feature.command}}]{{/each}}")]);

        assert_eq!(render(&f, r#"{{feature "tooling.lint"}}"#), "[api:cargo clippy]");
        assert_eq!(render(&f, r#"{{feature "tooling.format"}}"#), "");
    }

    #[test]
    fn test_shared_tooling_reaches_every_context() {
        let f = fixture(&[("tooling-test", "{{#each results}}[{{context.name}}]{{/each}}")]);
        assert_eq!(render(&f, r#"{{feature "tooling.test"}}"#), "[web][api]");
    }

    #[test]
    fn test_raw_context_paths() {
        let f = fixture(&[("stack-database", "{{#each results}}{{feature.type}}{{/each}}")]);
        assert_eq!(render(&f, r#"{{feature "stack.database"}}"#), "postgres");
    }

    #[test]
    fn test_array_index_segment() {
        // api's `enabled: "yes"` is not boolean true
        let f = fixture(&[("flags-0", "{{#each results}}{{context.name}}{{/each}}")]);
        assert_eq!(render(&f, r#"{{feature "flags.0"}}"#), "web");
    }

    #[test]
    fn test_missing_partial_renders_empty() {
        let f = fixture(&[]);
        assert_eq!(render(&f, r#"[{{feature "stack.database.nope"}}]"#), "[]");
        // Enabled in one context but no `flags-0` partial
        assert_eq!(render(&f, r#"[{{feature "flags.0"}}]"#), "[]");
    }

    #[test]
    fn test_invalid_argument_renders_empty() {
        let f = fixture(&[]);
        assert_eq!(render(&f, r#"[{{feature 42}}]"#), "[]");
        assert_eq!(render(&f, r#"[{{feature ""}}]"#), "[]");
        assert_eq!(render(&f, "[{{feature}}]"), "[]");
    }

    #[test]
    fn test_disabled_everywhere_renders_empty() {
        let f = fixture(&[("tooling-format", "never")]);
        assert_eq!(render(&f, r#"[{{feature "tooling.format"}}]"#), "[]");
    }

    #[test]
    fn test_failing_partial_is_logged_and_empty() {
        let f = fixture(&[("tooling-lint", "{{#each results}}{{> does-not-exist}}{{/each}}")]);
        assert_eq!(render(&f, r#"[{{feature "tooling.lint"}}]"#), "[]");

        let log = fs::read_to_string(&f.errlog_path).unwrap();
        assert!(log.contains("tooling-lint"));
    }

    #[test]
    fn test_methodology_is_not_a_feature() {
        let f = fixture(&[("methodology-development", "x")]);
        // A plain string leaf has no `enabled`
        assert_eq!(render(&f, r#"[{{feature "methodology.development"}}]"#), "[]");
    }
}
