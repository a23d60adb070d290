//! PromptHandler - turns a prompt name and arguments into messages

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::ProjectPaths;
use crate::errlog::ErrorLog;
use crate::project::{ConfigLoader, resolve_contexts};

use super::context::{TemplateContext, build_template_context};
use super::engine::TemplateEngine;
use super::error::{PromptError, error_envelope};
use super::helpers::FeatureHelper;
use super::loader::{ERROR_PROMPT, TemplateLoader};
use super::types::{PromptMessage, PromptTemplate};

/// Resolves, renders and wraps prompts
pub struct PromptHandler {
    paths: ProjectPaths,
    loader: TemplateLoader,
    engine: Arc<TemplateEngine>,
    config: Arc<ConfigLoader>,
}

impl PromptHandler {
    /// Wire a handler for the project at `paths`
    pub fn new(paths: ProjectPaths, config: Arc<ConfigLoader>, errlog: ErrorLog) -> Self {
        debug!(root = %paths.root().display(), "PromptHandler::new: called");
        let feature = FeatureHelper::new(config.clone(), errlog);
        let engine = Arc::new(TemplateEngine::new(Some(paths.partials_dir()), Some(feature)));
        let loader = TemplateLoader::new(paths.prompts_dir());

        Self {
            paths,
            loader,
            engine,
            config,
        }
    }

    /// Shared engine, for the hot-reload watcher
    pub fn engine(&self) -> Arc<TemplateEngine> {
        self.engine.clone()
    }

    pub fn config(&self) -> &Arc<ConfigLoader> {
        &self.config
    }

    pub fn list_available_prompts(&self) -> Vec<PromptTemplate> {
        self.loader.list_available_prompts()
    }

    /// A single prompt's metadata and source, project first
    pub fn load_prompt(&self, name: &str) -> Option<PromptTemplate> {
        self.loader.load_prompt(name)
    }

    /// Render `name` with `args`; always exactly one user message
    ///
    /// Failures are reported in-band as an error envelope.
    pub fn get_prompt_messages(&self, name: &str, args: &Map<String, Value>) -> Vec<PromptMessage> {
        info!(%name, "Rendering prompt");
        let text = match self.render_prompt(name, args) {
            Ok(text) => text,
            Err(e) => {
                warn!(%name, error = %e, "Prompt failed");
                self.render_error(&e)
            }
        };
        vec![PromptMessage::user_text(text)]
    }

    /// Render `name` with `args`, surfacing failures as errors
    pub fn render_prompt(&self, name: &str, args: &Map<String, Value>) -> Result<String, PromptError> {
        let prompt = self
            .loader
            .load_prompt(name)
            .ok_or_else(|| PromptError::NotFound { name: name.to_string() })?;

        let mut context = self.build_context(args);

        for argument in &prompt.arguments {
            if context.contains(&argument.name) {
                continue;
            }
            if let Some(default) = argument.default.as_deref().filter(|d| !d.is_empty()) {
                let value = self.engine.render_source(default, &context)?;
                debug!(argument = %argument.name, "PromptHandler: applied default");
                context.insert(argument.name.clone(), value);
            }
        }

        let compiled = self.engine.compile(&prompt.template)?;
        self.engine.render(&compiled, &context)
    }

    /// Fixed facts, caller args and the project configuration
    fn build_context(&self, args: &Map<String, Value>) -> TemplateContext {
        let mut context = build_template_context(&self.paths, args);

        if let Some(config) = self.config.config() {
            context.insert("project", to_json(&config.project));
            context.insert("contexts", to_json(&resolve_contexts(&config)));
            context.insert("shared", to_json(&config.shared));
            context.insert("github", to_json(&config.github));
            context.insert("features", to_json(&config.features));
        }

        context
    }

    /// Error text, through the `error` prompt when one exists
    fn render_error(&self, error: &PromptError) -> String {
        let fallback = error_envelope(error);
        let Some(prompt) = self.loader.load_prompt(ERROR_PROMPT) else {
            return fallback;
        };

        let mut context = self.build_context(&Map::new());
        context.insert("ERROR_MESSAGE", error.to_string());
        match self.engine.render_source(&prompt.template, &context) {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => fallback,
            Err(e) => {
                warn!(error = %e, "Error prompt failed to render");
                fallback
            }
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn handler_for(root: &std::path::Path) -> PromptHandler {
        let paths = ProjectPaths::new(root);
        let config = Arc::new(ConfigLoader::new(paths.clone()));
        PromptHandler::new(paths, config, ErrorLog::disabled())
    }

    fn project(prompts: &[(&str, &str)], config: Option<&str>) -> (TempDir, PromptHandler) {
        let temp = tempdir().unwrap();
        let simone = temp.path().join(".simone");
        let prompts_dir = simone.join("prompts");
        fs::create_dir_all(&prompts_dir).unwrap();
        for (file, content) in prompts {
            fs::write(prompts_dir.join(file), content).unwrap();
        }
        if let Some(config) = config {
            fs::write(simone.join("project.yaml"), config).unwrap();
        }
        let handler = handler_for(temp.path());
        (temp, handler)
    }

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("args must be an object"),
        }
    }

    fn text(messages: &[PromptMessage]) -> &str {
        assert_eq!(messages.len(), 1);
        messages[0].text()
    }

    #[test]
    fn test_unknown_prompt_envelope() {
        let (_temp, handler) = project(&[], None);
        let messages = handler.get_prompt_messages("does_not_exist", &Map::new());

        let text = text(&messages);
        assert!(text.starts_with("Tell the user an error happened"));
        assert!(text.contains("<error_message>Prompt 'does_not_exist' not found</error_message>"));
    }

    #[test]
    fn test_builtin_prompts_render_without_placeholders() {
        let (_temp, handler) = project(&[], None);
        for prompt in handler.list_available_prompts() {
            let messages = handler.get_prompt_messages(&prompt.name, &args(json!({"issue": "7", "pr": "9"})));
            let text = text(&messages);
            assert!(!text.trim().is_empty(), "{} rendered empty", prompt.name);
            assert!(!text.contains("{{"), "{} left a placeholder", prompt.name);
            assert!(!text.contains("<error_message>"), "{} failed: {}", prompt.name, text);
        }
    }

    #[test]
    fn test_default_argument_uses_context() {
        let (temp, handler) = project(
            &[(
                "greet.yaml",
                "arguments:\n  - name: who\n    default: \"team {{PROJECT_NAME}}\"\ntemplate: \"Hello {{who}}\"\n",
            )],
            None,
        );
        let name = temp.path().file_name().unwrap().to_string_lossy().into_owned();

        let messages = handler.get_prompt_messages("greet", &Map::new());
        assert_eq!(text(&messages), format!("Hello team {}", name));

        // Supplied argument wins over the default
        let messages = handler.get_prompt_messages("greet", &args(json!({"who": "Ada"})));
        assert_eq!(text(&messages), "Hello Ada");
    }

    #[test]
    fn test_defaults_follow_declaration_order() {
        let (_temp, handler) = project(
            &[(
                "chain.yaml",
                r#"
arguments:
  - name: early
    default: "[{{late}}]"
  - name: late
    default: "L"
  - name: after
    default: "<{{late}}>"
template: "{{early}} {{late}} {{after}}"
"#,
            )],
            None,
        );

        // A forward reference renders empty
        let messages = handler.get_prompt_messages("chain", &Map::new());
        assert_eq!(text(&messages), "[] L <L>");
    }

    #[test]
    fn test_render_error_envelope() {
        let (_temp, handler) = project(&[("bad.yaml", "template: \"{{#if x}}unclosed\"\n")], None);

        let messages = handler.get_prompt_messages("bad", &Map::new());
        let text = text(&messages);
        assert!(text.contains("<error_message>Template rendering error:"));
    }

    #[test]
    fn test_default_render_error_envelope() {
        let (_temp, handler) = project(
            &[(
                "bad_default.yaml",
                "arguments:\n  - name: x\n    default: \"{{#each}}\"\ntemplate: \"{{x}}\"\n",
            )],
            None,
        );

        let messages = handler.get_prompt_messages("bad_default", &Map::new());
        assert!(text(&messages).contains("Template rendering error:"));
    }

    #[test]
    fn test_project_error_prompt_used_for_failures() {
        let (_temp, handler) = project(&[("error.yaml", "template: \"OOPS: {{ERROR_MESSAGE}}\"\n")], None);

        let messages = handler.get_prompt_messages("nope", &Map::new());
        assert_eq!(text(&messages), "OOPS: Prompt 'nope' not found");
    }

    #[test]
    fn test_config_available_to_templates() {
        let config = r#"
project:
  name: acme
contexts:
  - name: web
    path: apps/web
github:
  repository: acme/acme
features:
  git_worktree:
    enabled: true
"#;
        let (_temp, handler) = project(
            &[(
                "show.yaml",
                "template: \"{{project.name}}|{{contexts.[0].name}}|{{github.repository}}|{{features.git_worktree.path}}\"\n",
            )],
            Some(config),
        );

        let messages = handler.get_prompt_messages("show", &Map::new());
        assert_eq!(text(&messages), "acme|web|acme/acme|.worktrees");
    }

    #[test]
    fn test_contexts_carry_resolved_github() {
        let config = r#"
project:
  name: acme
contexts:
  - name: web
    path: apps/web
    github:
      repository: acme/web
  - name: api
    path: services/api
github:
  repository: acme/acme
"#;
        let (_temp, handler) = project(
            &[(
                "repos.yaml",
                "template: \"{{#each contexts}}{{name}}={{resolvedGithub.repository}};{{/each}}\"\n",
            )],
            Some(config),
        );

        let messages = handler.get_prompt_messages("repos", &Map::new());
        assert_eq!(text(&messages), "web=acme/web;api=acme/acme;");
    }

    #[test]
    fn test_builtin_review_lists_context_repositories() {
        let config = r#"
project:
  name: acme
contexts:
  - name: web
    path: apps/web
    github:
      repository: acme/web
  - name: api
    path: services/api
github:
  repository: acme/acme
"#;
        let (_temp, handler) = project(&[], Some(config));

        let messages = handler.get_prompt_messages("review_pr", &args(json!({"pr": "17"})));
        let rendered = text(&messages);
        assert!(rendered.contains("- `web` (apps/web): `acme/web`"));
        assert!(rendered.contains("- `api` (services/api): `acme/acme`"));
    }

    #[test]
    fn test_feature_helper_in_prompt() {
        let config = r#"
project:
  name: acme
contexts:
  - name: web
    path: apps/web
    tooling:
      lint:
        enabled: true
        command: pnpm lint
  - name: api
    path: services/api
"#;
        let (_temp, handler) = project(&[("lint.yaml", "template: \"{{feature \\\"tooling.lint\\\"}}\"\n")], Some(config));

        let messages = handler.get_prompt_messages("lint", &Map::new());
        let text = text(&messages);
        assert!(text.contains("pnpm lint"));
        assert!(text.contains("`web`"));
        assert!(!text.contains("`api`"));
    }

    #[test]
    fn test_cache_clear_keeps_output() {
        let (_temp, handler) = project(&[("static.yaml", "template: \"{{PROJECT_NAME}} ok\"\n")], None);

        let before = handler.get_prompt_messages("static", &Map::new());
        handler.engine().clear_cache();
        let after = handler.get_prompt_messages("static", &Map::new());

        assert_eq!(before, after);
    }
}
