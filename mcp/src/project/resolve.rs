//! Shared/context overlay

use serde::Serialize;
use tracing::debug;

use super::types::{GitHubConfig, MethodologyConfig, ProjectConfig, ProjectContext, ToolingConfig};

/// A context with the shared settings folded in
///
/// Serializes as the context's own fields plus `resolvedTooling`,
/// `resolvedMethodology` and, when any GitHub settings apply, `resolvedGithub`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedContext {
    #[serde(flatten)]
    pub context: ProjectContext,

    /// Shared tools overlaid by the context's tools, per tool name
    #[serde(rename = "resolvedTooling")]
    pub resolved_tooling: ToolingConfig,

    /// Shared methodology overlaid by the context's methodology, per key
    #[serde(rename = "resolvedMethodology")]
    pub resolved_methodology: MethodologyConfig,

    /// The context's own `github`, else the project's
    #[serde(rename = "resolvedGithub", skip_serializing_if = "Option::is_none")]
    pub resolved_github: Option<GitHubConfig>,
}

impl ResolvedContext {
    pub fn name(&self) -> &str {
        &self.context.name
    }
}

/// Resolve every context of `config`, in declaration order
///
/// Tooling merges by tool name: a context entry replaces the shared entry of
/// the same name wholesale. Methodology merges key by key. A context's `github`
/// replaces the project's wholesale.
pub fn resolve_contexts(config: &ProjectConfig) -> Vec<ResolvedContext> {
    debug!(contexts = config.contexts.len(), "resolve_contexts: called");

    let shared_tooling = config.shared.as_ref().and_then(|s| s.tooling.as_ref());
    let shared_methodology = config.shared.as_ref().and_then(|s| s.methodology.as_ref());

    config
        .contexts
        .iter()
        .map(|context| {
            let mut resolved_tooling = shared_tooling.cloned().unwrap_or_default();
            if let Some(tooling) = &context.tooling {
                for (name, feature) in tooling {
                    resolved_tooling.insert(name.clone(), feature.clone());
                }
            }

            let base = shared_methodology.cloned().unwrap_or_default();
            let resolved_methodology = match &context.methodology {
                Some(own) => base.overlay(own),
                None => base,
            };

            let resolved_github = context.github.clone().or_else(|| config.github.clone());

            ResolvedContext {
                context: context.clone(),
                resolved_tooling,
                resolved_methodology,
                resolved_github,
            }
        })
        .collect()
}
