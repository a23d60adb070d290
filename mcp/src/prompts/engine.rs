//! Template engine with a compile cache
//!
//! Every distinct template source is registered once in a shared Handlebars
//! registry under a generated name. Clearing the cache drops all of those
//! registrations together and reloads the partials, which is what the hot
//! reload watcher relies on.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::embedded::BUILTIN_PARTIALS;
use super::error::PromptError;
use super::helpers::FeatureHelper;

/// Handle to a registered template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTemplate {
    name: String,
    source: String,
}

impl CompiledTemplate {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Owns the Handlebars registry, the compile cache and the partials
pub struct TemplateEngine {
    registry: RwLock<Handlebars<'static>>,
    /// source text -> registered name
    cache: Mutex<HashMap<String, String>>,
    next_id: AtomicU64,
    partials_dir: Option<PathBuf>,
}

impl TemplateEngine {
    /// Create an engine loading partial overrides from `partials_dir`
    pub fn new(partials_dir: Option<PathBuf>, feature: Option<FeatureHelper>) -> Self {
        debug!(?partials_dir, "TemplateEngine::new: called");
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        if let Some(feature) = feature {
            hbs.register_helper("feature", Box::new(feature));
        }
        register_partials(&mut hbs, partials_dir.as_deref());

        Self {
            registry: RwLock::new(hbs),
            cache: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            partials_dir,
        }
    }

    /// Engine with built-in partials only and no `feature` helper
    pub fn standalone() -> Self {
        Self::new(None, None)
    }

    /// Compile `source`, reusing the registration for identical text
    pub fn compile(&self, source: &str) -> Result<CompiledTemplate, PromptError> {
        let mut cache = self.lock_cache();
        if let Some(name) = cache.get(source) {
            return Ok(CompiledTemplate {
                name: name.clone(),
                source: source.to_string(),
            });
        }

        let name = format!("__compiled_{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        self.write_registry().register_template_string(&name, source)?;
        debug!(%name, "TemplateEngine::compile: registered new template");
        cache.insert(source.to_string(), name.clone());

        Ok(CompiledTemplate {
            name,
            source: source.to_string(),
        })
    }

    /// Render a compiled template, recompiling it if the cache was cleared since
    pub fn render<T: Serialize>(&self, template: &CompiledTemplate, data: &T) -> Result<String, PromptError> {
        {
            let registry = self.read_registry();
            if registry.has_template(&template.name) {
                return Ok(registry.render(&template.name, data)?);
            }
        }

        debug!(name = %template.name, "TemplateEngine::render: stale handle, recompiling");
        let fresh = self.compile(&template.source)?;
        Ok(self.read_registry().render(&fresh.name, data)?)
    }

    /// Compile and render in one step
    pub fn render_source<T: Serialize>(&self, source: &str, data: &T) -> Result<String, PromptError> {
        let compiled = self.compile(source)?;
        self.render(&compiled, data)
    }

    /// Drop every compiled template and reload the partials
    ///
    /// Partials removed from disk disappear as well.
    pub fn clear_cache(&self) {
        let mut cache = self.lock_cache();
        let mut registry = self.write_registry();

        let dropped = cache.len();
        registry.clear_templates();
        cache.clear();

        register_partials(&mut registry, self.partials_dir.as_deref());
        info!(dropped, "Template cache cleared");
    }

    /// Number of cached templates
    pub fn cached(&self) -> usize {
        self.lock_cache().len()
    }

    pub fn has_partial(&self, name: &str) -> bool {
        self.read_registry().has_template(name)
    }

    fn lock_cache(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_registry(&self) -> RwLockReadGuard<'_, Handlebars<'static>> {
        self.registry.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_registry(&self) -> RwLockWriteGuard<'_, Handlebars<'static>> {
        self.registry.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Register built-in partials, then `*.hbs` overrides from `dir`
fn register_partials(hbs: &mut Handlebars<'static>, dir: Option<&Path>) {
    for (name, source) in BUILTIN_PARTIALS {
        if let Err(e) = hbs.register_partial(name, *source) {
            warn!(%name, error = %e, "Failed to register built-in partial");
        }
    }

    let Some(dir) = dir else {
        return;
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(?dir, error = %e, "register_partials: no partials directory");
            return;
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "hbs"))
        .collect();
    paths.sort();

    for path in paths {
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match fs::read_to_string(&path) {
            Ok(source) => {
                if let Err(e) = hbs.register_partial(name, source) {
                    warn!(?path, error = %e, "Invalid partial, skipping");
                } else {
                    debug!(%name, "register_partials: registered override");
                }
            }
            Err(e) => warn!(?path, error = %e, "Failed to read partial"),
        }
    }
}
