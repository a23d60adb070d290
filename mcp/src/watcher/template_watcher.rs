//! Template watcher implementation

use std::path::PathBuf;
use std::sync::Arc;

use eyre::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::config::WatcherConfig;
use crate::config::ProjectPaths;
use crate::errlog::ErrorLog;
use crate::prompts::TemplateEngine;
use crate::server::ServerNotification;

/// Watches template files and invalidates the template cache on change
pub struct TemplateWatcher {
    config: WatcherConfig,
    dirs: Vec<PathBuf>,
    engine: Arc<TemplateEngine>,
    notify_tx: mpsc::Sender<ServerNotification>,
    errlog: ErrorLog,
}

impl TemplateWatcher {
    /// Create a watcher for the prompt and partial directories of `paths`
    pub fn new(
        config: WatcherConfig,
        paths: &ProjectPaths,
        engine: Arc<TemplateEngine>,
        notify_tx: mpsc::Sender<ServerNotification>,
        errlog: ErrorLog,
    ) -> Self {
        Self {
            config,
            dirs: vec![paths.prompts_dir(), paths.partials_dir()],
            engine,
            notify_tx,
            errlog,
        }
    }

    /// Directories that exist right now
    pub fn watched_dirs(&self) -> Vec<PathBuf> {
        self.dirs.iter().filter(|d| d.is_dir()).cloned().collect()
    }

    /// A create, modify or remove of a file with a watched extension
    pub fn is_relevant(&self, event: &Event) -> bool {
        let kind_matches = matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        );
        kind_matches && event.paths.iter().any(|p| self.config.matches(p))
    }

    /// React to one file system event; returns whether the cache was cleared
    pub async fn handle_event(&self, event: &Event) -> bool {
        if !self.is_relevant(event) {
            return false;
        }

        debug!(paths = ?event.paths, kind = ?event.kind, "Template file changed");
        self.engine.clear_cache();

        if let Err(e) = self.notify_tx.send(ServerNotification::PromptsListChanged).await {
            self.errlog
                .log(format!("Failed to send prompt list change notification: {}", e));
        }
        true
    }

    /// Run the watcher loop
    ///
    /// Returns immediately when none of the directories exist; otherwise runs
    /// until the task is dropped.
    pub async fn run(self) -> Result<()> {
        let dirs = self.watched_dirs();
        if dirs.is_empty() {
            info!("No template directories to watch");
            return Ok(());
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.send(res);
        })
        .context("Failed to create file watcher")?;

        for dir in &dirs {
            watcher
                .watch(dir, RecursiveMode::Recursive)
                .context(format!("Failed to watch {}", dir.display()))?;
        }
        info!(?dirs, "TemplateWatcher started");

        while let Some(res) = rx.recv().await {
            match res {
                Ok(event) => {
                    self.handle_event(&event).await;
                }
                Err(e) => {
                    warn!(error = %e, "File watcher error");
                    self.errlog.log(format!("File watcher error: {}", e));
                }
            }
        }

        Ok(())
    }
}
