//! Project-local error log
//!
//! Failures the agent never sees as protocol errors (partial render errors,
//! watcher problems, bootstrap failures) are appended to
//! `.simone/logs/mcp-server.error.log` so the user can inspect them later.
//! Each entry is `[<timestamp>] ERROR: <message>` followed by a blank line.
//!
//! Writing is best-effort: a failure to log is swallowed.

use std::fmt::Display;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use tracing::{debug, error};

/// Append-only error log, constructed once and shared by the components that need it
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: Option<PathBuf>,
}

impl ErrorLog {
    /// Create an error log writing to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: Some(path.into()) }
    }

    /// An error log that only forwards to tracing
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record an error
    pub fn log(&self, message: impl Display) {
        let message = message.to_string();
        error!(%message, "Recorded error");

        let Some(path) = &self.path else {
            return;
        };

        if let Err(e) = append_entry(path, &message) {
            debug!(?path, error = %e, "ErrorLog::log: failed to write entry");
        }
    }

    /// Record an error with its full cause chain
    pub fn log_report(&self, report: &eyre::Report) {
        self.log(format!("{:?}", report));
    }
}

fn append_entry(path: &Path, message: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    write!(file, "[{}] ERROR: {}\n\n", timestamp, message)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_log_creates_directory_and_appends() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(".simone").join("logs").join("mcp-server.error.log");
        let log = ErrorLog::new(&path);

        log.log("first failure");
        log.log("second failure");

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("ERROR: first failure"));
        assert!(content.contains("ERROR: second failure"));
        assert_eq!(content.matches("] ERROR: ").count(), 2);
        assert!(content.starts_with('['));
        assert!(content.ends_with("\n\n"));
    }

    #[test]
    fn test_log_report_includes_context() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("error.log");
        let log = ErrorLog::new(&path);

        let report = eyre::eyre!("disk full").wrap_err("Failed to write activity");
        log.log_report(&report);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Failed to write activity"));
        assert!(content.contains("disk full"));
    }

    #[test]
    fn test_unwritable_path_does_not_panic() {
        let temp = tempdir().unwrap();
        // A file where a directory is expected
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let log = ErrorLog::new(blocker.join("logs").join("error.log"));

        log.log("nowhere to go");
    }

    #[test]
    fn test_disabled_log_writes_nothing() {
        let log = ErrorLog::disabled();
        assert!(log.path().is_none());
        log.log("ignored");
    }
}
