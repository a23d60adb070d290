//! ActivityLogger - append-only JSONL activity store

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use eyre::{Context, Result};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::classify::detect_activity_type;
use super::types::{ActivityInput, ActivityLogResult, ActivityRecord, MAX_TAGS};

/// Writes activity records to `.simone/logs/activity.jsonl`
#[derive(Debug, Clone)]
pub struct ActivityLogger {
    path: PathBuf,
}

impl ActivityLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        debug!(?path, "ActivityLogger::new: called");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record an activity; failures come back in the result, never as a panic
    pub fn log_activity(&self, input: ActivityInput) -> ActivityLogResult {
        let record = Self::record_from(input);
        match self.append(&record) {
            Ok(()) => {
                info!(id = %record.id, activity_type = %record.activity_type, "Activity logged");
                ActivityLogResult::logged(record.id)
            }
            Err(e) => {
                warn!(error = ?e, "Failed to log activity");
                ActivityLogResult::failed(format!("{:#}", e))
            }
        }
    }

    /// Build the stored record: new id, timestamp, derived type, trimmed tags
    pub fn record_from(input: ActivityInput) -> ActivityRecord {
        let mut tags = input.tags;
        tags.truncate(MAX_TAGS);

        ActivityRecord {
            id: Uuid::now_v7().to_string(),
            timestamp: Utc::now(),
            activity_type: detect_activity_type(&input.activity),
            activity: input.activity,
            tool_name: input.tool_name,
            success: input.success,
            error: input.error,
            tags,
            context: input.context,
            files_affected: input.files_affected,
            issue_number: input.issue_number,
            link: input.link,
        }
    }

    fn append(&self, record: &ActivityRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context(format!("Failed to create {}", parent.display()))?;
        }

        let line = serde_json::to_string(record).context("Failed to serialize activity")?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .context(format!("Failed to open {}", self.path.display()))?;
        writeln!(file, "{}", line).context("Failed to write activity")?;
        Ok(())
    }

    /// The most recent `limit` records, oldest first; unparsable lines are skipped
    pub fn recent(&self, limit: usize) -> Result<Vec<ActivityRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&self.path).context(format!("Failed to open {}", self.path.display()))?;
        let mut records = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line.context("Failed to read activity log")?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ActivityRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(line = number + 1, error = %e, "Skipping unparsable activity record"),
            }
        }

        let skip = records.len().saturating_sub(limit);
        Ok(records.split_off(skip))
    }
}
