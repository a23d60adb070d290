//! Activity logging
//!
//! Agents report what they did through the `log_activity` tool. Each report
//! gets an id, a timestamp and a coarse type derived from its wording, and is
//! appended to the project's activity log.

mod classify;
mod logger;
mod types;

pub use classify::{OTHER, detect_activity_type, known_types};
pub use logger::ActivityLogger;
pub use types::{ActivityInput, ActivityLogResult, ActivityRecord, MAX_TAGS};
