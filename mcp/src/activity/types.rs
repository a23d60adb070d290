//! Activity records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of tags kept on a record
pub const MAX_TAGS: usize = 3;

/// What the agent reports through `log_activity`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityInput {
    pub activity: String,
    pub tool_name: String,

    #[serde(default = "default_success")]
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    #[serde(default)]
    pub files_affected: Vec<String>,

    /// Whole-number floats (`42.0`) are accepted
    #[serde(
        default,
        deserialize_with = "issue_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub issue_number: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

fn default_success() -> bool {
    true
}

fn issue_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Some(n) = number.as_u64() {
        return Ok(Some(n));
    }
    match number.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(Some(f as u64)),
        _ => Err(serde::de::Error::custom(format!(
            "invalid issue number {}, expected a non-negative whole number",
            number
        ))),
    }
}

/// One line of `activity.jsonl`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub activity: String,
    pub activity_type: String,
    pub tool_name: String,
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files_affected: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Outcome of logging an activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityLogResult {
    pub success: bool,

    #[serde(rename = "activityId", skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActivityLogResult {
    pub fn logged(id: impl Into<String>) -> Self {
        Self {
            success: true,
            activity_id: Some(id.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            activity_id: None,
            error: Some(error.into()),
        }
    }
}
