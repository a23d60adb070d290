//! Activity type detection

/// Keyword table, checked in order; the first type with a matching keyword wins
const ACTIVITY_TYPES: &[(&str, &[&str])] = &[
    ("create", &["create", "add", "new", "generate", "initialize"]),
    ("update", &["update", "modify", "change", "edit"]),
    ("fix", &["fix", "repair", "resolve", "solve", "patch"]),
    ("review", &["review", "check", "examine", "inspect"]),
    ("research", &["research", "investigate", "explore", "search"]),
    ("document", &["document", "write", "describe", "explain"]),
    ("test", &["test", "verify", "validate", "check"]),
    ("deploy", &["deploy", "release", "publish", "launch"]),
    ("configure", &["configure", "setup", "install", "config"]),
    ("refactor", &["refactor", "reorganize", "restructure", "clean"]),
    ("delete", &["delete", "remove", "clean", "drop"]),
    ("analyze", &["analyze", "assess", "evaluate", "measure"]),
    ("plan", &["plan", "design", "architect", "outline"]),
    ("debug", &["debug", "troubleshoot", "diagnose", "trace"]),
];

/// Fallback when nothing else fits
pub const OTHER: &str = "other";

/// Derive an activity type from a free-text description
///
/// Keywords match as case-insensitive substrings, so "prefix" counts as
/// `fix`. Without a match the first space-delimited word is used when it is
/// longer than two characters.
pub fn detect_activity_type(activity: &str) -> String {
    let lower = activity.to_lowercase();

    for (kind, keywords) in ACTIVITY_TYPES {
        if keywords.iter().any(|k| lower.contains(k)) {
            return kind.to_string();
        }
    }

    match lower.split(' ').next() {
        Some(word) if word.chars().count() > 2 => word.to_string(),
        _ => OTHER.to_string(),
    }
}

/// Every type the keyword table can produce
pub fn known_types() -> impl Iterator<Item = &'static str> {
    ACTIVITY_TYPES.iter().map(|(kind, _)| *kind)
}
