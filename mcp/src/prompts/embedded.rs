//! Built-in prompts and partials
//!
//! Compiled into the binary; project files under `.simone/` override them by name.

/// Built-in prompt definitions, `(name, yaml)`
pub const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    ("initialize", include_str!("builtin/initialize.yaml")),
    ("work_issue", include_str!("builtin/work_issue.yaml")),
    ("commit", include_str!("builtin/commit.yaml")),
    ("review_pr", include_str!("builtin/review_pr.yaml")),
    ("error", include_str!("builtin/error.yaml")),
];

/// Built-in feature partials, `(name, handlebars)`
pub const BUILTIN_PARTIALS: &[(&str, &str)] = &[
    ("tooling-lint", include_str!("partials/tooling-lint.hbs")),
    ("tooling-test", include_str!("partials/tooling-test.hbs")),
    ("tooling-format", include_str!("partials/tooling-format.hbs")),
    ("tooling-commit", include_str!("partials/tooling-commit.hbs")),
    ("stack-database", include_str!("partials/stack-database.hbs")),
];

/// Get a built-in prompt by name
pub fn get_prompt(name: &str) -> Option<&'static str> {
    BUILTIN_PROMPTS.iter().find(|(n, _)| *n == name).map(|(_, src)| *src)
}
