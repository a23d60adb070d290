//! Project configuration (`.simone/project.yaml`)
//!
//! A project is one or more *contexts* (buildable units). Settings under
//! `shared` apply to every context unless the context sets the same key
//! itself; [`resolve`] produces those merged per-context views without
//! touching the stored configuration.

mod error;
mod loader;
mod resolve;
mod types;

pub use error::ProjectConfigError;
pub use loader::ConfigLoader;
pub use resolve::{ResolvedContext, resolve_contexts};
pub use types::{
    DatabaseConfig, FeatureConfig, FeaturesConfig, FrameworkConfig, GitHubConfig, GitHubTool, GitWorktreeConfig,
    MethodologyConfig, PrReviewWaitConfig, ProjectConfig, ProjectContext, ProjectKind, ProjectMetadata, SharedConfig,
    StackConfig, StylingConfig, ToolingConfig,
};
