//! Policy configuration for the safe-output mediation layer.
//!
//! The configuration document is produced by the workflow compiler and loaded
//! exactly once per run. After [`PolicyStore::from_config`] succeeds the store
//! is read-only and can be shared freely across concurrent tool calls.

#![warn(missing_docs, clippy::pedantic)]

mod environment;
mod error;
mod loader;
pub mod schema;
mod store;

pub use environment::{run_context_from_env, run_context_from_vars};
pub use error::{ConfigError, ConfigResult};
pub use loader::{CONFIG_ENV_VAR, load_from_env, load_from_path, load_from_str};
pub use schema::{
    AddCommentConfig, ClosePullRequestConfig, CreateIssueConfig, CreatePullRequestConfig, Expiry,
    LabelsConfig, MessageTemplates, ProjectStatusUpdateConfig, ProjectView, SafeOutputsConfig,
    Target, UpdateProjectConfig, ViewLayout,
};
pub use store::PolicyStore;
