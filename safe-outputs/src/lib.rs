//! Safe outputs: a policy-enforcing mediation layer between AI agents and
//! GitHub writes.
//!
//! Agents never call GitHub directly. Each proposed write arrives as a JSON
//! tool call, is validated against the workflow's declared policy, counted
//! against a per-type ceiling, executed through an injected client, and
//! recorded in an append-only audit log.
//!
//! This crate bundles the workspace crates behind feature flags.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use safeout_primitives as primitives;

/// Policy configuration loading (enabled by `config` feature).
#[cfg(feature = "config")]
pub use safeout_config as config;

/// Validation, filters, admission, and scope (enabled by `policy` feature).
#[cfg(feature = "policy")]
pub use safeout_policy as policy;

/// Client contract and per-type handlers (enabled by `handlers` feature).
#[cfg(feature = "handlers")]
pub use safeout_handlers as handlers;

/// Audit log (enabled by `journal` feature).
#[cfg(feature = "journal")]
pub use safeout_journal as journal;

/// Normalizer and mediator (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use safeout_kernel as kernel;

/// Logging setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use safeout_telemetry as telemetry;

/// Types most embedders need.
#[cfg(feature = "kernel")]
pub mod prelude {
    pub use safeout_config::{PolicyStore, load_from_env, load_from_path, load_from_str};
    pub use safeout_handlers::{ExecutionResult, GitHubClient};
    pub use safeout_journal::{AuditLog, FileAuditLog, MemoryAuditLog};
    pub use safeout_kernel::{Mediator, MediatorError};
    pub use safeout_primitives::{ActionType, Repository, RunContext, RunId, TriggerTarget};
}
