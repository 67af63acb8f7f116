//! Policy checks applied to every safe output request before execution.
//!
//! The checks run in a fixed order: structural validation, content filters,
//! admission control, then scope resolution. Each stage rejects with a
//! [`Rejection`] whose message is written for the calling agent, so it can
//! correct itself on a later call.

#![warn(missing_docs, clippy::pedantic)]

pub mod admission;
pub mod filters;
mod rejection;
pub mod sanitize;
pub mod scope;
pub mod structural;

pub use admission::{AdmissionController, AdmissionPermit};
pub use rejection::{PolicyResult, Rejection, RejectionKind};
pub use scope::{ProjectScope, ScopeSource, resolve_project_scope};
