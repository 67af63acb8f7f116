//! Core shared types for the safe-output mediation layer.

#![warn(missing_docs, clippy::pedantic)]

mod action;
mod context;
mod error;
mod ids;
mod project;
mod request;

/// Closed set of action types an agent may propose.
pub use action::ActionType;
/// Ambient facts about the workflow run.
pub use context::{EntityKind, Repository, RunContext, TriggerTarget};
/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Identifiers for runs and individual requests.
pub use ids::{RequestId, RunId};
/// Parsed GitHub project board URLs.
pub use project::{ProjectOwnerKind, ProjectUrl};
/// Typed requests produced by the normalizer.
pub use request::{
    ActionPayload, AddCommentRequest, ClosePullRequestRequest, ContentType, CreateIssueRequest,
    CreatePullRequestRequest, LabelsRequest, ProjectStatus, ProjectStatusUpdateRequest,
    Provenance, ResolvedTarget, SafeOutputRequest, TargetSource, UpdateProjectRequest,
};
