//! Execution handlers for safe output requests.
//!
//! Each action type is served by an [`ActionHandler`] registered in a
//! [`HandlerRegistry`]. Handlers validate a request into a
//! [`ValidatedAction`], which later performs the primary effect through the
//! injected [`GitHubClient`] and reports an [`ExecutionResult`]. Secondary
//! effects never fail the request; their failures are recorded as warnings.

#![warn(missing_docs, clippy::pedantic)]

pub mod client;
mod comments;
mod error;
mod handler;
mod issues;
mod labels;
mod projects;
mod pull_requests;
pub mod registry;
pub mod render;
mod result;
mod timeout;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use client::GitHubClient;
pub use comments::AddCommentHandler;
pub use error::{ClientError, ClientResult, HandlerError, HandlerResult};
pub use handler::{ActionHandler, HandlerContext, ValidatedAction};
pub use issues::CreateIssueHandler;
pub use labels::{LabelOperation, LabelsHandler};
pub use projects::{ProjectStatusUpdateHandler, UpdateProjectHandler};
pub use pull_requests::{ClosePullRequestHandler, CreatePullRequestHandler, DEFAULT_BASE_BRANCH};
pub use registry::{HandlerRegistry, RegistryError, RegistryResult};
pub use result::ExecutionResult;
pub use timeout::{DEFAULT_CALL_TIMEOUT, TimeoutClient};
