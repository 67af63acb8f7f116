//! Contract for the external GitHub client.
//!
//! The mediation layer never talks to GitHub itself. A [`GitHubClient`] is
//! injected when the mediator is assembled and is expected to be already
//! authenticated with the credential the workflow grants to safe outputs.

use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDate;
use safeout_config::ProjectView;
use safeout_primitives::{ProjectStatus, ProjectUrl, Repository};
use serde::Serialize;

use crate::error::ClientResult;

/// Open or closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    /// Open.
    Open,
    /// Closed or merged.
    Closed,
}

/// Issue or pull request created by a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedItem {
    /// Item number.
    pub number: u64,
    /// Browser URL.
    pub url: String,
    /// GraphQL node id, used for sub-issue links.
    pub node_id: String,
}

/// Snapshot of a pull request used by content filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSnapshot {
    /// Pull request number.
    pub number: u64,
    /// Current state.
    pub state: ItemState,
    /// Current title.
    pub title: String,
    /// Current label names.
    pub labels: Vec<String>,
}

/// Comment created by a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRef {
    /// Numeric comment id.
    pub id: u64,
    /// Browser URL.
    pub url: String,
}

/// Existing comment on an issue or pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentSummary {
    /// Numeric comment id.
    pub id: u64,
    /// GraphQL node id, used for minimizing.
    pub node_id: String,
    /// Raw markdown body.
    pub body: String,
}

/// Existing open issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueSummary {
    /// Issue number.
    pub number: u64,
    /// Title.
    pub title: String,
    /// GraphQL node id.
    pub node_id: String,
}

/// Issue to create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    /// Title.
    pub title: String,
    /// Markdown body.
    pub body: String,
    /// Labels to apply.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// Pull request to open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewPullRequest {
    /// Title.
    pub title: String,
    /// Markdown body.
    pub body: String,
    /// Branch holding the changes.
    pub head: String,
    /// Branch to merge into.
    pub base: String,
    /// Open as a draft.
    pub draft: bool,
}

/// Content added to a project board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "content_type", rename_all = "snake_case")]
pub enum ProjectContent {
    /// Draft item that lives only on the board.
    DraftIssue {
        /// Draft title.
        title: String,
        /// Draft body.
        #[serde(skip_serializing_if = "Option::is_none")]
        body: Option<String>,
    },
    /// Existing issue in the run's repository.
    Issue {
        /// Issue number.
        number: u64,
    },
    /// Existing pull request in the run's repository.
    PullRequest {
        /// Pull request number.
        number: u64,
    },
}

/// Status update to post on a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewStatusUpdate {
    /// Health keyword.
    pub status: ProjectStatus,
    /// Markdown body.
    pub body: String,
    /// Optional start date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Optional target date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
}

/// Operations the mediation layer may perform on GitHub.
///
/// Implementations map each call to one REST or GraphQL request and return
/// API errors verbatim. Mutating calls are never retried by the caller.
#[async_trait]
pub trait GitHubClient: Send + Sync + fmt::Debug {
    /// Creates an issue.
    async fn create_issue(&self, repo: &Repository, issue: &NewIssue) -> ClientResult<CreatedItem>;

    /// Closes an issue.
    async fn close_issue(&self, repo: &Repository, number: u64) -> ClientResult<()>;

    /// Lists open issues whose body contains `marker`.
    async fn find_open_issues(
        &self,
        repo: &Repository,
        marker: &str,
    ) -> ClientResult<Vec<IssueSummary>>;

    /// Links `child` as a sub-issue of `parent`.
    async fn add_sub_issue(&self, repo: &Repository, parent: u64, child: u64) -> ClientResult<()>;

    /// Posts a comment on an issue or pull request.
    async fn add_comment(&self, repo: &Repository, number: u64, body: &str)
    -> ClientResult<CommentRef>;

    /// Lists comments on an issue or pull request.
    async fn list_comments(&self, repo: &Repository, number: u64)
    -> ClientResult<Vec<CommentSummary>>;

    /// Collapses a comment as outdated.
    async fn minimize_comment(&self, node_id: &str) -> ClientResult<()>;

    /// Adds labels, returning the item's resulting label set.
    async fn add_labels(
        &self,
        repo: &Repository,
        number: u64,
        labels: &[String],
    ) -> ClientResult<Vec<String>>;

    /// Removes one label.
    async fn remove_label(&self, repo: &Repository, number: u64, label: &str) -> ClientResult<()>;

    /// Reads a pull request.
    async fn get_pull_request(
        &self,
        repo: &Repository,
        number: u64,
    ) -> ClientResult<PullRequestSnapshot>;

    /// Closes a pull request without merging.
    async fn close_pull_request(&self, repo: &Repository, number: u64) -> ClientResult<()>;

    /// Opens a pull request from an already pushed branch.
    async fn create_pull_request(
        &self,
        repo: &Repository,
        pull_request: &NewPullRequest,
    ) -> ClientResult<CreatedItem>;

    /// Adds content to a project board, returning the project item id.
    ///
    /// Adding content that is already on the board returns the existing item.
    async fn add_project_item(
        &self,
        project: &ProjectUrl,
        repo: &Repository,
        content: &ProjectContent,
    ) -> ClientResult<String>;

    /// Sets one custom field on a project item.
    async fn update_project_item_field(
        &self,
        project: &ProjectUrl,
        item_id: &str,
        field: &str,
        value: &str,
    ) -> ClientResult<()>;

    /// Creates a view unless one with the same name exists.
    async fn ensure_project_view(&self, project: &ProjectUrl, view: &ProjectView)
    -> ClientResult<()>;

    /// Posts a status update, returning its id.
    async fn create_project_status_update(
        &self,
        project: &ProjectUrl,
        update: &NewStatusUpdate,
    ) -> ClientResult<String>;
}
