//! Time-bounded client decorator.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use safeout_config::ProjectView;
use safeout_primitives::{ProjectUrl, Repository};
use tokio::time::timeout;
use tracing::warn;

use crate::client::{
    CommentRef, CommentSummary, CreatedItem, GitHubClient, IssueSummary, NewIssue,
    NewPullRequest, NewStatusUpdate, ProjectContent, PullRequestSnapshot,
};
use crate::error::{ClientError, ClientResult};

/// Bound applied when none is configured.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Wraps a client so every call fails with [`ClientError::Timeout`] once the
/// bound elapses. The abandoned call is not retried.
#[derive(Debug, Clone)]
pub struct TimeoutClient {
    inner: Arc<dyn GitHubClient>,
    timeout: Duration,
}

impl TimeoutClient {
    /// Wraps `inner` with the default bound.
    #[must_use]
    pub fn new(inner: Arc<dyn GitHubClient>) -> Self {
        Self {
            inner,
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Overrides the bound.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the configured bound.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = ClientResult<T>> + Send,
    ) -> ClientResult<T> {
        timeout(self.timeout, call).await.unwrap_or_else(|_| {
            warn!(operation, timeout_secs = self.timeout.as_secs(), "GitHub call timed out");
            Err(ClientError::Timeout {
                operation,
                elapsed: self.timeout,
            })
        })
    }
}

#[async_trait]
impl GitHubClient for TimeoutClient {
    async fn create_issue(&self, repo: &Repository, issue: &NewIssue) -> ClientResult<CreatedItem> {
        self.bounded("create_issue", self.inner.create_issue(repo, issue))
            .await
    }

    async fn close_issue(&self, repo: &Repository, number: u64) -> ClientResult<()> {
        self.bounded("close_issue", self.inner.close_issue(repo, number))
            .await
    }

    async fn find_open_issues(
        &self,
        repo: &Repository,
        marker: &str,
    ) -> ClientResult<Vec<IssueSummary>> {
        self.bounded("find_open_issues", self.inner.find_open_issues(repo, marker))
            .await
    }

    async fn add_sub_issue(&self, repo: &Repository, parent: u64, child: u64) -> ClientResult<()> {
        self.bounded("add_sub_issue", self.inner.add_sub_issue(repo, parent, child))
            .await
    }

    async fn add_comment(
        &self,
        repo: &Repository,
        number: u64,
        body: &str,
    ) -> ClientResult<CommentRef> {
        self.bounded("add_comment", self.inner.add_comment(repo, number, body))
            .await
    }

    async fn list_comments(
        &self,
        repo: &Repository,
        number: u64,
    ) -> ClientResult<Vec<CommentSummary>> {
        self.bounded("list_comments", self.inner.list_comments(repo, number))
            .await
    }

    async fn minimize_comment(&self, node_id: &str) -> ClientResult<()> {
        self.bounded("minimize_comment", self.inner.minimize_comment(node_id))
            .await
    }

    async fn add_labels(
        &self,
        repo: &Repository,
        number: u64,
        labels: &[String],
    ) -> ClientResult<Vec<String>> {
        self.bounded("add_labels", self.inner.add_labels(repo, number, labels))
            .await
    }

    async fn remove_label(&self, repo: &Repository, number: u64, label: &str) -> ClientResult<()> {
        self.bounded("remove_label", self.inner.remove_label(repo, number, label))
            .await
    }

    async fn get_pull_request(
        &self,
        repo: &Repository,
        number: u64,
    ) -> ClientResult<PullRequestSnapshot> {
        self.bounded("get_pull_request", self.inner.get_pull_request(repo, number))
            .await
    }

    async fn close_pull_request(&self, repo: &Repository, number: u64) -> ClientResult<()> {
        self.bounded(
            "close_pull_request",
            self.inner.close_pull_request(repo, number),
        )
        .await
    }

    async fn create_pull_request(
        &self,
        repo: &Repository,
        pull_request: &NewPullRequest,
    ) -> ClientResult<CreatedItem> {
        self.bounded(
            "create_pull_request",
            self.inner.create_pull_request(repo, pull_request),
        )
        .await
    }

    async fn add_project_item(
        &self,
        project: &ProjectUrl,
        repo: &Repository,
        content: &ProjectContent,
    ) -> ClientResult<String> {
        self.bounded(
            "add_project_item",
            self.inner.add_project_item(project, repo, content),
        )
        .await
    }

    async fn update_project_item_field(
        &self,
        project: &ProjectUrl,
        item_id: &str,
        field: &str,
        value: &str,
    ) -> ClientResult<()> {
        self.bounded(
            "update_project_item_field",
            self.inner
                .update_project_item_field(project, item_id, field, value),
        )
        .await
    }

    async fn ensure_project_view(
        &self,
        project: &ProjectUrl,
        view: &ProjectView,
    ) -> ClientResult<()> {
        self.bounded(
            "ensure_project_view",
            self.inner.ensure_project_view(project, view),
        )
        .await
    }

    async fn create_project_status_update(
        &self,
        project: &ProjectUrl,
        update: &NewStatusUpdate,
    ) -> ClientResult<String> {
        self.bounded(
            "create_project_status_update",
            self.inner.create_project_status_update(project, update),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::testing::RecordingClient;

    #[tokio::test(start_paused = true)]
    async fn slow_calls_time_out() {
        let recording = Arc::new(RecordingClient::new().with_latency(Duration::from_secs(60)));
        let client = TimeoutClient::new(recording).with_timeout(Duration::from_secs(5));
        let repo = Repository::new("octo", "repo");

        let err = client.close_issue(&repo, 1).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Timeout {
                operation: "close_issue",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn fast_calls_pass_through() {
        let recording = Arc::new(RecordingClient::new());
        let client = TimeoutClient::new(recording.clone());
        let repo = Repository::new("octo", "repo");

        client.add_comment(&repo, 3, "hello").await.unwrap();
        assert_eq!(client.timeout(), DEFAULT_CALL_TIMEOUT);
        assert_eq!(recording.calls().len(), 1);
    }
}
