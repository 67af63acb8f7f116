//! In-memory [`GitHubClient`] that records every call.
//!
//! Enabled with the `test-util` feature. Unknown pull requests read as open,
//! untitled, and unlabeled so tests only describe the state they care about.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use safeout_config::ProjectView;
use safeout_primitives::{ProjectUrl, Repository};

use crate::client::{
    CommentRef, CommentSummary, CreatedItem, GitHubClient, IssueSummary, ItemState, NewIssue,
    NewPullRequest, NewStatusUpdate, ProjectContent, PullRequestSnapshot,
};
use crate::error::{ClientError, ClientResult};

/// One recorded client call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Call {
    CreateIssue(NewIssue),
    CloseIssue { number: u64 },
    FindOpenIssues { marker: String },
    AddSubIssue { parent: u64, child: u64 },
    AddComment { number: u64, body: String },
    ListComments { number: u64 },
    MinimizeComment { node_id: String },
    AddLabels { number: u64, labels: Vec<String> },
    RemoveLabel { number: u64, label: String },
    GetPullRequest { number: u64 },
    ClosePullRequest { number: u64 },
    CreatePullRequest(NewPullRequest),
    AddProjectItem { project: String, content: ProjectContent },
    UpdateProjectItemField { project: String, item_id: String, field: String, value: String },
    EnsureProjectView { project: String, name: String },
    CreateProjectStatusUpdate { project: String, update: NewStatusUpdate },
}

impl Call {
    /// Client operation name, matching [`RecordingClient::fail_on`] keys.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::CreateIssue(_) => "create_issue",
            Self::CloseIssue { .. } => "close_issue",
            Self::FindOpenIssues { .. } => "find_open_issues",
            Self::AddSubIssue { .. } => "add_sub_issue",
            Self::AddComment { .. } => "add_comment",
            Self::ListComments { .. } => "list_comments",
            Self::MinimizeComment { .. } => "minimize_comment",
            Self::AddLabels { .. } => "add_labels",
            Self::RemoveLabel { .. } => "remove_label",
            Self::GetPullRequest { .. } => "get_pull_request",
            Self::ClosePullRequest { .. } => "close_pull_request",
            Self::CreatePullRequest(_) => "create_pull_request",
            Self::AddProjectItem { .. } => "add_project_item",
            Self::UpdateProjectItemField { .. } => "update_project_item_field",
            Self::EnsureProjectView { .. } => "ensure_project_view",
            Self::CreateProjectStatusUpdate { .. } => "create_project_status_update",
        }
    }

    /// Returns `true` for calls that change state on GitHub.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Self::FindOpenIssues { .. } | Self::ListComments { .. } | Self::GetPullRequest { .. }
        )
    }
}

#[derive(Debug)]
struct StoredIssue {
    summary: IssueSummary,
    body: String,
    open: bool,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    pull_requests: HashMap<u64, PullRequestSnapshot>,
    comments: HashMap<u64, Vec<CommentSummary>>,
    issues: Vec<StoredIssue>,
    failures: HashMap<&'static str, ClientError>,
    next_id: u64,
}

/// Recording fake for tests.
#[derive(Debug, Default)]
pub struct RecordingClient {
    state: Mutex<State>,
    latency: Option<Duration>,
}

impl RecordingClient {
    /// Creates an empty fake. Created items are numbered from 100.
    #[must_use]
    pub fn new() -> Self {
        let client = Self::default();
        client.lock().next_id = 100;
        client
    }

    /// Delays every call, for timeout tests.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Seeds a pull request.
    #[must_use]
    pub fn with_pull_request(self, snapshot: PullRequestSnapshot) -> Self {
        self.lock().pull_requests.insert(snapshot.number, snapshot);
        self
    }

    /// Seeds an existing comment.
    #[must_use]
    pub fn with_comment(self, number: u64, node_id: &str, body: &str) -> Self {
        {
            let mut state = self.lock();
            state.next_id += 1;
            let id = state.next_id;
            state.comments.entry(number).or_default().push(CommentSummary {
                id,
                node_id: node_id.to_owned(),
                body: body.to_owned(),
            });
        }
        self
    }

    /// Seeds an existing open issue.
    #[must_use]
    pub fn with_open_issue(self, number: u64, title: &str, body: &str) -> Self {
        self.lock().issues.push(StoredIssue {
            summary: IssueSummary {
                number,
                title: title.to_owned(),
                node_id: format!("I_{number}"),
            },
            body: body.to_owned(),
            open: true,
        });
        self
    }

    /// Makes every call to `operation` fail with `error`.
    #[must_use]
    pub fn fail_on(self, operation: &'static str, error: ClientError) -> Self {
        self.lock().failures.insert(operation, error);
        self
    }

    /// Returns every call in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Returns only state-changing calls.
    #[must_use]
    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    /// Counts calls to `operation`.
    #[must_use]
    pub fn count(&self, operation: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn record(&self, call: Call) -> ClientResult<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let mut state = self.lock();
        let failure = state.failures.get(call.operation()).cloned();
        state.calls.push(call);
        failure.map_or(Ok(()), Err)
    }

    fn next_id(&self) -> u64 {
        let mut state = self.lock();
        state.next_id += 1;
        state.next_id
    }
}

#[async_trait]
impl GitHubClient for RecordingClient {
    async fn create_issue(&self, repo: &Repository, issue: &NewIssue) -> ClientResult<CreatedItem> {
        self.record(Call::CreateIssue(issue.clone())).await?;
        let number = self.next_id();
        self.lock().issues.push(StoredIssue {
            summary: IssueSummary {
                number,
                title: issue.title.clone(),
                node_id: format!("I_{number}"),
            },
            body: issue.body.clone(),
            open: true,
        });
        Ok(CreatedItem {
            number,
            url: format!("https://github.com/{repo}/issues/{number}"),
            node_id: format!("I_{number}"),
        })
    }

    async fn close_issue(&self, _repo: &Repository, number: u64) -> ClientResult<()> {
        self.record(Call::CloseIssue { number }).await?;
        let mut state = self.lock();
        for issue in state.issues.iter_mut().filter(|i| i.summary.number == number) {
            issue.open = false;
        }
        Ok(())
    }

    async fn find_open_issues(
        &self,
        _repo: &Repository,
        marker: &str,
    ) -> ClientResult<Vec<IssueSummary>> {
        self.record(Call::FindOpenIssues {
            marker: marker.to_owned(),
        })
        .await?;
        Ok(self
            .lock()
            .issues
            .iter()
            .filter(|issue| issue.open && issue.body.contains(marker))
            .map(|issue| issue.summary.clone())
            .collect())
    }

    async fn add_sub_issue(&self, _repo: &Repository, parent: u64, child: u64) -> ClientResult<()> {
        self.record(Call::AddSubIssue { parent, child }).await
    }

    async fn add_comment(
        &self,
        repo: &Repository,
        number: u64,
        body: &str,
    ) -> ClientResult<CommentRef> {
        self.record(Call::AddComment {
            number,
            body: body.to_owned(),
        })
        .await?;
        let id = self.next_id();
        self.lock().comments.entry(number).or_default().push(CommentSummary {
            id,
            node_id: format!("IC_{id}"),
            body: body.to_owned(),
        });
        Ok(CommentRef {
            id,
            url: format!("https://github.com/{repo}/issues/{number}#issuecomment-{id}"),
        })
    }

    async fn list_comments(
        &self,
        _repo: &Repository,
        number: u64,
    ) -> ClientResult<Vec<CommentSummary>> {
        self.record(Call::ListComments { number }).await?;
        Ok(self.lock().comments.get(&number).cloned().unwrap_or_default())
    }

    async fn minimize_comment(&self, node_id: &str) -> ClientResult<()> {
        self.record(Call::MinimizeComment {
            node_id: node_id.to_owned(),
        })
        .await
    }

    async fn add_labels(
        &self,
        _repo: &Repository,
        number: u64,
        labels: &[String],
    ) -> ClientResult<Vec<String>> {
        self.record(Call::AddLabels {
            number,
            labels: labels.to_vec(),
        })
        .await?;
        let mut state = self.lock();
        let current = state
            .pull_requests
            .get_mut(&number)
            .map(|pr| &mut pr.labels);
        match current {
            Some(current) => {
                for label in labels {
                    if !current.contains(label) {
                        current.push(label.clone());
                    }
                }
                Ok(current.clone())
            }
            None => Ok(labels.to_vec()),
        }
    }

    async fn remove_label(&self, _repo: &Repository, number: u64, label: &str) -> ClientResult<()> {
        self.record(Call::RemoveLabel {
            number,
            label: label.to_owned(),
        })
        .await?;
        if let Some(pr) = self.lock().pull_requests.get_mut(&number) {
            pr.labels.retain(|existing| existing != label);
        }
        Ok(())
    }

    async fn get_pull_request(
        &self,
        _repo: &Repository,
        number: u64,
    ) -> ClientResult<PullRequestSnapshot> {
        self.record(Call::GetPullRequest { number }).await?;
        Ok(self
            .lock()
            .pull_requests
            .get(&number)
            .cloned()
            .unwrap_or_else(|| PullRequestSnapshot {
                number,
                state: ItemState::Open,
                title: String::new(),
                labels: Vec::new(),
            }))
    }

    async fn close_pull_request(&self, _repo: &Repository, number: u64) -> ClientResult<()> {
        self.record(Call::ClosePullRequest { number }).await?;
        let mut state = self.lock();
        let pr = state
            .pull_requests
            .entry(number)
            .or_insert_with(|| PullRequestSnapshot {
                number,
                state: ItemState::Open,
                title: String::new(),
                labels: Vec::new(),
            });
        pr.state = ItemState::Closed;
        Ok(())
    }

    async fn create_pull_request(
        &self,
        repo: &Repository,
        pull_request: &NewPullRequest,
    ) -> ClientResult<CreatedItem> {
        self.record(Call::CreatePullRequest(pull_request.clone()))
            .await?;
        let number = self.next_id();
        Ok(CreatedItem {
            number,
            url: format!("https://github.com/{repo}/pull/{number}"),
            node_id: format!("PR_{number}"),
        })
    }

    async fn add_project_item(
        &self,
        project: &ProjectUrl,
        _repo: &Repository,
        content: &ProjectContent,
    ) -> ClientResult<String> {
        self.record(Call::AddProjectItem {
            project: project.to_string(),
            content: content.clone(),
        })
        .await?;
        Ok(format!("PVTI_{}", self.next_id()))
    }

    async fn update_project_item_field(
        &self,
        project: &ProjectUrl,
        item_id: &str,
        field: &str,
        value: &str,
    ) -> ClientResult<()> {
        self.record(Call::UpdateProjectItemField {
            project: project.to_string(),
            item_id: item_id.to_owned(),
            field: field.to_owned(),
            value: value.to_owned(),
        })
        .await
    }

    async fn ensure_project_view(
        &self,
        project: &ProjectUrl,
        view: &ProjectView,
    ) -> ClientResult<()> {
        self.record(Call::EnsureProjectView {
            project: project.to_string(),
            name: view.name.clone(),
        })
        .await
    }

    async fn create_project_status_update(
        &self,
        project: &ProjectUrl,
        update: &NewStatusUpdate,
    ) -> ClientResult<String> {
        self.record(Call::CreateProjectStatusUpdate {
            project: project.to_string(),
            update: update.clone(),
        })
        .await?;
        Ok(format!("PVTSU_{}", self.next_id()))
    }
}
