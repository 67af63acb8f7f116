//! `close-pull-request` and `create-pull-request`.

use async_trait::async_trait;
use safeout_policy::Rejection;
use safeout_policy::filters::{check_required_labels, check_title_prefix};
use safeout_policy::sanitize::sanitize_title;
use safeout_policy::structural::{
    comment_body, normalize_labels, require_branch, require_target, require_text,
};
use safeout_primitives::{ActionPayload, ActionType, SafeOutputRequest};
use tracing::{info, warn};

use crate::client::{ItemState, NewPullRequest};
use crate::error::{ClientError, HandlerError, HandlerResult};
use crate::handler::{ActionHandler, HandlerContext, ValidatedAction, enabled, payload_mismatch};
use crate::result::ExecutionResult;

/// Base branch used when neither the request nor the policy names one.
pub const DEFAULT_BASE_BRANCH: &str = "main";

/// Closes a pull request and explains why in a comment.
///
/// The comment is posted even when the pull request is already closed, in
/// which case the close call is skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClosePullRequestHandler;

#[async_trait]
impl ActionHandler for ClosePullRequestHandler {
    fn action(&self) -> ActionType {
        ActionType::ClosePullRequest
    }

    async fn validate(
        &self,
        request: &SafeOutputRequest,
        ctx: &HandlerContext,
    ) -> HandlerResult<Box<dyn ValidatedAction>> {
        let ActionPayload::ClosePullRequest(payload) = request.payload() else {
            return Err(payload_mismatch(self.action(), request));
        };
        let config = enabled(ctx.store().close_pull_request(), self.action())?;

        let number = require_target("pull_request_number", request.target())?.number;
        let body = comment_body(payload.body.as_deref(), config.comment.as_deref())?;

        let snapshot = ctx
            .client()
            .get_pull_request(ctx.repository(), number)
            .await
            .map_err(|err| match err {
                ClientError::NotFound { .. } => HandlerError::from(Rejection::validation(
                    format!("Pull request #{number}: {err}"),
                )),
                other => HandlerError::from(other),
            })?;

        let subject = format!("Pull request #{number}");
        if let Some(required) = config.required_labels.as_deref() {
            check_required_labels(&subject, &snapshot.labels, &normalize_labels(required))?;
        }
        if let Some(prefix) = config.required_title_prefix.as_deref() {
            check_title_prefix(&subject, &snapshot.title, prefix)?;
        }

        Ok(Box::new(ClosePullRequest {
            number,
            body: ctx.renderer().decorate(&body),
            already_closed: snapshot.state == ItemState::Closed,
        }))
    }
}

#[derive(Debug)]
struct ClosePullRequest {
    number: u64,
    body: String,
    already_closed: bool,
}

#[async_trait]
impl ValidatedAction for ClosePullRequest {
    fn preview(&self) -> ExecutionResult {
        ExecutionResult {
            already_closed: Some(self.already_closed),
            ..ExecutionResult::staged().with_number(self.number)
        }
    }

    async fn execute(self: Box<Self>, ctx: &HandlerContext) -> ExecutionResult {
        let repo = ctx.repository();

        if self.already_closed {
            info!(pull_request = self.number, "pull request already closed, skipping close");
        } else if let Err(err) = ctx.client().close_pull_request(repo, self.number).await {
            return ExecutionResult::failed(format!(
                "Failed to close pull request #{}: {err}",
                self.number
            ));
        } else {
            info!(pull_request = self.number, "pull request closed");
        }

        let mut result = ExecutionResult {
            already_closed: Some(self.already_closed),
            ..ExecutionResult::ok().with_number(self.number)
        };

        match ctx.client().add_comment(repo, self.number, &self.body).await {
            Ok(comment) => {
                result.comment_posted = Some(true);
                result.comment_id = Some(comment.id);
                result.url = Some(comment.url);
            }
            Err(err) => {
                warn!(pull_request = self.number, error = %err, "closing comment failed");
                result.comment_posted = Some(false);
                result.warn(format!(
                    "Failed to post comment on pull request #{}: {err}",
                    self.number
                ));
            }
        }
        result
    }
}

/// Opens a pull request from a branch the agent already pushed.
#[derive(Debug, Default, Clone, Copy)]
pub struct CreatePullRequestHandler;

#[async_trait]
impl ActionHandler for CreatePullRequestHandler {
    fn action(&self) -> ActionType {
        ActionType::CreatePullRequest
    }

    async fn validate(
        &self,
        request: &SafeOutputRequest,
        ctx: &HandlerContext,
    ) -> HandlerResult<Box<dyn ValidatedAction>> {
        let ActionPayload::CreatePullRequest(payload) = request.payload() else {
            return Err(payload_mismatch(self.action(), request));
        };
        let config = enabled(ctx.store().create_pull_request(), self.action())?;

        let title = require_text("title", payload.title.as_deref())?;
        let head = require_branch("head", payload.head.as_deref())?;
        let base = payload
            .base
            .as_deref()
            .or(config.base.as_deref())
            .unwrap_or(DEFAULT_BASE_BRANCH);
        let base = require_branch("base", Some(base))?;
        if head == base {
            return Err(Rejection::validation(format!(
                "`head` and `base` must differ, both are \"{head}\""
            ))
            .into());
        }

        let title = match config.title_prefix.as_deref() {
            Some(prefix) if !title.starts_with(prefix) => format!("{prefix}{title}"),
            _ => title.to_owned(),
        };
        let mut labels = normalize_labels(&config.labels);
        for label in normalize_labels(&payload.labels) {
            if !labels.contains(&label) {
                labels.push(label);
            }
        }

        Ok(Box::new(CreatePullRequest {
            pull_request: NewPullRequest {
                title: sanitize_title(&title),
                body: ctx
                    .renderer()
                    .decorate(payload.body.as_deref().unwrap_or_default()),
                head: head.to_owned(),
                base: base.to_owned(),
                draft: config.draft,
            },
            labels,
        }))
    }
}

#[derive(Debug)]
struct CreatePullRequest {
    pull_request: NewPullRequest,
    labels: Vec<String>,
}

#[async_trait]
impl ValidatedAction for CreatePullRequest {
    async fn execute(self: Box<Self>, ctx: &HandlerContext) -> ExecutionResult {
        let repo = ctx.repository();
        let created = match ctx.client().create_pull_request(repo, &self.pull_request).await {
            Ok(created) => created,
            Err(err) => {
                return ExecutionResult::failed(format!(
                    "Failed to create pull request from `{}`: {err}",
                    self.pull_request.head
                ));
            }
        };
        info!(pull_request = created.number, url = %created.url, "pull request created");

        let mut result = ExecutionResult::ok()
            .with_number(created.number)
            .with_url(created.url);
        if self.labels.is_empty() {
            return result;
        }

        match ctx.client().add_labels(repo, created.number, &self.labels).await {
            Ok(current) => result.labels = Some(current),
            Err(err) => {
                warn!(pull_request = created.number, error = %err, "labeling pull request failed");
                result.warn(format!(
                    "Failed to label pull request #{}: {err}",
                    created.number
                ));
            }
        }
        result
    }
}
