//! `create-issue`.

use async_trait::async_trait;
use chrono::Utc;
use safeout_policy::filters::check_allowed_labels;
use safeout_policy::sanitize::sanitize_title;
use safeout_policy::structural::{normalize_labels, require_text};
use safeout_primitives::{ActionPayload, ActionType, SafeOutputRequest};
use tracing::{info, warn};

use crate::client::NewIssue;
use crate::error::HandlerResult;
use crate::handler::{ActionHandler, HandlerContext, ValidatedAction, enabled, payload_mismatch};
use crate::render::expires_marker;
use crate::result::ExecutionResult;

/// Creates issues, optionally grouping them and closing older ones.
#[derive(Debug, Default, Clone, Copy)]
pub struct CreateIssueHandler;

#[async_trait]
impl ActionHandler for CreateIssueHandler {
    fn action(&self) -> ActionType {
        ActionType::CreateIssue
    }

    async fn validate(
        &self,
        request: &SafeOutputRequest,
        ctx: &HandlerContext,
    ) -> HandlerResult<Box<dyn ValidatedAction>> {
        let ActionPayload::CreateIssue(payload) = request.payload() else {
            return Err(payload_mismatch(self.action(), request));
        };
        let config = enabled(ctx.store().create_issue(), self.action())?;

        let title = require_text("title", payload.title.as_deref())?;
        let requested = normalize_labels(&payload.labels);
        check_allowed_labels(&requested, config.allowed.as_deref())?;

        let mut labels = normalize_labels(&config.labels);
        for label in requested {
            if !labels.contains(&label) {
                labels.push(label);
            }
        }

        let title = match config.title_prefix.as_deref() {
            Some(prefix) if !title.starts_with(prefix) => format!("{prefix}{title}"),
            _ => title.to_owned(),
        };

        let markers: Vec<String> = config
            .expires
            .map(|expiry| expires_marker(expiry.expires_at(Utc::now())))
            .into_iter()
            .collect();
        let body = ctx
            .renderer()
            .decorate_with(payload.body.as_deref().unwrap_or_default(), &markers);

        Ok(Box::new(CreateIssue {
            issue: NewIssue {
                title: sanitize_title(&title),
                body,
                labels,
            },
            group: config.group,
            close_older: config.close_older_issues,
        }))
    }
}

#[derive(Debug)]
struct CreateIssue {
    issue: NewIssue,
    group: bool,
    close_older: bool,
}

impl CreateIssue {
    async fn attach_to_group(&self, ctx: &HandlerContext, child: u64) -> Result<u64, String> {
        let repo = ctx.repository();
        let renderer = ctx.renderer();
        let existing = ctx
            .client()
            .find_open_issues(repo, renderer.group_marker())
            .await
            .map_err(|err| format!("Failed to look up group issue: {err}"))?;

        let parent = match existing.first() {
            Some(parent) => parent.number,
            None => {
                let parent = NewIssue {
                    title: format!("[{}] Issue group", renderer.workflow_name()),
                    body: format!(
                        "Issues created by {}.\n\n{}",
                        renderer.workflow_name(),
                        renderer.group_marker()
                    ),
                    labels: Vec::new(),
                };
                ctx.client()
                    .create_issue(repo, &parent)
                    .await
                    .map_err(|err| format!("Failed to create group issue: {err}"))?
                    .number
            }
        };

        ctx.client()
            .add_sub_issue(repo, parent, child)
            .await
            .map_err(|err| format!("Failed to link #{child} under group issue #{parent}: {err}"))?;
        Ok(parent)
    }

    async fn close_older(&self, ctx: &HandlerContext, keep: &[u64], result: &mut ExecutionResult) {
        let repo = ctx.repository();
        let older = match ctx
            .client()
            .find_open_issues(repo, ctx.renderer().workflow_marker())
            .await
        {
            Ok(older) => older,
            Err(err) => {
                warn!(error = %err, "listing older issues failed");
                result.warn(format!("Failed to list older issues: {err}"));
                return;
            }
        };

        let newest = keep.first().copied().unwrap_or_default();
        for issue in older.into_iter().filter(|i| !keep.contains(&i.number)) {
            let note = format!("Superseded by #{newest}.");
            if let Err(err) = ctx.client().add_comment(repo, issue.number, &note).await {
                warn!(issue = issue.number, error = %err, "superseded note failed");
                result.warn(format!("Failed to comment on older issue #{}: {err}", issue.number));
            }
            match ctx.client().close_issue(repo, issue.number).await {
                Ok(()) => info!(issue = issue.number, newest, "closed older issue"),
                Err(err) => {
                    warn!(issue = issue.number, error = %err, "closing older issue failed");
                    result.warn(format!("Failed to close older issue #{}: {err}", issue.number));
                }
            }
        }
    }
}

#[async_trait]
impl ValidatedAction for CreateIssue {
    async fn execute(self: Box<Self>, ctx: &HandlerContext) -> ExecutionResult {
        let created = match ctx.client().create_issue(ctx.repository(), &self.issue).await {
            Ok(created) => created,
            Err(err) => return ExecutionResult::failed(format!("Failed to create issue: {err}")),
        };
        info!(issue = created.number, url = %created.url, "issue created");

        let mut result = ExecutionResult::ok()
            .with_number(created.number)
            .with_url(created.url);
        if !self.issue.labels.is_empty() {
            result.labels = Some(self.issue.labels.clone());
        }

        let mut keep = vec![created.number];
        if self.group {
            match self.attach_to_group(ctx, created.number).await {
                Ok(parent) => keep.push(parent),
                Err(warning) => {
                    warn!(issue = created.number, %warning, "grouping failed");
                    result.warn(warning);
                }
            }
        }

        if self.close_older {
            self.close_older(ctx, &keep, &mut result).await;
        }

        result
    }
}
