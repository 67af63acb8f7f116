//! `add-comment`.

use async_trait::async_trait;
use safeout_policy::filters::enforce_target;
use safeout_policy::structural::require_text;
use safeout_primitives::{ActionPayload, ActionType, SafeOutputRequest};
use tracing::{debug, info, warn};

use crate::error::HandlerResult;
use crate::handler::{ActionHandler, HandlerContext, ValidatedAction, enabled, payload_mismatch};
use crate::result::ExecutionResult;

/// Posts a comment on an issue or pull request.
#[derive(Debug, Default, Clone, Copy)]
pub struct AddCommentHandler;

#[async_trait]
impl ActionHandler for AddCommentHandler {
    fn action(&self) -> ActionType {
        ActionType::AddComment
    }

    async fn validate(
        &self,
        request: &SafeOutputRequest,
        ctx: &HandlerContext,
    ) -> HandlerResult<Box<dyn ValidatedAction>> {
        let ActionPayload::AddComment(payload) = request.payload() else {
            return Err(payload_mismatch(self.action(), request));
        };
        let config = enabled(ctx.store().add_comment(), self.action())?;

        let body = require_text("body", payload.body.as_deref())?;
        let number = enforce_target(
            config.target,
            request.target(),
            ctx.run().triggering_number(),
            "item_number",
        )?;

        Ok(Box::new(AddComment {
            number,
            body: ctx.renderer().decorate(body),
            hide_older: config.hide_older_comments,
        }))
    }
}

#[derive(Debug)]
struct AddComment {
    number: u64,
    body: String,
    hide_older: bool,
}

impl AddComment {
    async fn hide_older(&self, ctx: &HandlerContext, keep: u64, result: &mut ExecutionResult) {
        let comments = match ctx.client().list_comments(ctx.repository(), self.number).await {
            Ok(comments) => comments,
            Err(err) => {
                warn!(item = self.number, error = %err, "listing comments failed");
                result.warn(format!("Failed to list comments on #{}: {err}", self.number));
                return;
            }
        };

        let marker = ctx.renderer().workflow_marker();
        for comment in comments
            .iter()
            .filter(|c| c.id != keep && c.body.contains(marker))
        {
            match ctx.client().minimize_comment(&comment.node_id).await {
                Ok(()) => debug!(comment = comment.id, "older comment hidden"),
                Err(err) => {
                    warn!(comment = comment.id, error = %err, "hiding comment failed");
                    result.warn(format!("Failed to hide comment {}: {err}", comment.id));
                }
            }
        }
    }
}

#[async_trait]
impl ValidatedAction for AddComment {
    fn preview(&self) -> ExecutionResult {
        ExecutionResult::staged().with_number(self.number)
    }

    async fn execute(self: Box<Self>, ctx: &HandlerContext) -> ExecutionResult {
        let comment = match ctx
            .client()
            .add_comment(ctx.repository(), self.number, &self.body)
            .await
        {
            Ok(comment) => comment,
            Err(err) => {
                return ExecutionResult::failed(format!(
                    "Failed to add comment to #{}: {err}",
                    self.number
                ));
            }
        };
        info!(item = self.number, comment = comment.id, "comment posted");

        let mut result = ExecutionResult::ok()
            .with_number(self.number)
            .with_url(comment.url);
        result.comment_id = Some(comment.id);

        if self.hide_older {
            self.hide_older(ctx, comment.id, &mut result).await;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use safeout_config::load_from_str;
    use safeout_primitives::{
        AddCommentRequest, Provenance, Repository, ResolvedTarget, RunContext, RunId,
        TriggerTarget,
    };

    use super::*;
    use crate::error::HandlerError;
    use crate::testing::{Call, RecordingClient};

    fn context(config: &str, client: Arc<RecordingClient>) -> HandlerContext {
        let run = RunContext::new(Repository::new("octo", "repo"), RunId::new("9"))
            .with_workflow_name("triage")
            .with_trigger(TriggerTarget::issue(12));
        HandlerContext::new(run, load_from_str(config).unwrap(), client)
    }

    fn request(body: &str, target: ResolvedTarget) -> SafeOutputRequest {
        SafeOutputRequest::new(
            ActionPayload::AddComment(AddCommentRequest {
                body: Some(body.to_owned()),
                item_number: None,
            }),
            Some(target),
            Provenance {
                run_id: RunId::new("9"),
                trigger: Some(TriggerTarget::issue(12)),
            },
        )
    }

    #[tokio::test]
    async fn comments_on_the_triggering_item() {
        let client = Arc::new(RecordingClient::new());
        let ctx = context(r#"{"add-comment": {}}"#, client.clone());

        let action = AddCommentHandler
            .validate(&request("Looks good", ResolvedTarget::triggering(12)), &ctx)
            .await
            .unwrap();
        let result = action.execute(&ctx).await;

        assert!(result.success);
        assert_eq!(result.number, Some(12));
        assert_eq!(result.comment_id, Some(101));
        assert_eq!(client.count("add_comment"), 1);
    }

    #[tokio::test]
    async fn blank_body_is_rejected() {
        let client = Arc::new(RecordingClient::new());
        let ctx = context(r#"{"add-comment": {}}"#, client);

        let err = AddCommentHandler
            .validate(&request("   ", ResolvedTarget::triggering(12)), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Rejected(r) if r.message().contains("`body`")));
    }

    #[tokio::test]
    async fn other_items_need_a_wildcard_target() {
        let client = Arc::new(RecordingClient::new());
        let ctx = context(r#"{"add-comment": {}}"#, client.clone());
        assert!(
            AddCommentHandler
                .validate(&request("hi", ResolvedTarget::explicit(40)), &ctx)
                .await
                .is_err()
        );

        let ctx = context(r#"{"add-comment": {"target": "*"}}"#, client);
        let action = AddCommentHandler
            .validate(&request("hi", ResolvedTarget::explicit(40)), &ctx)
            .await
            .unwrap();
        assert_eq!(action.execute(&ctx).await.number, Some(40));
    }

    #[tokio::test]
    async fn hides_only_this_workflows_older_comments() {
        let client = Arc::new(
            RecordingClient::new()
                .with_comment(12, "IC_old", "old\n\n<!-- safe-outputs-workflow: triage -->")
                .with_comment(12, "IC_human", "a human comment"),
        );
        let ctx = context(r#"{"add-comment": {"hide-older-comments": true}}"#, client.clone());

        let action = AddCommentHandler
            .validate(&request("new", ResolvedTarget::triggering(12)), &ctx)
            .await
            .unwrap();
        let result = action.execute(&ctx).await;

        assert!(result.success);
        let hidden: Vec<_> = client
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::MinimizeComment { node_id } => Some(node_id),
                _ => None,
            })
            .collect();
        assert_eq!(hidden, vec!["IC_old"]);
    }
}
