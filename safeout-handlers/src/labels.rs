//! `add-labels` and `remove-labels`.

use async_trait::async_trait;
use safeout_policy::filters::{check_allowed_labels, enforce_target};
use safeout_policy::structural::require_labels;
use safeout_primitives::{ActionPayload, ActionType, SafeOutputRequest};
use tracing::{info, warn};

use crate::error::{ClientError, HandlerResult};
use crate::handler::{ActionHandler, HandlerContext, ValidatedAction, enabled, payload_mismatch};
use crate::result::ExecutionResult;

/// Direction of a label change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelOperation {
    /// `add-labels`
    Add,
    /// `remove-labels`
    Remove,
}

/// Adds or removes labels on an issue or pull request.
#[derive(Debug, Clone, Copy)]
pub struct LabelsHandler {
    operation: LabelOperation,
}

impl LabelsHandler {
    /// Handler for `add-labels`.
    #[must_use]
    pub const fn add() -> Self {
        Self {
            operation: LabelOperation::Add,
        }
    }

    /// Handler for `remove-labels`.
    #[must_use]
    pub const fn remove() -> Self {
        Self {
            operation: LabelOperation::Remove,
        }
    }
}

#[async_trait]
impl ActionHandler for LabelsHandler {
    fn action(&self) -> ActionType {
        match self.operation {
            LabelOperation::Add => ActionType::AddLabels,
            LabelOperation::Remove => ActionType::RemoveLabels,
        }
    }

    async fn validate(
        &self,
        request: &SafeOutputRequest,
        ctx: &HandlerContext,
    ) -> HandlerResult<Box<dyn ValidatedAction>> {
        let payload = match (self.operation, request.payload()) {
            (LabelOperation::Add, ActionPayload::AddLabels(payload))
            | (LabelOperation::Remove, ActionPayload::RemoveLabels(payload)) => payload,
            _ => return Err(payload_mismatch(self.action(), request)),
        };
        let config = match self.operation {
            LabelOperation::Add => ctx.store().add_labels(),
            LabelOperation::Remove => ctx.store().remove_labels(),
        };
        let config = enabled(config, self.action())?;

        let labels = require_labels(&payload.labels)?;
        check_allowed_labels(&labels, config.allowed.as_deref())?;
        let number = enforce_target(
            config.target,
            request.target(),
            ctx.run().triggering_number(),
            "item_number",
        )?;

        Ok(Box::new(ChangeLabels {
            operation: self.operation,
            number,
            labels,
        }))
    }
}

#[derive(Debug)]
struct ChangeLabels {
    operation: LabelOperation,
    number: u64,
    labels: Vec<String>,
}

impl ChangeLabels {
    async fn add(&self, ctx: &HandlerContext) -> ExecutionResult {
        match ctx
            .client()
            .add_labels(ctx.repository(), self.number, &self.labels)
            .await
        {
            Ok(current) => {
                info!(item = self.number, labels = ?self.labels, "labels added");
                ExecutionResult {
                    labels: Some(current),
                    ..ExecutionResult::ok().with_number(self.number)
                }
            }
            Err(err) => ExecutionResult::failed(format!(
                "Failed to add labels to #{}: {err}",
                self.number
            )),
        }
    }

    async fn remove(&self, ctx: &HandlerContext) -> ExecutionResult {
        let mut removed = Vec::new();
        let mut failures = Vec::new();

        for label in &self.labels {
            match ctx
                .client()
                .remove_label(ctx.repository(), self.number, label)
                .await
            {
                Ok(()) => removed.push(label.clone()),
                Err(ClientError::NotFound { .. }) => {
                    failures.push(format!("Label `{label}` was not present on #{}", self.number));
                }
                Err(err) => {
                    warn!(
                        item = self.number,
                        label = %label,
                        error = %err,
                        "removing label failed"
                    );
                    failures.push(format!(
                        "Failed to remove label `{label}` from #{}: {err}",
                        self.number
                    ));
                }
            }
        }

        if removed.is_empty() {
            return ExecutionResult::failed(failures.join("; "));
        }
        info!(item = self.number, labels = ?removed, "labels removed");

        let mut result = ExecutionResult {
            labels: Some(removed),
            ..ExecutionResult::ok().with_number(self.number)
        };
        for failure in failures {
            result.warn(failure);
        }
        result
    }
}

#[async_trait]
impl ValidatedAction for ChangeLabels {
    fn preview(&self) -> ExecutionResult {
        ExecutionResult {
            labels: Some(self.labels.clone()),
            ..ExecutionResult::staged().with_number(self.number)
        }
    }

    async fn execute(self: Box<Self>, ctx: &HandlerContext) -> ExecutionResult {
        match self.operation {
            LabelOperation::Add => self.add(ctx).await,
            LabelOperation::Remove => self.remove(ctx).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use safeout_config::load_from_str;
    use safeout_policy::RejectionKind;
    use safeout_primitives::{
        LabelsRequest, Provenance, Repository, ResolvedTarget, RunContext, RunId, TriggerTarget,
    };

    use super::*;
    use crate::error::HandlerError;
    use crate::testing::RecordingClient;

    fn context(config: &str, client: Arc<RecordingClient>) -> HandlerContext {
        let run = RunContext::new(Repository::new("octo", "repo"), RunId::new("3"))
            .with_trigger(TriggerTarget::pull_request(8));
        HandlerContext::new(run, load_from_str(config).unwrap(), client)
    }

    fn request(payload: ActionPayload) -> SafeOutputRequest {
        SafeOutputRequest::new(
            payload,
            Some(ResolvedTarget::triggering(8)),
            Provenance {
                run_id: RunId::new("3"),
                trigger: Some(TriggerTarget::pull_request(8)),
            },
        )
    }

    fn labels(items: &[&str]) -> LabelsRequest {
        LabelsRequest {
            labels: items.iter().map(|l| (*l).to_owned()).collect(),
            item_number: None,
        }
    }

    #[tokio::test]
    async fn disallowed_label_is_rejected_before_any_call() {
        let client = Arc::new(RecordingClient::new());
        let ctx = context(r#"{"add-labels": {"allowed": ["smoke-project"]}}"#, client.clone());

        let err = LabelsHandler::add()
            .validate(&request(ActionPayload::AddLabels(labels(&["other-label"]))), &ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, HandlerError::Rejected(r) if r.kind() == RejectionKind::Policy));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn adds_allowed_labels() {
        let client = Arc::new(RecordingClient::new());
        let ctx = context(r#"{"add-labels": {"allowed": ["smoke-project"]}}"#, client.clone());

        let action = LabelsHandler::add()
            .validate(&request(ActionPayload::AddLabels(labels(&["smoke-project"]))), &ctx)
            .await
            .unwrap();
        let result = action.execute(&ctx).await;

        assert!(result.success);
        assert_eq!(result.labels, Some(vec!["smoke-project".to_owned()]));
    }

    #[tokio::test]
    async fn partial_removal_keeps_success() {
        let client = Arc::new(RecordingClient::new());
        let ctx = context(r#"{"remove-labels": {}}"#, client.clone());

        let action = LabelsHandler::remove()
            .validate(&request(ActionPayload::RemoveLabels(labels(&["a", "b"]))), &ctx)
            .await
            .unwrap();
        let result = action.execute(&ctx).await;

        assert!(result.success);
        assert_eq!(client.count("remove_label"), 2);
        assert_eq!(result.labels, Some(vec!["a".to_owned(), "b".to_owned()]));
    }

    #[tokio::test]
    async fn empty_label_list_is_rejected() {
        let client = Arc::new(RecordingClient::new());
        let ctx = context(r#"{"remove-labels": {}}"#, client);

        let err = LabelsHandler::remove()
            .validate(&request(ActionPayload::RemoveLabels(labels(&[" "]))), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Rejected(r) if r.kind() == RejectionKind::Validation));
    }

    #[tokio::test]
    async fn wrong_payload_is_rejected() {
        let client = Arc::new(RecordingClient::new());
        let ctx = context(r#"{"add-labels": {}}"#, client);
        assert!(
            LabelsHandler::add()
                .validate(&request(ActionPayload::RemoveLabels(labels(&["x"]))), &ctx)
                .await
                .is_err()
        );
    }
}
