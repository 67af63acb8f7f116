//! `update-project` and `create-project-status-update`.
//!
//! Both types address a project board. The board is chosen after admission
//! by [`ValidatedAction::resolve_scope`]: the request's `project` wins over
//! the configured default.

use std::collections::BTreeMap;

use async_trait::async_trait;
use safeout_config::ProjectView;
use safeout_policy::sanitize::sanitize_body;
use safeout_policy::structural::{optional_date, require_status, require_text};
use safeout_policy::{PolicyResult, ProjectScope, Rejection, resolve_project_scope};
use safeout_primitives::{ActionPayload, ActionType, ContentType, ProjectUrl, SafeOutputRequest};
use tracing::{info, warn};

use crate::client::{NewStatusUpdate, ProjectContent};
use crate::error::HandlerResult;
use crate::handler::{ActionHandler, HandlerContext, ValidatedAction, enabled, payload_mismatch};
use crate::result::ExecutionResult;

/// Request-level override and configured default, resolved lazily.
#[derive(Debug, Clone)]
struct PendingScope {
    requested: Option<String>,
    default: Option<ProjectUrl>,
    resolved: Option<ProjectScope>,
}

impl PendingScope {
    fn new(requested: Option<&str>, default: Option<&ProjectUrl>) -> Self {
        Self {
            requested: requested.map(str::to_owned),
            default: default.cloned(),
            resolved: None,
        }
    }

    fn resolve(&mut self) -> PolicyResult<ProjectScope> {
        if let Some(scope) = &self.resolved {
            return Ok(scope.clone());
        }
        let scope = resolve_project_scope(self.requested.as_deref(), self.default.as_ref())?;
        self.resolved = Some(scope.clone());
        Ok(scope)
    }
}

/// Adds content to a project board and sets its fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct UpdateProjectHandler;

#[async_trait]
impl ActionHandler for UpdateProjectHandler {
    fn action(&self) -> ActionType {
        ActionType::UpdateProject
    }

    async fn validate(
        &self,
        request: &SafeOutputRequest,
        ctx: &HandlerContext,
    ) -> HandlerResult<Box<dyn ValidatedAction>> {
        let ActionPayload::UpdateProject(payload) = request.payload() else {
            return Err(payload_mismatch(self.action(), request));
        };
        let config = enabled(ctx.store().update_project(), self.action())?;

        let Some(content_type) = payload.content_type else {
            return Err(Rejection::validation(
                "Missing required field `content_type`: \
                 expected draft_issue, issue, or pull_request",
            )
            .into());
        };
        let content = match content_type {
            ContentType::DraftIssue => ProjectContent::DraftIssue {
                title: require_text("draft_title", payload.draft_title.as_deref())?
                    .trim()
                    .to_owned(),
                body: payload
                    .draft_body
                    .as_deref()
                    .filter(|body| !body.trim().is_empty())
                    .map(sanitize_body),
            },
            ContentType::Issue => ProjectContent::Issue {
                number: require_content_number(payload.content_number)?,
            },
            ContentType::PullRequest => ProjectContent::PullRequest {
                number: require_content_number(payload.content_number)?,
            },
        };

        if let Some(blank) = payload.fields.keys().find(|name| name.trim().is_empty()) {
            return Err(Rejection::validation(format!(
                "`fields` contains a blank field name (\"{blank}\")"
            ))
            .into());
        }

        Ok(Box::new(UpdateProject {
            scope: PendingScope::new(payload.project.as_deref(), config.project.as_ref()),
            content,
            fields: payload.fields.clone(),
            views: config.views.clone(),
        }))
    }
}

fn require_content_number(number: Option<u64>) -> PolicyResult<u64> {
    number.ok_or_else(|| {
        Rejection::validation(
            "Missing required field `content_number` for issue or pull_request content",
        )
    })
}

#[derive(Debug)]
struct UpdateProject {
    scope: PendingScope,
    content: ProjectContent,
    fields: BTreeMap<String, String>,
    views: Vec<ProjectView>,
}

#[async_trait]
impl ValidatedAction for UpdateProject {
    fn resolve_scope(&mut self) -> PolicyResult<Option<ProjectScope>> {
        self.scope.resolve().map(Some)
    }

    fn preview(&self) -> ExecutionResult {
        let mut result = ExecutionResult::staged();
        result.url = self.scope.resolved.as_ref().map(|scope| scope.url.to_string());
        result
    }

    async fn execute(mut self: Box<Self>, ctx: &HandlerContext) -> ExecutionResult {
        let project = match self.scope.resolve() {
            Ok(scope) => scope.url,
            Err(rejection) => return ExecutionResult::failed(rejection.message()),
        };

        let item_id = match ctx
            .client()
            .add_project_item(&project, ctx.repository(), &self.content)
            .await
        {
            Ok(item_id) => item_id,
            Err(err) => {
                return ExecutionResult::failed(format!(
                    "Failed to add item to project {project}: {err}"
                ));
            }
        };
        info!(project = %project, item = %item_id, "project item written");

        let mut result = ExecutionResult::ok().with_url(project.to_string());
        if let ProjectContent::Issue { number } | ProjectContent::PullRequest { number } =
            &self.content
        {
            result.number = Some(*number);
        }

        for (field, value) in &self.fields {
            if let Err(err) = ctx
                .client()
                .update_project_item_field(&project, &item_id, field, value)
                .await
            {
                warn!(
                    project = %project,
                    field = %field,
                    error = %err,
                    "project field update failed"
                );
                result.warn(format!("Failed to set field `{field}` to \"{value}\": {err}"));
            }
        }

        for view in &self.views {
            if let Err(err) = ctx.client().ensure_project_view(&project, view).await {
                warn!(project = %project, view = %view.name, error = %err, "project view failed");
                result.warn(format!("Failed to create view `{}`: {err}", view.name));
            }
        }

        result.item_id = Some(item_id);
        result
    }
}

/// Posts a status update on a project board.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProjectStatusUpdateHandler;

#[async_trait]
impl ActionHandler for ProjectStatusUpdateHandler {
    fn action(&self) -> ActionType {
        ActionType::CreateProjectStatusUpdate
    }

    async fn validate(
        &self,
        request: &SafeOutputRequest,
        ctx: &HandlerContext,
    ) -> HandlerResult<Box<dyn ValidatedAction>> {
        let ActionPayload::CreateProjectStatusUpdate(payload) = request.payload() else {
            return Err(payload_mismatch(self.action(), request));
        };
        let config = enabled(ctx.store().create_project_status_update(), self.action())?;

        let body = require_text("body", payload.body.as_deref())?;
        let status = require_status(payload.status.as_deref())?;
        let start_date = optional_date("start_date", payload.start_date.as_deref())?;
        let target_date = optional_date("target_date", payload.target_date.as_deref())?;
        if let (Some(start), Some(target)) = (&start_date, &target_date) {
            if target < start {
                return Err(Rejection::validation(format!(
                    "`target_date` {target} is before `start_date` {start}"
                ))
                .into());
            }
        }

        Ok(Box::new(CreateStatusUpdate {
            scope: PendingScope::new(payload.project.as_deref(), config.project.as_ref()),
            update: NewStatusUpdate {
                status,
                body: sanitize_body(body),
                start_date,
                target_date,
            },
        }))
    }
}

#[derive(Debug)]
struct CreateStatusUpdate {
    scope: PendingScope,
    update: NewStatusUpdate,
}

#[async_trait]
impl ValidatedAction for CreateStatusUpdate {
    fn resolve_scope(&mut self) -> PolicyResult<Option<ProjectScope>> {
        self.scope.resolve().map(Some)
    }

    fn preview(&self) -> ExecutionResult {
        let mut result = ExecutionResult::staged();
        result.url = self.scope.resolved.as_ref().map(|scope| scope.url.to_string());
        result
    }

    async fn execute(mut self: Box<Self>, ctx: &HandlerContext) -> ExecutionResult {
        let project = match self.scope.resolve() {
            Ok(scope) => scope.url,
            Err(rejection) => return ExecutionResult::failed(rejection.message()),
        };

        match ctx
            .client()
            .create_project_status_update(&project, &self.update)
            .await
        {
            Ok(id) => {
                info!(project = %project, status = %self.update.status, "project status posted");
                ExecutionResult {
                    status_update_id: Some(id),
                    ..ExecutionResult::ok().with_url(project.to_string())
                }
            }
            Err(err) => ExecutionResult::failed(format!(
                "Failed to post status update to project {project}: {err}"
            )),
        }
    }
}
