//! Immutable, process-wide policy store.

use std::sync::Arc;

use safeout_primitives::ActionType;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{
    AddCommentConfig, ClosePullRequestConfig, CreateIssueConfig, CreatePullRequestConfig,
    LabelsConfig, MessageTemplates, ProjectStatusUpdateConfig, SafeOutputsConfig,
    UpdateProjectConfig,
};

/// Read-only view over the validated configuration.
///
/// Cloning is cheap; every clone shares the same document.
#[derive(Debug, Clone)]
pub struct PolicyStore {
    config: Arc<SafeOutputsConfig>,
}

/// Fields every per-type section carries.
struct Section<'a> {
    max: Option<u32>,
    token: Option<&'a str>,
}

impl PolicyStore {
    /// Validates a configuration document and freezes it.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a declared requirement is missing: a
    /// project-scoped type without a token, a `max` of zero, or an empty
    /// label list.
    pub fn from_config(config: SafeOutputsConfig) -> ConfigResult<Self> {
        let store = Self {
            config: Arc::new(config),
        };
        store.validate()?;
        debug!(
            enabled = ?store.enabled_types(),
            staged = store.staged(),
            "safe output policy loaded"
        );
        Ok(store)
    }

    fn validate(&self) -> ConfigResult<()> {
        for action in self.enabled_types() {
            let Some(section) = self.section(action) else {
                continue;
            };

            if section.max == Some(0) {
                return Err(ConfigError::InvalidMax { action });
            }

            if action.is_project_scoped() && self.token_for(action).is_none() {
                return Err(ConfigError::MissingToken { action });
            }
        }

        let label_lists = [
            (
                ActionType::CreateIssue,
                "allowed",
                self.create_issue().and_then(|c| c.allowed.as_ref()),
            ),
            (
                ActionType::AddLabels,
                "allowed",
                self.add_labels().and_then(|c| c.allowed.as_ref()),
            ),
            (
                ActionType::RemoveLabels,
                "allowed",
                self.remove_labels().and_then(|c| c.allowed.as_ref()),
            ),
            (
                ActionType::ClosePullRequest,
                "required-labels",
                self.close_pull_request()
                    .and_then(|c| c.required_labels.as_ref()),
            ),
        ];
        for (action, field, list) in label_lists {
            if list.is_some_and(|labels| labels.iter().all(|l| l.trim().is_empty())) {
                return Err(ConfigError::EmptyLabelList { action, field });
            }
        }

        Ok(())
    }

    fn section(&self, action: ActionType) -> Option<Section<'_>> {
        let c = &self.config;
        let (max, token) = match action {
            ActionType::CreateIssue => c.create_issue.as_ref().map(|s| (s.max, &s.github_token)),
            ActionType::AddComment => c.add_comment.as_ref().map(|s| (s.max, &s.github_token)),
            ActionType::AddLabels => c.add_labels.as_ref().map(|s| (s.max, &s.github_token)),
            ActionType::RemoveLabels => c.remove_labels.as_ref().map(|s| (s.max, &s.github_token)),
            ActionType::ClosePullRequest => c
                .close_pull_request
                .as_ref()
                .map(|s| (s.max, &s.github_token)),
            ActionType::CreatePullRequest => c
                .create_pull_request
                .as_ref()
                .map(|s| (s.max, &s.github_token)),
            ActionType::UpdateProject => {
                c.update_project.as_ref().map(|s| (s.max, &s.github_token))
            }
            ActionType::CreateProjectStatusUpdate => c
                .create_project_status_update
                .as_ref()
                .map(|s| (s.max, &s.github_token)),
        }?;

        Some(Section {
            max,
            token: token.as_deref().filter(|t| !t.trim().is_empty()),
        })
    }

    /// Returns `true` when the configuration declares the action type.
    #[must_use]
    pub fn is_enabled(&self, action: ActionType) -> bool {
        self.section(action).is_some()
    }

    /// Returns every declared action type in canonical order.
    #[must_use]
    pub fn enabled_types(&self) -> Vec<ActionType> {
        ActionType::ALL
            .into_iter()
            .filter(|action| self.is_enabled(*action))
            .collect()
    }

    /// Effective invocation ceiling, or `None` when the type is disabled.
    #[must_use]
    pub fn max(&self, action: ActionType) -> Option<u32> {
        self.section(action)
            .map(|section| section.max.unwrap_or_else(|| action.default_max()))
    }

    /// Credential reference for the type, falling back to the top-level token.
    #[must_use]
    pub fn token_for(&self, action: ActionType) -> Option<&str> {
        let section = self.section(action)?;
        section.token.or_else(|| {
            self.config
                .github_token
                .as_deref()
                .filter(|t| !t.trim().is_empty())
        })
    }

    /// Returns `true` when the run is in preview mode.
    #[must_use]
    pub fn staged(&self) -> bool {
        self.config.staged
    }

    /// Returns the shared message templates.
    #[must_use]
    pub fn messages(&self) -> &MessageTemplates {
        &self.config.messages
    }

    /// `create-issue` policy, if enabled.
    #[must_use]
    pub fn create_issue(&self) -> Option<&CreateIssueConfig> {
        self.config.create_issue.as_ref()
    }

    /// `add-comment` policy, if enabled.
    #[must_use]
    pub fn add_comment(&self) -> Option<&AddCommentConfig> {
        self.config.add_comment.as_ref()
    }

    /// `add-labels` policy, if enabled.
    #[must_use]
    pub fn add_labels(&self) -> Option<&LabelsConfig> {
        self.config.add_labels.as_ref()
    }

    /// `remove-labels` policy, if enabled.
    #[must_use]
    pub fn remove_labels(&self) -> Option<&LabelsConfig> {
        self.config.remove_labels.as_ref()
    }

    /// `close-pull-request` policy, if enabled.
    #[must_use]
    pub fn close_pull_request(&self) -> Option<&ClosePullRequestConfig> {
        self.config.close_pull_request.as_ref()
    }

    /// `create-pull-request` policy, if enabled.
    #[must_use]
    pub fn create_pull_request(&self) -> Option<&CreatePullRequestConfig> {
        self.config.create_pull_request.as_ref()
    }

    /// `update-project` policy, if enabled.
    #[must_use]
    pub fn update_project(&self) -> Option<&UpdateProjectConfig> {
        self.config.update_project.as_ref()
    }

    /// `create-project-status-update` policy, if enabled.
    #[must_use]
    pub fn create_project_status_update(&self) -> Option<&ProjectStatusUpdateConfig> {
        self.config.create_project_status_update.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_from_str;

    #[test]
    fn defaults_apply_when_max_omitted() {
        let store = load_from_str(r#"{"add-labels": {}, "create-issue": {"max": 4}}"#).unwrap();
        assert_eq!(store.max(ActionType::AddLabels), Some(3));
        assert_eq!(store.max(ActionType::CreateIssue), Some(4));
        assert_eq!(store.max(ActionType::AddComment), None);
        assert_eq!(
            store.enabled_types(),
            vec![ActionType::CreateIssue, ActionType::AddLabels]
        );
    }

    #[test]
    fn project_types_require_a_token() {
        let err = load_from_str(
            r#"{"update-project": {"project": "https://github.com/orgs/ORG/projects/1"}}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingToken {
                action: ActionType::UpdateProject
            }
        ));

        let err = load_from_str(
            r#"{"github-token": "  ", "create-project-status-update": {}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken { .. }));
    }

    #[test]
    fn top_level_token_satisfies_project_types() {
        let store = load_from_str(
            r#"{"github-token": "${{ secrets.PROJECTS }}", "update-project": {}}"#,
        )
        .unwrap();
        assert_eq!(
            store.token_for(ActionType::UpdateProject),
            Some("${{ secrets.PROJECTS }}")
        );
    }

    #[test]
    fn per_type_token_wins() {
        let store = load_from_str(
            r#"{"github-token": "top", "update-project": {"github-token": "scoped"}}"#,
        )
        .unwrap();
        assert_eq!(store.token_for(ActionType::UpdateProject), Some("scoped"));
    }

    #[test]
    fn zero_max_is_fatal() {
        let err = load_from_str(r#"{"add-comment": {"max": 0}}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidMax {
                action: ActionType::AddComment
            }
        ));
    }

    #[test]
    fn empty_label_lists_are_fatal() {
        let err = load_from_str(r#"{"add-labels": {"allowed": []}}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EmptyLabelList {
                action: ActionType::AddLabels,
                field: "allowed"
            }
        ));
    }
}
