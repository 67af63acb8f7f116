//! The closed set of safe output action types.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Discriminant of a proposed action.
///
/// Tool calls spell types either `kebab-case` (`close-pull-request`) or
/// `snake_case` (`close_pull_request`); both parse to the same variant and the
/// canonical form is `kebab-case`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionType {
    /// Open a new issue in the repository.
    #[serde(alias = "create_issue")]
    CreateIssue,
    /// Comment on an issue or pull request.
    #[serde(alias = "add_comment")]
    AddComment,
    /// Add labels to an issue or pull request.
    #[serde(alias = "add_labels")]
    AddLabels,
    /// Remove labels from an issue or pull request.
    #[serde(alias = "remove_labels")]
    RemoveLabels,
    /// Close a pull request, posting an explanatory comment.
    #[serde(alias = "close_pull_request")]
    ClosePullRequest,
    /// Open a pull request from an already pushed branch.
    #[serde(alias = "create_pull_request")]
    CreatePullRequest,
    /// Create or update an item on a project board.
    #[serde(alias = "update_project")]
    UpdateProject,
    /// Post a status update on a project board.
    #[serde(alias = "create_project_status_update")]
    CreateProjectStatusUpdate,
}

impl ActionType {
    /// Every supported action type, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::CreateIssue,
        Self::AddComment,
        Self::AddLabels,
        Self::RemoveLabels,
        Self::ClosePullRequest,
        Self::CreatePullRequest,
        Self::UpdateProject,
        Self::CreateProjectStatusUpdate,
    ];

    /// Returns the canonical `kebab-case` name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateIssue => "create-issue",
            Self::AddComment => "add-comment",
            Self::AddLabels => "add-labels",
            Self::RemoveLabels => "remove-labels",
            Self::ClosePullRequest => "close-pull-request",
            Self::CreatePullRequest => "create-pull-request",
            Self::UpdateProject => "update-project",
            Self::CreateProjectStatusUpdate => "create-project-status-update",
        }
    }

    /// Invocation ceiling applied when the configuration omits `max`.
    #[must_use]
    pub const fn default_max(self) -> u32 {
        match self {
            Self::AddLabels | Self::RemoveLabels => 3,
            Self::UpdateProject => 10,
            Self::CreateIssue
            | Self::AddComment
            | Self::ClosePullRequest
            | Self::CreatePullRequest
            | Self::CreateProjectStatusUpdate => 1,
        }
    }

    /// Returns `true` for types that act on a project board.
    #[must_use]
    pub const fn is_project_scoped(self) -> bool {
        matches!(self, Self::UpdateProject | Self::CreateProjectStatusUpdate)
    }
}

impl Display for ActionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let canonical = s.trim().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == canonical)
            .ok_or_else(|| Error::UnknownActionType { name: s.to_owned() })
    }
}
