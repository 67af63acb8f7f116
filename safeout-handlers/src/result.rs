//! Structured outcome returned to the agent.

use serde::{Deserialize, Serialize};

/// Result of one safe output request.
///
/// Serialized with camelCase keys; absent identifiers and flags are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Whether the primary effect happened (or was admitted, in staged mode).
    pub success: bool,
    /// Rejection message or primary failure text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Issue or pull request number acted on or created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    /// Browser URL of the created or updated resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Id of the posted comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<u64>,
    /// Project item id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    /// Project status update id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_update_id: Option<String>,
    /// Labels on the item after the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    /// Whether the explanatory comment was posted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_posted: Option<bool>,
    /// Whether the pull request was closed before this request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub already_closed: Option<bool>,
    /// Set when the run is a preview and nothing was written.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub staged: bool,
    /// Secondary effects that failed without failing the request.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ExecutionResult {
    /// Successful result with no identifiers yet.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    /// Failed result carrying `error` verbatim.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Preview result for staged runs.
    #[must_use]
    pub fn staged() -> Self {
        Self {
            success: true,
            staged: true,
            ..Self::default()
        }
    }

    /// Sets the item number.
    #[must_use]
    pub fn with_number(mut self, number: u64) -> Self {
        self.number = Some(number);
        self
    }

    /// Sets the URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Records a failed secondary effect.
    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}
