//! Strongly typed configuration schemas.
//!
//! Each action type has its own struct so required and optional keys stay
//! explicit. Keys are `kebab-case`; the loader also accepts `snake_case`.

use chrono::{DateTime, TimeDelta, Utc};
use safeout_primitives::ProjectUrl;
use serde::Deserialize;

/// Root configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SafeOutputsConfig {
    /// Token reference used when a type does not declare its own.
    #[serde(default)]
    pub github_token: Option<String>,
    /// Preview mode: validate and log, but never call the external system.
    #[serde(default)]
    pub staged: bool,
    /// Message templates shared by all handlers.
    #[serde(default)]
    pub messages: MessageTemplates,
    /// `create-issue` policy.
    #[serde(default)]
    pub create_issue: Option<CreateIssueConfig>,
    /// `add-comment` policy.
    #[serde(default)]
    pub add_comment: Option<AddCommentConfig>,
    /// `add-labels` policy.
    #[serde(default)]
    pub add_labels: Option<LabelsConfig>,
    /// `remove-labels` policy.
    #[serde(default)]
    pub remove_labels: Option<LabelsConfig>,
    /// `close-pull-request` policy.
    #[serde(default)]
    pub close_pull_request: Option<ClosePullRequestConfig>,
    /// `create-pull-request` policy.
    #[serde(default)]
    pub create_pull_request: Option<CreatePullRequestConfig>,
    /// `update-project` policy.
    #[serde(default)]
    pub update_project: Option<UpdateProjectConfig>,
    /// `create-project-status-update` policy.
    #[serde(default)]
    pub create_project_status_update: Option<ProjectStatusUpdateConfig>,
}

/// Templates rendered into bodies and run summaries.
///
/// Placeholders use `{{name}}` syntax; see the handlers crate for the
/// variables available at render time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MessageTemplates {
    /// Appended to every created issue, pull request and comment body.
    #[serde(default)]
    pub footer: Option<String>,
    /// Status line used when the run starts.
    #[serde(default)]
    pub run_started: Option<String>,
    /// Status line used when the run succeeds.
    #[serde(default)]
    pub run_success: Option<String>,
    /// Status line used when the run fails.
    #[serde(default)]
    pub run_failure: Option<String>,
}

/// Policy for `create-issue`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CreateIssueConfig {
    /// Invocation ceiling for the run.
    #[serde(default)]
    pub max: Option<u32>,
    /// Prefix prepended to every created title.
    #[serde(default)]
    pub title_prefix: Option<String>,
    /// Labels always applied to created issues.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Allow-list for labels proposed by the agent.
    #[serde(default)]
    pub allowed: Option<Vec<String>>,
    /// Lifetime after which the issue is considered expired.
    #[serde(default, alias = "expire")]
    pub expires: Option<Expiry>,
    /// Group created issues under one parent issue per workflow.
    #[serde(default)]
    pub group: bool,
    /// Close earlier issues opened by this workflow.
    #[serde(default)]
    pub close_older_issues: bool,
    /// Per-type credential reference.
    #[serde(default)]
    pub github_token: Option<String>,
}

/// Policy for `add-comment`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AddCommentConfig {
    /// Invocation ceiling for the run.
    #[serde(default)]
    pub max: Option<u32>,
    /// Which items the agent may comment on.
    #[serde(default)]
    pub target: Target,
    /// Minimise earlier comments left by this workflow on the same item.
    #[serde(default)]
    pub hide_older_comments: bool,
    /// Per-type credential reference.
    #[serde(default)]
    pub github_token: Option<String>,
}

/// Policy shared by `add-labels` and `remove-labels`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LabelsConfig {
    /// Invocation ceiling for the run.
    #[serde(default)]
    pub max: Option<u32>,
    /// Labels the agent may touch. `None` allows any label.
    #[serde(default, alias = "allowed-labels")]
    pub allowed: Option<Vec<String>>,
    /// Which items the agent may label.
    #[serde(default)]
    pub target: Target,
    /// Per-type credential reference.
    #[serde(default)]
    pub github_token: Option<String>,
}

/// Policy for `close-pull-request`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClosePullRequestConfig {
    /// Invocation ceiling for the run.
    #[serde(default)]
    pub max: Option<u32>,
    /// The pull request must carry at least one of these labels.
    #[serde(default)]
    pub required_labels: Option<Vec<String>>,
    /// The pull request title must start with this prefix.
    #[serde(default)]
    pub required_title_prefix: Option<String>,
    /// Fallback comment used when the agent supplies a blank body.
    #[serde(default, alias = "default-comment")]
    pub comment: Option<String>,
    /// Per-type credential reference.
    #[serde(default)]
    pub github_token: Option<String>,
}

/// Policy for `create-pull-request`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CreatePullRequestConfig {
    /// Invocation ceiling for the run.
    #[serde(default)]
    pub max: Option<u32>,
    /// Prefix prepended to every created title.
    #[serde(default)]
    pub title_prefix: Option<String>,
    /// Labels always applied to created pull requests.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Open pull requests as drafts.
    #[serde(default = "default_true")]
    pub draft: bool,
    /// Base branch used when the request does not name one.
    #[serde(default)]
    pub base: Option<String>,
    /// Per-type credential reference.
    #[serde(default)]
    pub github_token: Option<String>,
}

impl Default for CreatePullRequestConfig {
    fn default() -> Self {
        Self {
            max: None,
            title_prefix: None,
            labels: Vec::new(),
            draft: true,
            base: None,
            github_token: None,
        }
    }
}

/// Policy for `update-project`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdateProjectConfig {
    /// Invocation ceiling for the run.
    #[serde(default)]
    pub max: Option<u32>,
    /// Project used when the request does not name one.
    #[serde(default)]
    pub project: Option<ProjectUrl>,
    /// Views ensured on the project after an item is written.
    #[serde(default)]
    pub views: Vec<ProjectView>,
    /// Per-type credential reference.
    #[serde(default)]
    pub github_token: Option<String>,
}

/// Policy for `create-project-status-update`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectStatusUpdateConfig {
    /// Invocation ceiling for the run.
    #[serde(default)]
    pub max: Option<u32>,
    /// Project used when the request does not name one.
    #[serde(default)]
    pub project: Option<ProjectUrl>,
    /// Per-type credential reference.
    #[serde(default)]
    pub github_token: Option<String>,
}

/// A view declared on a project board.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectView {
    /// View name.
    pub name: String,
    /// Layout of the view.
    #[serde(default)]
    pub layout: ViewLayout,
    /// Optional filter query.
    #[serde(default)]
    pub filter: Option<String>,
}

/// Project view layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewLayout {
    /// Spreadsheet layout.
    #[default]
    Table,
    /// Kanban board layout.
    Board,
    /// Timeline layout.
    Roadmap,
}

/// Which issue or pull request a comment/label request may address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawTarget")]
pub enum Target {
    /// Only the item that triggered the run.
    #[default]
    Triggering,
    /// Any item the agent names (falling back to the triggering item).
    Any,
    /// Always this item number.
    Fixed(u64),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTarget {
    Number(u64),
    Text(String),
}

impl TryFrom<RawTarget> for Target {
    type Error = String;

    fn try_from(value: RawTarget) -> Result<Self, Self::Error> {
        match value {
            RawTarget::Number(number) => Ok(Self::Fixed(number)),
            RawTarget::Text(text) => match text.trim() {
                "triggering" => Ok(Self::Triggering),
                "*" => Ok(Self::Any),
                other => other.parse::<u64>().map(Self::Fixed).map_err(|_| {
                    format!("target must be `triggering`, `*`, or an item number, got `{other}`")
                }),
            },
        }
    }
}

/// Lifetime of created issues (`expires`).
///
/// Accepts an integer number of days or a string such as `"7d"`, `"12h"`,
/// or `"2w"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawExpiry")]
pub struct Expiry(TimeDelta);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawExpiry {
    Days(i64),
    Text(String),
}

impl Expiry {
    /// Creates an expiry of the supplied number of days.
    #[must_use]
    pub fn days(days: i64) -> Self {
        Self(TimeDelta::days(days))
    }

    /// Returns the configured lifetime.
    #[must_use]
    pub fn as_delta(self) -> TimeDelta {
        self.0
    }

    /// Computes the expiry instant relative to `now`.
    #[must_use]
    pub fn expires_at(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.0
    }
}

impl TryFrom<RawExpiry> for Expiry {
    type Error = String;

    fn try_from(value: RawExpiry) -> Result<Self, Self::Error> {
        let delta = match value {
            RawExpiry::Days(days) => TimeDelta::try_days(days),
            RawExpiry::Text(text) => {
                let text = text.trim();
                let Some(unit) = text.chars().last() else {
                    return Err("expires must not be empty".to_owned());
                };
                let amount: i64 = text[..text.len() - unit.len_utf8()]
                    .parse()
                    .map_err(|_| format!("invalid expires value `{text}`"))?;
                match unit {
                    'h' => TimeDelta::try_hours(amount),
                    'd' => TimeDelta::try_days(amount),
                    'w' => TimeDelta::try_weeks(amount),
                    _ => return Err(format!("invalid expires unit in `{text}`; use h, d, or w")),
                }
            }
        };

        match delta {
            Some(delta) if delta > TimeDelta::zero() => Ok(Self(delta)),
            _ => Err("expires must be a positive duration".to_owned()),
        }
    }
}

fn default_true() -> bool {
    true
}
