//! Typed safe output requests.
//!
//! A [`SafeOutputRequest`] is created once per tool call by the normalizer and
//! never mutated afterwards. Payload fields are optional at this level; the
//! structural validator decides which are required for each type.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{ActionType, RequestId, RunId, TriggerTarget};

/// A normalized, typed proposal from the agent.
#[derive(Debug, Clone, Serialize)]
pub struct SafeOutputRequest {
    id: RequestId,
    #[serde(flatten)]
    payload: ActionPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<ResolvedTarget>,
    provenance: Provenance,
}

impl SafeOutputRequest {
    /// Assembles a request. Called by the normalizer.
    #[must_use]
    pub fn new(
        payload: ActionPayload,
        target: Option<ResolvedTarget>,
        provenance: Provenance,
    ) -> Self {
        Self {
            id: RequestId::random(),
            payload,
            target,
            provenance,
        }
    }

    /// Returns the request identifier.
    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Returns the action discriminant.
    #[must_use]
    pub fn action(&self) -> ActionType {
        self.payload.action()
    }

    /// Returns the type-specific payload.
    #[must_use]
    pub fn payload(&self) -> &ActionPayload {
        &self.payload
    }

    /// Returns the issue or pull request the request addresses, if any.
    #[must_use]
    pub fn target(&self) -> Option<ResolvedTarget> {
        self.target
    }

    /// Returns where the request came from.
    #[must_use]
    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }
}

/// Run facts captured at normalization time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    /// Run that produced the request.
    pub run_id: RunId,
    /// Item that triggered the run, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<TriggerTarget>,
}

/// How a request's target number was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSource {
    /// The agent named the item explicitly.
    Explicit,
    /// Filled in from the item that triggered the run.
    Triggering,
}

/// Issue or pull request number a request acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedTarget {
    /// Issue or pull request number.
    pub number: u64,
    /// Where the number came from.
    pub source: TargetSource,
}

impl ResolvedTarget {
    /// Target named explicitly by the agent.
    #[must_use]
    pub const fn explicit(number: u64) -> Self {
        Self {
            number,
            source: TargetSource::Explicit,
        }
    }

    /// Target inherited from the triggering item.
    #[must_use]
    pub const fn triggering(number: u64) -> Self {
        Self {
            number,
            source: TargetSource::Triggering,
        }
    }
}

/// Type-specific payload, discriminated by `type`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ActionPayload {
    /// `create-issue`
    CreateIssue(CreateIssueRequest),
    /// `add-comment`
    AddComment(AddCommentRequest),
    /// `add-labels`
    AddLabels(LabelsRequest),
    /// `remove-labels`
    RemoveLabels(LabelsRequest),
    /// `close-pull-request`
    ClosePullRequest(ClosePullRequestRequest),
    /// `create-pull-request`
    CreatePullRequest(CreatePullRequestRequest),
    /// `update-project`
    UpdateProject(UpdateProjectRequest),
    /// `create-project-status-update`
    CreateProjectStatusUpdate(ProjectStatusUpdateRequest),
}

impl ActionPayload {
    /// Returns the discriminant of the payload.
    #[must_use]
    pub fn action(&self) -> ActionType {
        match self {
            Self::CreateIssue(_) => ActionType::CreateIssue,
            Self::AddComment(_) => ActionType::AddComment,
            Self::AddLabels(_) => ActionType::AddLabels,
            Self::RemoveLabels(_) => ActionType::RemoveLabels,
            Self::ClosePullRequest(_) => ActionType::ClosePullRequest,
            Self::CreatePullRequest(_) => ActionType::CreatePullRequest,
            Self::UpdateProject(_) => ActionType::UpdateProject,
            Self::CreateProjectStatusUpdate(_) => ActionType::CreateProjectStatusUpdate,
        }
    }

    /// Number the agent named explicitly, for types that address an item.
    #[must_use]
    pub fn explicit_item_number(&self) -> Option<u64> {
        match self {
            Self::AddComment(req) => req.item_number,
            Self::AddLabels(req) | Self::RemoveLabels(req) => req.item_number,
            Self::ClosePullRequest(req) => req.pull_request_number,
            _ => None,
        }
    }
}

/// `create-issue` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateIssueRequest {
    /// Issue title.
    #[serde(default)]
    pub title: Option<String>,
    /// Issue body (markdown).
    #[serde(default)]
    pub body: Option<String>,
    /// Labels proposed by the agent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// `add-comment` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddCommentRequest {
    /// Comment body (markdown).
    #[serde(default)]
    pub body: Option<String>,
    /// Issue or pull request number; defaults to the triggering item.
    #[serde(
        default,
        alias = "issue_number",
        alias = "pull_request_number",
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub item_number: Option<u64>,
}

/// `add-labels` / `remove-labels` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelsRequest {
    /// Labels to add or remove.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Issue or pull request number; defaults to the triggering item.
    #[serde(
        default,
        alias = "issue_number",
        alias = "pull_request_number",
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub item_number: Option<u64>,
}

/// `close-pull-request` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClosePullRequestRequest {
    /// Explanatory comment posted on the pull request.
    #[serde(default)]
    pub body: Option<String>,
    /// Pull request number; defaults to the triggering pull request.
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub pull_request_number: Option<u64>,
}

/// `create-pull-request` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePullRequestRequest {
    /// Pull request title.
    #[serde(default)]
    pub title: Option<String>,
    /// Pull request body (markdown).
    #[serde(default)]
    pub body: Option<String>,
    /// Already pushed branch holding the changes.
    #[serde(default, alias = "branch")]
    pub head: Option<String>,
    /// Base branch; defaults to the configured base.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// Labels proposed by the agent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// Kind of content an `update-project` request writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// A draft item that exists only on the board.
    DraftIssue,
    /// An existing issue.
    Issue,
    /// An existing pull request.
    PullRequest,
}

/// `update-project` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectRequest {
    /// Project URL overriding the configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// What kind of item to write.
    #[serde(default)]
    pub content_type: Option<ContentType>,
    /// Issue or pull request number for non-draft content.
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_number: Option<u64>,
    /// Draft item title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_title: Option<String>,
    /// Draft item body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_body: Option<String>,
    /// Custom field values keyed by field name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

/// `create-project-status-update` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectStatusUpdateRequest {
    /// Project URL overriding the configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Update body (markdown).
    #[serde(default)]
    pub body: Option<String>,
    /// Status keyword, e.g. `ON_TRACK`.
    #[serde(default)]
    pub status: Option<String>,
    /// Optional start date (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Optional target date (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<String>,
}

/// Health of a project, as reported in a status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    /// On track.
    OnTrack,
    /// At risk.
    AtRisk,
    /// Off track.
    OffTrack,
    /// Complete.
    Complete,
    /// Inactive.
    Inactive,
}

impl ProjectStatus {
    /// Accepted spellings, for error messages.
    pub const KEYWORDS: [&'static str; 5] =
        ["ON_TRACK", "AT_RISK", "OFF_TRACK", "COMPLETE", "INACTIVE"];

    /// Returns the GraphQL enum spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnTrack => "ON_TRACK",
            Self::AtRisk => "AT_RISK",
            Self::OffTrack => "OFF_TRACK",
            Self::Complete => "COMPLETE",
            Self::Inactive => "INACTIVE",
        }
    }
}

impl Display for ProjectStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let canonical = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match canonical.as_str() {
            "ON_TRACK" => Ok(Self::OnTrack),
            "AT_RISK" => Ok(Self::AtRisk),
            "OFF_TRACK" => Ok(Self::OffTrack),
            "COMPLETE" => Ok(Self::Complete),
            "INACTIVE" => Ok(Self::Inactive),
            _ => Err(()),
        }
    }
}

/// Accepts numbers sent as JSON integers or strings such as `"42"` / `"#42"`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(number)) => Ok(Some(number)),
        Some(Raw::Text(text)) => {
            let text = text.trim().trim_start_matches('#');
            if text.is_empty() {
                return Ok(None);
            }
            text.parse()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("`{text}` is not an item number")))
        }
    }
}
