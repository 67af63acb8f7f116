//! Ambient facts about the workflow run hosting the agent.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, RunId};

const DEFAULT_SERVER_URL: &str = "https://github.com";

/// Repository coordinates (`owner/name`).
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    owner: String,
    name: String,
}

impl Repository {
    /// Creates repository coordinates from owner and name.
    #[must_use]
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Returns the owning user or organisation.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the repository name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for Repository {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for Repository {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name))
                if !owner.trim().is_empty() && !name.trim().is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(owner.trim(), name.trim()))
            }
            _ => Err(Error::InvalidRepository { slug: s.to_owned() }),
        }
    }
}

/// Kind of entity that triggered the run.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// An issue (or a comment on one).
    Issue,
    /// A pull request (or a comment/review on one).
    PullRequest,
}

/// The issue or pull request that triggered the run.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct TriggerTarget {
    /// Issue or pull request number.
    pub number: u64,
    /// Whether the trigger was an issue or a pull request.
    pub kind: EntityKind,
}

impl TriggerTarget {
    /// Trigger pointing at an issue.
    #[must_use]
    pub const fn issue(number: u64) -> Self {
        Self {
            number,
            kind: EntityKind::Issue,
        }
    }

    /// Trigger pointing at a pull request.
    #[must_use]
    pub const fn pull_request(number: u64) -> Self {
        Self {
            number,
            kind: EntityKind::PullRequest,
        }
    }
}

/// Run-scoped context used to resolve implicit targets and render links.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    repository: Repository,
    run_id: RunId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    workflow_name: Option<String>,
    server_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trigger: Option<TriggerTarget>,
}

impl RunContext {
    /// Creates a context for the given repository and run.
    #[must_use]
    pub fn new(repository: Repository, run_id: RunId) -> Self {
        Self {
            repository,
            run_id,
            workflow_name: None,
            server_url: DEFAULT_SERVER_URL.to_owned(),
            trigger: None,
        }
    }

    /// Records the issue or pull request that triggered the run.
    #[must_use]
    pub fn with_trigger(mut self, trigger: TriggerTarget) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Sets the human-readable workflow name.
    #[must_use]
    pub fn with_workflow_name(mut self, name: impl Into<String>) -> Self {
        self.workflow_name = Some(name.into());
        self
    }

    /// Overrides the server URL (GitHub Enterprise installations).
    #[must_use]
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Returns the repository coordinates.
    #[must_use]
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Returns the run identifier.
    #[must_use]
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Returns the workflow name, if known.
    #[must_use]
    pub fn workflow_name(&self) -> Option<&str> {
        self.workflow_name.as_deref()
    }

    /// Returns the triggering entity, if any.
    #[must_use]
    pub fn trigger(&self) -> Option<TriggerTarget> {
        self.trigger
    }

    /// Returns the triggering issue or pull request number.
    #[must_use]
    pub fn triggering_number(&self) -> Option<u64> {
        self.trigger.map(|trigger| trigger.number)
    }

    /// Returns the triggering pull request number, ignoring issue triggers.
    #[must_use]
    pub fn triggering_pull_request(&self) -> Option<u64> {
        self.trigger
            .filter(|trigger| trigger.kind == EntityKind::PullRequest)
            .map(|trigger| trigger.number)
    }

    /// Link to the run's page, used in footers.
    #[must_use]
    pub fn run_url(&self) -> String {
        format!(
            "{}/{}/actions/runs/{}",
            self.server_url, self.repository, self.run_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repository_slug() {
        let repo: Repository = "octo/widgets".parse().unwrap();
        assert_eq!(repo.owner(), "octo");
        assert_eq!(repo.name(), "widgets");
        assert!("octo".parse::<Repository>().is_err());
        assert!("octo/widgets/extra".parse::<Repository>().is_err());
    }

    #[test]
    fn pull_request_trigger_is_distinguished() {
        let base = RunContext::new(Repository::new("octo", "widgets"), RunId::new("42"));
        let issue = base.clone().with_trigger(TriggerTarget::issue(7));
        assert_eq!(issue.triggering_number(), Some(7));
        assert_eq!(issue.triggering_pull_request(), None);

        let pr = base.with_trigger(TriggerTarget::pull_request(9));
        assert_eq!(pr.triggering_pull_request(), Some(9));
    }

    #[test]
    fn run_url_uses_server_and_run() {
        let ctx = RunContext::new(Repository::new("octo", "widgets"), RunId::new("42"))
            .with_server_url("https://ghe.example.com/");
        assert_eq!(
            ctx.run_url(),
            "https://ghe.example.com/octo/widgets/actions/runs/42"
        );
    }
}
