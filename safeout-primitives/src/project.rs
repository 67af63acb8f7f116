//! GitHub project board URLs.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// Whether a project belongs to an organisation or a user.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectOwnerKind {
    /// `https://github.com/orgs/<org>/projects/<n>`
    Organization,
    /// `https://github.com/users/<user>/projects/<n>`
    User,
}

/// A validated project board URL.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectUrl {
    raw: String,
    owner_kind: ProjectOwnerKind,
    owner: String,
    number: u64,
}

impl ProjectUrl {
    /// Parses and validates a project URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidProjectUrl`] when the URL is not an `http(s)`
    /// URL of the form `/{orgs|users}/<owner>/projects/<number>`.
    pub fn parse(raw: &str) -> crate::Result<Self> {
        let invalid = |reason: &str| Error::InvalidProjectUrl {
            url: raw.to_owned(),
            reason: reason.to_owned(),
        };

        let url = Url::parse(raw.trim()).map_err(|err| invalid(&err.to_string()))?;
        if !matches!(url.scheme(), "https" | "http") {
            return Err(invalid("scheme must be http or https"));
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        let [kind, owner, projects, number, ..] = segments.as_slice() else {
            return Err(invalid("expected /orgs/<owner>/projects/<number>"));
        };

        let owner_kind = match *kind {
            "orgs" => ProjectOwnerKind::Organization,
            "users" => ProjectOwnerKind::User,
            _ => return Err(invalid("owner segment must be `orgs` or `users`")),
        };
        if *projects != "projects" {
            return Err(invalid("expected /orgs/<owner>/projects/<number>"));
        }
        let number = number
            .parse::<u64>()
            .map_err(|_| invalid("project number must be a positive integer"))?;

        Ok(Self {
            raw: raw.trim().to_owned(),
            owner_kind,
            owner: (*owner).to_owned(),
            number,
        })
    }

    /// Returns the URL as supplied.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns whether the project is organisation or user owned.
    #[must_use]
    pub fn owner_kind(&self) -> ProjectOwnerKind {
        self.owner_kind
    }

    /// Returns the owning organisation or user login.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the project number.
    #[must_use]
    pub fn number(&self) -> u64 {
        self.number
    }
}

impl Display for ProjectUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for ProjectUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProjectUrl {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProjectUrl> for String {
    fn from(value: ProjectUrl) -> Self {
        value.raw
    }
}
