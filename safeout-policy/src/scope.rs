//! Project scope resolution for project-scoped action types.

use safeout_primitives::ProjectUrl;
use serde::Serialize;
use tracing::debug;

use crate::{PolicyResult, Rejection};

/// Where the effective project came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeSource {
    /// The request named the project.
    Request,
    /// The configured default project.
    Default,
}

/// The project a request will act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectScope {
    /// Effective project board.
    pub url: ProjectUrl,
    /// How it was chosen.
    pub source: ScopeSource,
}

/// Picks the project for a request.
///
/// A non-blank `requested` URL always wins, even when it differs from the
/// configured default. Otherwise the default applies.
///
/// # Errors
///
/// Rejects a malformed requested URL, or the absence of both values.
pub fn resolve_project_scope(
    requested: Option<&str>,
    default: Option<&ProjectUrl>,
) -> PolicyResult<ProjectScope> {
    if let Some(raw) = requested.map(str::trim).filter(|raw| !raw.is_empty()) {
        let url = ProjectUrl::parse(raw).map_err(|err| {
            Rejection::validation(format!("Invalid `project` URL: {err}"))
        })?;
        if default.is_some_and(|d| *d != url) {
            debug!(requested = %url, "request overrides configured project");
        }
        return Ok(ProjectScope {
            url,
            source: ScopeSource::Request,
        });
    }

    default
        .map(|url| ProjectScope {
            url: url.clone(),
            source: ScopeSource::Default,
        })
        .ok_or_else(|| {
            Rejection::validation(
                "No project specified: set `project` in the request or configure a default project",
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RejectionKind;

    const DEFAULT: &str = "https://github.com/orgs/ORG/projects/1";
    const OTHER: &str = "https://github.com/orgs/ORG/projects/99";

    #[test]
    fn default_applies_when_request_omits_project() {
        let default = ProjectUrl::parse(DEFAULT).unwrap();
        for requested in [None, Some(""), Some("   ")] {
            let scope = resolve_project_scope(requested, Some(&default)).unwrap();
            assert_eq!(scope.source, ScopeSource::Default);
            assert_eq!(scope.url.number(), 1);
        }
    }

    #[test]
    fn request_overrides_default() {
        let default = ProjectUrl::parse(DEFAULT).unwrap();
        let scope = resolve_project_scope(Some(OTHER), Some(&default)).unwrap();
        assert_eq!(scope.source, ScopeSource::Request);
        assert_eq!(scope.url.number(), 99);
        assert_eq!(scope.url.as_str(), OTHER);
    }

    #[test]
    fn request_without_default_is_used() {
        let scope = resolve_project_scope(Some(OTHER), None).unwrap();
        assert_eq!(scope.source, ScopeSource::Request);
    }

    #[test]
    fn missing_scope_is_a_validation_error() {
        let err = resolve_project_scope(None, None).unwrap_err();
        assert_eq!(err.kind(), RejectionKind::Validation);
        assert!(err.message().contains("No project specified"));
    }

    #[test]
    fn malformed_request_url_is_rejected() {
        let default = ProjectUrl::parse(DEFAULT).unwrap();
        let err = resolve_project_scope(Some("not a url"), Some(&default)).unwrap_err();
        assert_eq!(err.kind(), RejectionKind::Validation);
        assert!(err.message().contains("Invalid `project` URL"));
    }
}
