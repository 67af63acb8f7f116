//! Required-field checks shared by the per-type handlers.
//!
//! Every failure is a [`Rejection::Validation`] naming the offending field so
//! the agent can fix the call.

use chrono::NaiveDate;
use safeout_primitives::{ProjectStatus, ResolvedTarget};

use crate::{PolicyResult, Rejection};

/// Requires a present, non-blank string.
///
/// # Errors
///
/// Rejects when `value` is absent, empty, or whitespace only.
pub fn require_text<'a>(field: &str, value: Option<&'a str>) -> PolicyResult<&'a str> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        Some(_) => Err(Rejection::validation(format!(
            "`{field}` must not be empty or whitespace"
        ))),
        None => Err(Rejection::validation(format!(
            "Missing required field `{field}`"
        ))),
    }
}

/// Requires a resolvable issue or pull request target.
///
/// # Errors
///
/// Rejects when neither the request nor the run context supplied a number.
pub fn require_target(
    field: &str,
    target: Option<ResolvedTarget>,
) -> PolicyResult<ResolvedTarget> {
    target.ok_or_else(|| {
        Rejection::validation(format!(
            "No target found: provide `{field}` or run this workflow from a matching issue \
             or pull request"
        ))
    })
}

/// Picks the comment body, falling back to a configured default.
///
/// A blank or whitespace-only body is treated as absent.
///
/// # Errors
///
/// Rejects with "No comment body provided" when both are blank.
pub fn comment_body(body: Option<&str>, fallback: Option<&str>) -> PolicyResult<String> {
    let usable = |text: Option<&str>| text.filter(|t| !t.trim().is_empty()).map(str::to_owned);
    usable(body).or_else(|| usable(fallback)).ok_or_else(|| {
        Rejection::validation("No comment body provided: `body` must contain non-whitespace text")
    })
}

/// Trims labels, drops blanks, and removes duplicates keeping first occurrence.
#[must_use]
pub fn normalize_labels(labels: &[String]) -> Vec<String> {
    let mut seen = Vec::with_capacity(labels.len());
    for label in labels {
        let label = label.trim();
        if !label.is_empty() && !seen.iter().any(|existing: &String| existing == label) {
            seen.push(label.to_owned());
        }
    }
    seen
}

/// Requires at least one non-blank label.
///
/// # Errors
///
/// Rejects when no usable label remains after normalization.
pub fn require_labels(labels: &[String]) -> PolicyResult<Vec<String>> {
    let labels = normalize_labels(labels);
    if labels.is_empty() {
        return Err(Rejection::validation(
            "`labels` must contain at least one non-empty label",
        ));
    }
    Ok(labels)
}

/// Parses the status keyword of a project status update.
///
/// # Errors
///
/// Rejects when the status is missing or not a known keyword.
pub fn require_status(status: Option<&str>) -> PolicyResult<ProjectStatus> {
    let raw = require_text("status", status)?;
    raw.parse().map_err(|()| {
        Rejection::validation(format!(
            "Invalid `status` \"{raw}\": expected one of {}",
            ProjectStatus::KEYWORDS.join(", ")
        ))
    })
}

/// Parses an optional `YYYY-MM-DD` calendar date.
///
/// # Errors
///
/// Rejects a present value that is not a real date in that format.
pub fn optional_date(field: &str, value: Option<&str>) -> PolicyResult<Option<NaiveDate>> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|err| {
            Rejection::validation(format!(
                "`{field}` must be a date formatted YYYY-MM-DD, got \"{raw}\" ({err})"
            ))
        })
}

/// Requires a plausible git branch name.
///
/// # Errors
///
/// Rejects blank names and names git would refuse (`..`, spaces, leading `-`).
pub fn require_branch<'a>(field: &str, value: Option<&'a str>) -> PolicyResult<&'a str> {
    let branch = require_text(field, value)?.trim();
    if branch.starts_with('-') || branch.contains("..") || branch.contains(char::is_whitespace) {
        return Err(Rejection::validation(format!(
            "`{field}` \"{branch}\" is not a valid branch name"
        )));
    }
    Ok(branch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RejectionKind;

    #[test]
    fn require_text_names_the_field() {
        let err = require_text("title", None).unwrap_err();
        assert_eq!(err.kind(), RejectionKind::Validation);
        assert!(err.message().contains("`title`"));

        let err = require_text("body", Some("  \n\t")).unwrap_err();
        assert!(err.message().contains("`body`"));

        assert_eq!(require_text("title", Some("ok")).unwrap(), "ok");
    }

    #[test]
    fn comment_body_falls_back_on_blank() {
        assert_eq!(comment_body(Some("hi"), Some("default")).unwrap(), "hi");
        assert_eq!(comment_body(Some("   "), Some("default")).unwrap(), "default");
        assert_eq!(comment_body(None, Some("default")).unwrap(), "default");

        let err = comment_body(Some(""), None).unwrap_err();
        assert!(err.message().contains("No comment body provided"));
        let err = comment_body(Some("  "), Some("   ")).unwrap_err();
        assert!(err.message().contains("No comment body provided"));
    }

    #[test]
    fn labels_are_trimmed_and_deduplicated() {
        let labels = vec![" bug ".to_owned(), "bug".to_owned(), String::new(), "ux".to_owned()];
        assert_eq!(normalize_labels(&labels), vec!["bug", "ux"]);
        assert!(require_labels(&[" ".to_owned()]).is_err());
    }

    #[test]
    fn status_keywords_are_listed_on_error() {
        assert_eq!(require_status(Some("complete")).unwrap(), ProjectStatus::Complete);
        let err = require_status(Some("green")).unwrap_err();
        assert!(err.message().contains("ON_TRACK"));
        let err = require_status(None).unwrap_err();
        assert!(err.message().contains("`status`"));
    }

    #[test]
    fn impossible_dates_are_rejected() {
        for raw in ["2024-02-30", "2024-13-45", "2024-99-99", "2023-02-29"] {
            let err = optional_date("start_date", Some(raw)).unwrap_err();
            assert_eq!(err.kind(), RejectionKind::Validation);
            assert!(err.message().contains(raw), "{raw}");
        }
        assert_eq!(
            optional_date("target_date", Some("2024-02-29")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }

    #[test]
    fn dates_and_branches() {
        assert_eq!(
            optional_date("start_date", Some("2026-01-31")).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 31)
        );
        assert_eq!(optional_date("start_date", Some(" ")).unwrap(), None);
        assert!(optional_date("target_date", Some("31/01/2026")).is_err());

        assert_eq!(require_branch("head", Some(" feature/x ")).unwrap(), "feature/x");
        assert!(require_branch("head", Some("a..b")).is_err());
        assert!(require_branch("head", Some("-rf")).is_err());
    }
}
