//! Content filters applied independently of structural validity.

use safeout_config::Target;
use safeout_primitives::{ResolvedTarget, TargetSource};

use crate::structural::require_target;
use crate::{PolicyResult, Rejection};

fn format_set(labels: &[String]) -> String {
    format!("[{}]", labels.join(", "))
}

/// Requires the target's labels to intersect `required`.
///
/// Matching is ANY: a single shared label is enough, even when the other
/// required labels are absent.
///
/// # Errors
///
/// Rejects with "does not match required labels" when the sets are disjoint.
pub fn check_required_labels(
    subject: &str,
    current: &[String],
    required: &[String],
) -> PolicyResult<()> {
    if required.is_empty() || current.iter().any(|label| required.contains(label)) {
        return Ok(());
    }

    Err(Rejection::policy(format!(
        "{subject} labels {} does not match required labels {}",
        format_set(current),
        format_set(required)
    )))
}

/// Requires the target's title to start with `prefix`.
///
/// # Errors
///
/// Rejects with "does not start with required prefix" when it does not.
pub fn check_title_prefix(subject: &str, title: &str, prefix: &str) -> PolicyResult<()> {
    if title.starts_with(prefix) {
        return Ok(());
    }

    Err(Rejection::policy(format!(
        "{subject} title \"{title}\" does not start with required prefix \"{prefix}\""
    )))
}

/// Requires every proposed label to be on the allow-list.
///
/// `None` means the type has no allow-list and every label passes.
///
/// # Errors
///
/// Rejects listing the disallowed labels.
pub fn check_allowed_labels(requested: &[String], allowed: Option<&[String]>) -> PolicyResult<()> {
    let Some(allowed) = allowed else {
        return Ok(());
    };

    let denied: Vec<String> = requested
        .iter()
        .filter(|label| !allowed.contains(label))
        .cloned()
        .collect();
    if denied.is_empty() {
        return Ok(());
    }

    Err(Rejection::policy(format!(
        "Labels {} are not in the allowed list {}",
        format_set(&denied),
        format_set(allowed)
    )))
}

/// Applies a `target` restriction and returns the item number to act on.
///
/// # Errors
///
/// Rejects when no number can be resolved (validation) or when the agent
/// named an item the configuration does not allow (policy).
pub fn enforce_target(
    policy: Target,
    target: Option<ResolvedTarget>,
    triggering: Option<u64>,
    field: &str,
) -> PolicyResult<u64> {
    match policy {
        Target::Any => require_target(field, target).map(|t| t.number),
        Target::Triggering => {
            let Some(triggering) = triggering else {
                return Err(Rejection::validation(
                    "This workflow may only address the triggering issue or pull request, \
                     but the run has none",
                ));
            };
            match target {
                Some(t) if t.number != triggering => Err(Rejection::policy(format!(
                    "Target #{} is not allowed: \
                     only the triggering item #{triggering} may be addressed",
                    t.number
                ))),
                _ => Ok(triggering),
            }
        }
        Target::Fixed(number) => match target {
            Some(t) if t.source == TargetSource::Explicit && t.number != number => {
                Err(Rejection::policy(format!(
                    "Target #{} is not allowed: this workflow may only address #{number}",
                    t.number
                )))
            }
            _ => Ok(number),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RejectionKind;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn required_labels_use_any_match() {
        let required = labels(&["ready", "approved"]);
        assert!(check_required_labels("Pull request #1", &labels(&["ready"]), &required).is_ok());
        assert!(
            check_required_labels("Pull request #1", &labels(&["wip", "approved"]), &required)
                .is_ok()
        );

        let err =
            check_required_labels("Pull request #1", &labels(&["wip"]), &required).unwrap_err();
        assert_eq!(err.kind(), RejectionKind::Policy);
        assert!(err.message().contains("does not match required labels"));
        assert!(err.message().contains("[wip]"));

        let err = check_required_labels("Pull request #1", &[], &required).unwrap_err();
        assert!(err.message().contains("does not match required labels"));
    }

    #[test]
    fn title_prefix_is_exact() {
        assert!(check_title_prefix("Pull request #2", "[bot] bump deps", "[bot] ").is_ok());
        let err = check_title_prefix("Pull request #2", "[BOT] bump deps", "[bot] ").unwrap_err();
        assert!(err.message().contains("does not start with required prefix"));
    }

    #[test]
    fn allow_list_rejects_unknown_labels() {
        let allowed = labels(&["smoke-project"]);
        assert!(check_allowed_labels(&labels(&["smoke-project"]), Some(&allowed)).is_ok());
        let err = check_allowed_labels(&labels(&["other-label"]), Some(&allowed)).unwrap_err();
        assert_eq!(err.kind(), RejectionKind::Policy);
        assert!(err.message().contains("other-label"));
        assert!(check_allowed_labels(&labels(&["anything"]), None).is_ok());
    }

    #[test]
    fn triggering_target_rejects_other_items() {
        let number = enforce_target(
            Target::Triggering,
            Some(ResolvedTarget::triggering(7)),
            Some(7),
            "item_number",
        )
        .unwrap();
        assert_eq!(number, 7);

        let err = enforce_target(
            Target::Triggering,
            Some(ResolvedTarget::explicit(8)),
            Some(7),
            "item_number",
        )
        .unwrap_err();
        assert_eq!(err.kind(), RejectionKind::Policy);

        let err = enforce_target(Target::Triggering, None, None, "item_number").unwrap_err();
        assert_eq!(err.kind(), RejectionKind::Validation);
    }

    #[test]
    fn any_and_fixed_targets() {
        assert_eq!(
            enforce_target(Target::Any, Some(ResolvedTarget::explicit(9)), Some(1), "n").unwrap(),
            9
        );
        assert!(enforce_target(Target::Any, None, None, "n").is_err());

        assert_eq!(
            enforce_target(Target::Fixed(3), Some(ResolvedTarget::triggering(1)), Some(1), "n")
                .unwrap(),
            3
        );
        assert!(
            enforce_target(Target::Fixed(3), Some(ResolvedTarget::explicit(4)), None, "n").is_err()
        );
    }
}
