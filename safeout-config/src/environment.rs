//! Run context derived from the GitHub Actions environment.

use safeout_primitives::{Repository, RunContext, RunId, TriggerTarget};
use serde_json::Value;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Builds the [`RunContext`] from the process environment.
///
/// # Errors
///
/// See [`run_context_from_vars`].
pub fn run_context_from_env() -> ConfigResult<RunContext> {
    run_context_from_vars(|name| std::env::var(name).ok())
}

/// Builds the [`RunContext`] from an arbitrary variable lookup.
///
/// `GITHUB_REPOSITORY` and `GITHUB_RUN_ID` are required. When
/// `GITHUB_EVENT_PATH` points at an event payload, the triggering issue or
/// pull request is extracted from it.
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnv`] for absent required variables and
/// [`ConfigError::InvalidEnv`] when the repository slug or event payload
/// cannot be interpreted.
pub fn run_context_from_vars<F>(lookup: F) -> ConfigResult<RunContext>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |name: &'static str| {
        lookup(name)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingEnv { name })
    };

    let repository: Repository =
        required("GITHUB_REPOSITORY")?
            .parse()
            .map_err(|err: safeout_primitives::Error| ConfigError::InvalidEnv {
                name: "GITHUB_REPOSITORY",
                reason: err.to_string(),
            })?;
    let run_id = RunId::new(required("GITHUB_RUN_ID")?);

    let mut context = RunContext::new(repository, run_id);
    if let Some(workflow) = lookup("GITHUB_WORKFLOW") {
        context = context.with_workflow_name(workflow);
    }
    if let Some(server) = lookup("GITHUB_SERVER_URL") {
        context = context.with_server_url(server);
    }

    if let Some(path) = lookup("GITHUB_EVENT_PATH").filter(|p| !p.trim().is_empty()) {
        let raw = std::fs::read_to_string(&path).map_err(|err| ConfigError::InvalidEnv {
            name: "GITHUB_EVENT_PATH",
            reason: format!("cannot read `{path}`: {err}"),
        })?;
        let event: Value = serde_json::from_str(&raw).map_err(|err| ConfigError::InvalidEnv {
            name: "GITHUB_EVENT_PATH",
            reason: format!("invalid event payload: {err}"),
        })?;
        if let Some(trigger) = trigger_from_event(&event) {
            debug!(number = trigger.number, kind = ?trigger.kind, "triggering item resolved");
            context = context.with_trigger(trigger);
        }
    }

    Ok(context)
}

/// Extracts the triggering issue or pull request from an event payload.
///
/// Comments on pull requests arrive as `issue` events carrying a
/// `pull_request` link, so those count as pull request triggers.
fn trigger_from_event(event: &Value) -> Option<TriggerTarget> {
    if let Some(number) = event.pointer("/pull_request/number").and_then(Value::as_u64) {
        return Some(TriggerTarget::pull_request(number));
    }

    let issue = event.get("issue")?;
    let number = issue.get("number").and_then(Value::as_u64)?;
    if issue.get("pull_request").is_some_and(|link| !link.is_null()) {
        Some(TriggerTarget::pull_request(number))
    } else {
        Some(TriggerTarget::issue(number))
    }
}
