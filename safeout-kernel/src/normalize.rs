//! Turns raw tool-call JSON into a typed [`SafeOutputRequest`].

use safeout_config::PolicyStore;
use safeout_policy::{PolicyResult, Rejection};
use safeout_primitives::{
    ActionPayload, ActionType, Provenance, ResolvedTarget, RunContext, SafeOutputRequest,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Label used in the audit log for requests whose `type` cannot be read.
pub const UNKNOWN_TYPE: &str = "unknown";

/// Parses and types one agent request.
///
/// Omitted item numbers are filled from the run: comment and label requests
/// fall back to the triggering issue or pull request, `close-pull-request`
/// only to a triggering pull request.
///
/// # Errors
///
/// Returns a validation rejection when the document is not an object, the
/// `type` is unknown or not enabled, or a field has the wrong shape.
pub fn normalize(
    raw: &Value,
    run: &RunContext,
    store: &PolicyStore,
) -> PolicyResult<SafeOutputRequest> {
    let Some(object) = raw.as_object() else {
        return Err(Rejection::validation("Safe output request must be a JSON object"));
    };
    let Some(name) = object.get("type").and_then(Value::as_str) else {
        return Err(Rejection::validation("Safe output request is missing `type`"));
    };
    let action: ActionType = name
        .parse()
        .map_err(|err| Rejection::validation(format!("{err}")))?;
    if !store.is_enabled(action) {
        return Err(Rejection::validation(format!(
            "`{action}` is not enabled for this workflow"
        )));
    }

    let payload = payload(action, object)?;
    let target = resolve_target(&payload, run);

    Ok(SafeOutputRequest::new(
        payload,
        target,
        Provenance {
            run_id: run.run_id().clone(),
            trigger: run.trigger(),
        },
    ))
}

/// Canonical type name of a raw request, for logging.
///
/// Unknown spellings are returned verbatim; a missing or non-string `type`
/// yields [`UNKNOWN_TYPE`].
#[must_use]
pub fn action_name(raw: &Value) -> String {
    match raw.get("type").and_then(Value::as_str) {
        Some(name) => name
            .parse::<ActionType>()
            .map_or_else(|_| name.to_owned(), |action| action.as_str().to_owned()),
        None => UNKNOWN_TYPE.to_owned(),
    }
}

fn payload(action: ActionType, object: &Map<String, Value>) -> PolicyResult<ActionPayload> {
    let mut fields = object.clone();
    fields.remove("type");
    let fields = Value::Object(fields);

    Ok(match action {
        ActionType::CreateIssue => ActionPayload::CreateIssue(decode(action, fields)?),
        ActionType::AddComment => ActionPayload::AddComment(decode(action, fields)?),
        ActionType::AddLabels => ActionPayload::AddLabels(decode(action, fields)?),
        ActionType::RemoveLabels => ActionPayload::RemoveLabels(decode(action, fields)?),
        ActionType::ClosePullRequest => ActionPayload::ClosePullRequest(decode(action, fields)?),
        ActionType::CreatePullRequest => {
            ActionPayload::CreatePullRequest(decode(action, fields)?)
        }
        ActionType::UpdateProject => ActionPayload::UpdateProject(decode(action, fields)?),
        ActionType::CreateProjectStatusUpdate => {
            ActionPayload::CreateProjectStatusUpdate(decode(action, fields)?)
        }
    })
}

fn decode<T: DeserializeOwned>(action: ActionType, fields: Value) -> PolicyResult<T> {
    serde_json::from_value(fields)
        .map_err(|err| Rejection::validation(format!("Invalid `{action}` request: {err}")))
}

fn resolve_target(payload: &ActionPayload, run: &RunContext) -> Option<ResolvedTarget> {
    if let Some(number) = payload.explicit_item_number() {
        return Some(ResolvedTarget::explicit(number));
    }
    let triggering = match payload {
        ActionPayload::AddComment(_)
        | ActionPayload::AddLabels(_)
        | ActionPayload::RemoveLabels(_) => run.triggering_number(),
        ActionPayload::ClosePullRequest(_) => run.triggering_pull_request(),
        _ => None,
    };
    triggering.map(ResolvedTarget::triggering)
}
