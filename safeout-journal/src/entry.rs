//! Audit entry shape.

use chrono::{DateTime, Utc};
use safeout_handlers::ExecutionResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Mediator decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The request passed validation and admission.
    Accepted,
    /// The request was dropped before execution.
    Rejected,
}

/// One immutable line of the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    action: String,
    request: Value,
    outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<ExecutionResult>,
}

impl AuditEntry {
    /// Entry for a request that was admitted and executed (or previewed).
    #[must_use]
    pub fn accepted(action: impl Into<String>, request: Value, result: ExecutionResult) -> Self {
        Self {
            timestamp: Utc::now(),
            action: action.into(),
            request,
            outcome: Outcome::Accepted,
            reason: None,
            result: Some(result),
        }
    }

    /// Entry for a request dropped with `reason`.
    #[must_use]
    pub fn rejected(action: impl Into<String>, request: Value, reason: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            action: action.into(),
            request,
            outcome: Outcome::Rejected,
            reason: Some(reason.into()),
            result: None,
        }
    }

    /// Overrides the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Time the request arrived, or the decision time if never overridden.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Action type as sent by the agent. Unknown types are kept verbatim.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Raw request as received.
    #[must_use]
    pub fn request(&self) -> &Value {
        &self.request
    }

    /// Decision.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Rejection reason, for rejected entries.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Execution result, for accepted entries.
    #[must_use]
    pub fn result(&self) -> Option<&ExecutionResult> {
        self.result.as_ref()
    }
}
