//! Non-fatal rejection taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of a rejected request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    /// Malformed or missing fields, unresolved target or scope.
    Validation,
    /// Content filter mismatch or admission ceiling reached.
    Policy,
}

/// Why a request was dropped before execution.
///
/// Rejections are never retried by the mediation layer; the message is
/// returned verbatim to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The request is malformed or incomplete.
    #[error("{message}")]
    Validation {
        /// Agent-facing explanation.
        message: String,
    },
    /// The request is well formed but not permitted.
    #[error("{message}")]
    Policy {
        /// Agent-facing explanation.
        message: String,
    },
}

impl Rejection {
    /// Creates a validation rejection.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a policy violation.
    #[must_use]
    pub fn policy(message: impl Into<String>) -> Self {
        Self::Policy {
            message: message.into(),
        }
    }

    /// Returns the rejection category.
    #[must_use]
    pub fn kind(&self) -> RejectionKind {
        match self {
            Self::Validation { .. } => RejectionKind::Validation,
            Self::Policy { .. } => RejectionKind::Policy,
        }
    }

    /// Returns the agent-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Validation { message } | Self::Policy { message } => message,
        }
    }
}

/// Result alias for policy checks.
pub type PolicyResult<T> = Result<T, Rejection>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_bare_message() {
        let rejection = Rejection::policy("Max count (2) exceeded");
        assert_eq!(rejection.to_string(), "Max count (2) exceeded");
        assert_eq!(rejection.kind(), RejectionKind::Policy);
        assert_eq!(
            Rejection::validation("missing").kind(),
            RejectionKind::Validation
        );
    }
}
