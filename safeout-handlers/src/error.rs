//! Errors raised by the external client and by handlers.

use std::time::Duration;

use safeout_policy::Rejection;
use thiserror::Error;

/// Result alias for client calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Failure reported by the external GitHub client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The addressed resource does not exist or is not visible to the token.
    #[error("{resource} not found")]
    NotFound {
        /// What was looked up, e.g. `pull request #4`.
        resource: String,
    },

    /// The API answered with an error status.
    #[error("GitHub API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error text returned by the API.
        message: String,
    },

    /// The call did not finish within the configured bound.
    #[error("GitHub call `{operation}` timed out after {}s", elapsed.as_secs())]
    Timeout {
        /// Client operation that timed out.
        operation: &'static str,
        /// Bound that was exceeded.
        elapsed: Duration,
    },

    /// Network or protocol failure before a response was received.
    #[error("transport error: {reason}")]
    Transport {
        /// Human-readable reason.
        reason: String,
    },
}

impl ClientError {
    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates an API error.
    #[must_use]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

/// Result alias for handler validation.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Failure while validating a request inside a handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The request was rejected by a structural or policy check.
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// A read-only lookup needed by a policy check failed.
    #[error("lookup failed: {0}")]
    Lookup(#[from] ClientError),
}
