//! Shared error definitions for primitive types.

use thiserror::Error;
use uuid::Error as UuidError;

/// Result alias used throughout the mediation layer.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// The provided request identifier could not be parsed.
    #[error("invalid request id: {source}")]
    InvalidRequestId {
        /// Source parsing error from the UUID library.
        #[from]
        source: UuidError,
    },

    /// The action type is not part of the supported closed set.
    #[error("unknown safe output type `{name}`")]
    UnknownActionType {
        /// The offending type string.
        name: String,
    },

    /// A repository slug was not of the form `owner/repo`.
    #[error("invalid repository `{slug}`: expected `owner/repo`")]
    InvalidRepository {
        /// The offending slug.
        slug: String,
    },

    /// A project URL could not be parsed.
    #[error("invalid project url `{url}`: {reason}")]
    InvalidProjectUrl {
        /// The offending URL string.
        url: String,
        /// Human-readable reason for rejection.
        reason: String,
    },
}
