//! Fatal configuration errors.

use std::path::PathBuf;

use safeout_primitives::ActionType;
use thiserror::Error;

/// Errors raised while loading configuration.
///
/// Every variant is fatal: the run aborts before any request is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration `{path}`: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration document is not valid JSON or does not match the schema.
    #[error("invalid configuration document: {source}")]
    Parse {
        /// Source [`serde_json::Error`].
        #[from]
        source: serde_json::Error,
    },

    /// A project-scoped action type has no token to act with.
    #[error("`{action}` requires a github-token (per type or top level) but none is configured")]
    MissingToken {
        /// Action type lacking a credential.
        action: ActionType,
    },

    /// A `max` ceiling of zero was configured.
    #[error("`{action}` has max 0; remove the entry to disable the type instead")]
    InvalidMax {
        /// Offending action type.
        action: ActionType,
    },

    /// A label list was configured but empty.
    #[error("`{action}` declares an empty `{field}` list")]
    EmptyLabelList {
        /// Offending action type.
        action: ActionType,
        /// Name of the empty field.
        field: &'static str,
    },

    /// A required environment variable is missing.
    #[error("environment variable `{name}` is not set")]
    MissingEnv {
        /// Variable name.
        name: &'static str,
    },

    /// An environment variable or event payload could not be interpreted.
    #[error("environment variable `{name}` is invalid: {reason}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// A primitive value (repository slug, project URL) failed validation.
    #[error(transparent)]
    Primitive(#[from] safeout_primitives::Error),
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
