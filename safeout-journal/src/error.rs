//! Error types for the audit log.

use serde_json::Error as SerdeError;
use thiserror::Error;

/// Errors emitted while writing or reading the audit log.
#[derive(Debug, Error)]
pub enum JournalError {
    /// Underlying I/O failure while reading or writing the log file.
    #[error("i/o error: {source}")]
    Io {
        /// Source [`std::io::Error`].
        #[from]
        source: std::io::Error,
    },
    /// Serialization or deserialization error.
    #[error("serialization error: {source}")]
    Serialization {
        /// Source [`serde_json::Error`].
        #[from]
        source: SerdeError,
    },
    /// A stored line could not be decoded.
    #[error("corrupt audit entry on line {line}: {source}")]
    Corrupt {
        /// One-based line number.
        line: usize,
        /// Decoder error.
        source: SerdeError,
    },
}

/// Result type alias for audit log operations.
pub type JournalResult<T> = Result<T, JournalError>;
