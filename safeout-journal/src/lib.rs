//! Append-only audit log for safe output decisions.
//!
//! Every request the mediator processes produces exactly one [`AuditEntry`],
//! appended in arrival order before the result goes back to the agent.

#![warn(missing_docs, clippy::pedantic)]

mod entry;
mod error;
pub mod journal;
pub mod sequence;
pub mod volatile;

pub use entry::{AuditEntry, Outcome};
pub use error::{JournalError, JournalResult};
pub use journal::{AuditLog, FileAuditLog};
pub use sequence::{ArrivalSequencer, ArrivalTicket, Turn};
pub use volatile::MemoryAuditLog;
