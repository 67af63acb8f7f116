//! Mediation kernel for safe outputs.
//!
//! The [`Mediator`] owns everything one workflow run needs: the frozen
//! policy, the admission counters, the handler registry, and the audit log.
//! Each agent tool call goes through [`Mediator::handle`], which normalizes
//! the raw JSON, validates it, reserves an admission slot, resolves scope,
//! executes, and records the decision before returning.

#![warn(missing_docs, clippy::pedantic)]

mod mediator;
pub mod normalize;

pub use mediator::{Mediator, MediatorBuilder, MediatorError, MediatorResult};
pub use normalize::normalize;
