//! Per-type invocation ceilings.
//!
//! Counters live for one workflow run and are shared by every concurrent tool
//! call. A slot is reserved atomically when a request is admitted and handed
//! back if the request is dropped before it reaches the execution engine.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use safeout_config::PolicyStore;
use safeout_primitives::ActionType;
use tracing::debug;

use crate::{PolicyResult, Rejection};

#[derive(Debug)]
struct Counter {
    max: u32,
    accepted: AtomicU32,
}

/// Enforces `max` for every enabled action type.
#[derive(Debug, Clone)]
pub struct AdmissionController {
    counters: Arc<HashMap<ActionType, Arc<Counter>>>,
}

impl AdmissionController {
    /// Builds counters for every type the store enables.
    #[must_use]
    pub fn from_store(store: &PolicyStore) -> Self {
        let counters = store
            .enabled_types()
            .into_iter()
            .filter_map(|action| {
                store.max(action).map(|max| {
                    (
                        action,
                        Arc::new(Counter {
                            max,
                            accepted: AtomicU32::new(0),
                        }),
                    )
                })
            })
            .collect();
        Self {
            counters: Arc::new(counters),
        }
    }

    /// Reserves one slot for `action`.
    ///
    /// The returned permit must be [committed](AdmissionPermit::commit) once
    /// the request is handed to execution; dropping it releases the slot.
    ///
    /// # Errors
    ///
    /// Returns a policy rejection when the ceiling is already reached and a
    /// validation rejection when the type is not enabled.
    pub fn admit(&self, action: ActionType) -> PolicyResult<AdmissionPermit> {
        let Some(counter) = self.counters.get(&action) else {
            return Err(Rejection::validation(format!(
                "`{action}` is not enabled for this workflow"
            )));
        };

        let reserved = counter
            .accepted
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |accepted| {
                (accepted < counter.max).then_some(accepted + 1)
            });

        match reserved {
            Ok(previous) => {
                debug!(%action, slot = previous + 1, max = counter.max, "admission slot reserved");
                Ok(AdmissionPermit {
                    action,
                    counter: Some(Arc::clone(counter)),
                })
            }
            Err(_) => Err(Rejection::policy(format!(
                "Max count ({}) exceeded for `{action}`",
                counter.max
            ))),
        }
    }

    /// Number of reserved or committed slots for `action`.
    #[must_use]
    pub fn accepted(&self, action: ActionType) -> u32 {
        self.counters
            .get(&action)
            .map_or(0, |counter| counter.accepted.load(Ordering::Acquire))
    }

    /// Configured ceiling for `action`, if enabled.
    #[must_use]
    pub fn max(&self, action: ActionType) -> Option<u32> {
        self.counters.get(&action).map(|counter| counter.max)
    }
}

/// A reserved admission slot.
#[derive(Debug)]
#[must_use = "dropping a permit releases the reserved slot"]
pub struct AdmissionPermit {
    action: ActionType,
    counter: Option<Arc<Counter>>,
}

impl AdmissionPermit {
    /// Action type the slot belongs to.
    #[must_use]
    pub fn action(&self) -> ActionType {
        self.action
    }

    /// Keeps the slot consumed regardless of the execution outcome.
    pub fn commit(mut self) {
        self.counter = None;
    }
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        if let Some(counter) = self.counter.take() {
            counter.accepted.fetch_sub(1, Ordering::AcqRel);
            debug!(action = %self.action, "admission slot released");
        }
    }
}
