//! Request pipeline from raw tool call to recorded result.

use std::sync::Arc;
use std::time::Duration;

use safeout_config::PolicyStore;
use safeout_handlers::{
    ExecutionResult, GitHubClient, HandlerContext, HandlerError, HandlerRegistry, TimeoutClient,
};
use safeout_journal::{ArrivalSequencer, AuditEntry, AuditLog, MemoryAuditLog};
use safeout_policy::{AdmissionController, Rejection};
use safeout_primitives::{ActionType, RunContext};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::normalize::{action_name, normalize};

/// Result alias for mediator assembly.
pub type MediatorResult<T> = Result<T, MediatorError>;

/// Configuration problems detected before any request is processed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MediatorError {
    /// An enabled action type has nothing to execute it.
    #[error("`{action}` is enabled but no handler is registered for it")]
    MissingHandler {
        /// Enabled type without a handler.
        action: ActionType,
    },
    /// No GitHub client was supplied.
    #[error("a GitHub client is required")]
    MissingClient,
}

/// Assembles a [`Mediator`].
#[derive(Debug)]
pub struct MediatorBuilder {
    store: PolicyStore,
    run: RunContext,
    client: Option<Arc<dyn GitHubClient>>,
    call_timeout: Option<Duration>,
    registry: Option<HandlerRegistry>,
    journal: Option<Arc<dyn AuditLog>>,
}

impl MediatorBuilder {
    /// Injects the authenticated client.
    #[must_use]
    pub fn client(mut self, client: Arc<dyn GitHubClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Overrides the per-call time bound.
    #[must_use]
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Uses `registry` instead of the built-in handlers.
    #[must_use]
    pub fn registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Records decisions to `journal` instead of an in-memory log.
    #[must_use]
    pub fn journal(mut self, journal: Arc<dyn AuditLog>) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Checks the assembly and freezes it.
    ///
    /// # Errors
    ///
    /// Returns [`MediatorError::MissingClient`] without a client and
    /// [`MediatorError::MissingHandler`] when an enabled type has no handler.
    pub fn build(self) -> MediatorResult<Mediator> {
        let client = self.client.ok_or(MediatorError::MissingClient)?;
        let registry = self.registry.unwrap_or_else(HandlerRegistry::with_defaults);

        if let Some(action) = self
            .store
            .enabled_types()
            .into_iter()
            .find(|action| !registry.contains(*action))
        {
            return Err(MediatorError::MissingHandler { action });
        }

        let mut bounded = TimeoutClient::new(client);
        if let Some(timeout) = self.call_timeout {
            bounded = bounded.with_timeout(timeout);
        }

        let admission = AdmissionController::from_store(&self.store);
        let journal = self
            .journal
            .unwrap_or_else(|| Arc::new(MemoryAuditLog::new()));

        info!(
            repository = %self.run.repository(),
            run_id = %self.run.run_id(),
            enabled = ?self.store.enabled_types(),
            staged = self.store.staged(),
            "safe output mediator ready"
        );

        Ok(Mediator {
            ctx: HandlerContext::new(self.run, self.store, Arc::new(bounded)),
            registry,
            admission,
            arrivals: ArrivalSequencer::new(),
            journal,
        })
    }
}

/// Single entry point for agent tool calls during one run.
///
/// Safe to share across tasks. Admission counters and the arrival order are
/// the only mutable state.
#[derive(Debug)]
pub struct Mediator {
    ctx: HandlerContext,
    registry: HandlerRegistry,
    admission: AdmissionController,
    arrivals: ArrivalSequencer,
    journal: Arc<dyn AuditLog>,
}

impl Mediator {
    /// Starts assembling a mediator for `run` under `store`.
    #[must_use]
    pub fn builder(store: PolicyStore, run: RunContext) -> MediatorBuilder {
        MediatorBuilder {
            store,
            run,
            client: None,
            call_timeout: None,
            registry: None,
            journal: None,
        }
    }

    /// Processes one raw tool call and returns the agent-facing result.
    ///
    /// The decision is appended to the audit log before this returns, stamped
    /// with the arrival time and after the entries of every request that
    /// arrived earlier. A failing log write is reported through `tracing` and
    /// does not change the result.
    pub async fn handle(&self, raw: Value) -> ExecutionResult {
        let ticket = self.arrivals.ticket();
        let action = action_name(&raw);
        let (entry, result) = match self.process(&raw).await {
            Ok(result) => (
                AuditEntry::accepted(action.as_str(), raw, result.clone()),
                result,
            ),
            Err(reason) => {
                let result = ExecutionResult::failed(reason.as_str());
                (AuditEntry::rejected(action.as_str(), raw, reason), result)
            }
        };

        let entry = entry.with_timestamp(ticket.arrived_at());
        let sequence = ticket.number();
        let _turn = ticket.turn().await;
        if let Err(err) = self.journal.append(&entry).await {
            warn!(action = %action, sequence, error = %err, "failed to append audit entry");
        }
        result
    }

    async fn process(&self, raw: &Value) -> Result<ExecutionResult, String> {
        let request = normalize(raw, self.ctx.run(), self.ctx.store())
            .map_err(|rejection| rejected(&action_name(raw), &rejection))?;
        let action = request.action();

        let handler = self.registry.get(action).ok_or_else(|| {
            rejected(
                action.as_str(),
                &Rejection::validation(format!("No handler registered for `{action}`")),
            )
        })?;

        let mut validated = match handler.validate(&request, &self.ctx).await {
            Ok(validated) => validated,
            Err(HandlerError::Rejected(rejection)) => {
                return Err(rejected(action.as_str(), &rejection));
            }
            Err(HandlerError::Lookup(err)) => {
                warn!(
                    action = %action,
                    request_id = %request.id(),
                    error = %err,
                    "validation lookup failed"
                );
                return Err(format!("Failed to validate `{action}` request: {err}"));
            }
        };

        let permit = self
            .admission
            .admit(action)
            .map_err(|rejection| rejected(action.as_str(), &rejection))?;
        // Dropping the permit on a scope failure releases the slot.
        let scope = validated
            .resolve_scope()
            .map_err(|rejection| rejected(action.as_str(), &rejection))?;
        permit.commit();

        debug!(
            action = %action,
            request_id = %request.id(),
            project = scope.as_ref().map(|s| s.url.as_str()),
            "safe output accepted"
        );

        if self.ctx.staged() {
            return Ok(validated.preview());
        }
        Ok(validated.execute(&self.ctx).await)
    }

    /// Decisions recorded so far.
    #[must_use]
    pub fn journal(&self) -> &Arc<dyn AuditLog> {
        &self.journal
    }

    /// Admission counters for the run.
    #[must_use]
    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    /// Context shared with the handlers.
    #[must_use]
    pub fn context(&self) -> &HandlerContext {
        &self.ctx
    }
}

fn rejected(action: &str, rejection: &Rejection) -> String {
    warn!(
        action,
        kind = ?rejection.kind(),
        reason = rejection.message(),
        "safe output rejected"
    );
    rejection.message().to_owned()
}
