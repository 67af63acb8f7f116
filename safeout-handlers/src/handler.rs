//! Shared contract for per-type handlers.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use safeout_config::PolicyStore;
use safeout_policy::{PolicyResult, ProjectScope, Rejection};
use safeout_primitives::{ActionType, Repository, RunContext, SafeOutputRequest};

use crate::client::GitHubClient;
use crate::error::{HandlerError, HandlerResult};
use crate::render::MessageRenderer;
use crate::result::ExecutionResult;

/// Everything a handler may consult while validating or executing.
#[derive(Clone)]
pub struct HandlerContext {
    run: Arc<RunContext>,
    store: PolicyStore,
    client: Arc<dyn GitHubClient>,
    renderer: Arc<MessageRenderer>,
}

impl fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerContext")
            .field("repository", self.run.repository())
            .field("run_id", self.run.run_id())
            .field("staged", &self.store.staged())
            .finish_non_exhaustive()
    }
}

impl HandlerContext {
    /// Binds the run, its policy, and the injected client.
    #[must_use]
    pub fn new(run: RunContext, store: PolicyStore, client: Arc<dyn GitHubClient>) -> Self {
        let renderer = MessageRenderer::new(&run, store.messages());
        Self {
            run: Arc::new(run),
            store,
            client,
            renderer: Arc::new(renderer),
        }
    }

    /// Run facts.
    #[must_use]
    pub fn run(&self) -> &RunContext {
        &self.run
    }

    /// Repository the run belongs to.
    #[must_use]
    pub fn repository(&self) -> &Repository {
        self.run.repository()
    }

    /// Frozen policy.
    #[must_use]
    pub fn store(&self) -> &PolicyStore {
        &self.store
    }

    /// External client.
    #[must_use]
    pub fn client(&self) -> &dyn GitHubClient {
        self.client.as_ref()
    }

    /// Footer and marker renderer.
    #[must_use]
    pub fn renderer(&self) -> &MessageRenderer {
        &self.renderer
    }

    /// Returns `true` when nothing may be written.
    #[must_use]
    pub fn staged(&self) -> bool {
        self.store.staged()
    }
}

/// Validates requests of one action type.
///
/// A handler may perform read-only lookups during validation (for example to
/// check a pull request's labels) but must not change anything on GitHub
/// until [`ValidatedAction::execute`] runs.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Action type served by this handler.
    fn action(&self) -> ActionType;

    /// Runs structural and content checks and prepares the action.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Rejected`] when a check fails and
    /// [`HandlerError::Lookup`] when a read needed by a check fails.
    async fn validate(
        &self,
        request: &SafeOutputRequest,
        ctx: &HandlerContext,
    ) -> HandlerResult<Box<dyn ValidatedAction>>;
}

/// A request that passed validation and is ready to run.
#[async_trait]
pub trait ValidatedAction: Send + Sync + fmt::Debug {
    /// Fixes the project the action targets. Types that do not address a
    /// project keep the default and return `None`.
    ///
    /// # Errors
    ///
    /// Returns a validation rejection when no project can be determined.
    fn resolve_scope(&mut self) -> PolicyResult<Option<ProjectScope>> {
        Ok(None)
    }

    /// Result reported instead of executing in staged runs.
    fn preview(&self) -> ExecutionResult {
        ExecutionResult::staged()
    }

    /// Performs the primary effect, then secondary effects.
    ///
    /// Never returns an error: failures are reported in the result.
    async fn execute(self: Box<Self>, ctx: &HandlerContext) -> ExecutionResult;
}

/// Looks up the section for `action`, rejecting when it is not configured.
pub(crate) fn enabled<T>(section: Option<T>, action: ActionType) -> PolicyResult<T> {
    section.ok_or_else(|| {
        Rejection::validation(format!("`{action}` is not enabled for this workflow"))
    })
}

/// Rejection for a request routed to the wrong handler.
pub(crate) fn payload_mismatch(expected: ActionType, request: &SafeOutputRequest) -> HandlerError {
    Rejection::validation(format!(
        "handler for `{expected}` cannot process `{}` requests",
        request.action()
    ))
    .into()
}
