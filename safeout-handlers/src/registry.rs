//! Runtime registry binding action types to handlers.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use safeout_primitives::ActionType;
use thiserror::Error;

use crate::comments::AddCommentHandler;
use crate::handler::ActionHandler;
use crate::issues::CreateIssueHandler;
use crate::labels::LabelsHandler;
use crate::projects::{ProjectStatusUpdateHandler, UpdateProjectHandler};
use crate::pull_requests::{ClosePullRequestHandler, CreatePullRequestHandler};

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors produced by handler registration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A handler for the action type is already registered.
    #[error("a handler for `{action}` is already registered")]
    DuplicateHandler {
        /// Offending action type.
        action: ActionType,
    },
}

/// Registry that stores one handler per action type.
#[derive(Default)]
pub struct HandlerRegistry {
    inner: RwLock<HashMap<ActionType, Arc<dyn ActionHandler>>>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("registered", &self.list())
            .finish()
    }
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in handler for every action type.
    #[must_use]
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        let defaults: [Arc<dyn ActionHandler>; 8] = [
            Arc::new(CreateIssueHandler),
            Arc::new(AddCommentHandler),
            Arc::new(LabelsHandler::add()),
            Arc::new(LabelsHandler::remove()),
            Arc::new(ClosePullRequestHandler),
            Arc::new(CreatePullRequestHandler),
            Arc::new(UpdateProjectHandler),
            Arc::new(ProjectStatusUpdateHandler),
        ];
        {
            let mut inner = registry.inner.write().unwrap_or_else(PoisonError::into_inner);
            for handler in defaults {
                inner.insert(handler.action(), handler);
            }
        }
        registry
    }

    /// Registers a handler for the action type it reports.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateHandler`] if the type is taken.
    pub fn register<H>(&self, handler: H) -> RegistryResult<()>
    where
        H: ActionHandler + 'static,
    {
        self.register_arc(Arc::new(handler))
    }

    /// Registers a shared handler.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateHandler`] if the type is taken.
    pub fn register_arc(&self, handler: Arc<dyn ActionHandler>) -> RegistryResult<()> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let action = handler.action();
        if inner.contains_key(&action) {
            return Err(RegistryError::DuplicateHandler { action });
        }
        inner.insert(action, handler);
        Ok(())
    }

    /// Replaces (or installs) the handler for its action type.
    pub fn replace(&self, handler: Arc<dyn ActionHandler>) -> Option<Arc<dyn ActionHandler>> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.insert(handler.action(), handler)
    }

    /// Returns the handler bound to `action`.
    #[must_use]
    pub fn get(&self, action: ActionType) -> Option<Arc<dyn ActionHandler>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.get(&action).cloned()
    }

    /// Returns `true` when `action` has a handler.
    #[must_use]
    pub fn contains(&self, action: ActionType) -> bool {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.contains_key(&action)
    }

    /// Lists registered action types in canonical order.
    #[must_use]
    pub fn list(&self) -> Vec<ActionType> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        ActionType::ALL
            .into_iter()
            .filter(|action| inner.contains_key(action))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use safeout_primitives::SafeOutputRequest;

    use super::*;
    use crate::error::HandlerResult;
    use crate::handler::{HandlerContext, ValidatedAction};

    #[derive(Debug)]
    struct Custom;

    #[async_trait]
    impl ActionHandler for Custom {
        fn action(&self) -> ActionType {
            ActionType::AddComment
        }

        async fn validate(
            &self,
            _request: &SafeOutputRequest,
            _ctx: &HandlerContext,
        ) -> HandlerResult<Box<dyn ValidatedAction>> {
            Err(safeout_policy::Rejection::policy("custom handler refuses everything").into())
        }
    }

    #[test]
    fn defaults_cover_every_action_type() {
        let registry = HandlerRegistry::with_defaults();
        assert_eq!(registry.list(), ActionType::ALL.to_vec());
        for action in ActionType::ALL {
            assert_eq!(registry.get(action).unwrap().action(), action);
        }
    }

    #[test]
    fn duplicate_registration_errors() {
        let registry = HandlerRegistry::new();
        registry.register(Custom).unwrap();
        let err = registry.register(Custom).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateHandler {
                action: ActionType::AddComment
            }
        );
    }

    #[test]
    fn replace_swaps_the_default() {
        let registry = HandlerRegistry::with_defaults();
        let previous = registry.replace(Arc::new(Custom));
        assert!(previous.is_some());
        assert!(registry.contains(ActionType::AddComment));
    }

    #[test]
    fn unknown_type_is_absent() {
        let registry = HandlerRegistry::new();
        assert!(registry.get(ActionType::CreateIssue).is_none());
        assert!(registry.list().is_empty());
    }
}
