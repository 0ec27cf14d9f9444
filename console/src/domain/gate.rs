//! Permission gate wrapped around every panel action.
//!
//! A denied action is reported twice: once to the operator through
//! [`UserFeedback::alert`] and once to the caller as a typed
//! [`GateOutcome::Denied`], so drivers never have to parse the message.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info};

use super::permissions::{Action, Resource};
use super::ports::UserFeedback;
use super::session::AuthorizationContext;

/// Permission check that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Access denied: you do not have permission to {action} {resource}.")]
pub struct Denial {
    /// Resource the action targeted.
    pub resource: Resource,
    /// Action that was refused.
    pub action: Action,
}

/// Result of running an action through the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum GateOutcome<T> {
    /// The action ran and produced `T` (which may itself be an error).
    Granted(T),
    /// The action did not run.
    Denied(Denial),
}

impl<T> GateOutcome<T> {
    /// Whether the action ran.
    pub const fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }

    /// Convert into a `Result`, treating denial as the error.
    ///
    /// # Errors
    ///
    /// Returns the [`Denial`] when the action did not run.
    pub fn into_result(self) -> Result<T, Denial> {
        match self {
            Self::Granted(value) => Ok(value),
            Self::Denied(denial) => Err(denial),
        }
    }
}

/// Checks actions against an injected [`AuthorizationContext`].
#[derive(Clone)]
pub struct ActionGate {
    context: Arc<AuthorizationContext>,
    feedback: Arc<dyn UserFeedback>,
}

impl fmt::Debug for ActionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionGate")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl ActionGate {
    /// Gate over `context` reporting denials to `feedback`.
    pub fn new(context: Arc<AuthorizationContext>, feedback: Arc<dyn UserFeedback>) -> Self {
        Self { context, feedback }
    }

    /// Authorization context in use.
    #[must_use]
    pub fn context(&self) -> &AuthorizationContext {
        &self.context
    }

    /// Operator feedback sink.
    #[must_use]
    pub fn feedback(&self) -> &dyn UserFeedback {
        self.feedback.as_ref()
    }

    /// Check-only form: alert and fail on denial.
    ///
    /// # Errors
    ///
    /// Returns [`Denial`] when the context does not allow the action.
    pub fn authorize(&self, resource: Resource, action: Action) -> Result<(), Denial> {
        if self.context.allows(resource, action) {
            debug!(%resource, %action, "action permitted");
            return Ok(());
        }
        let denial = Denial { resource, action };
        info!(%resource, %action, "action denied");
        self.feedback.alert(&denial.to_string());
        Err(denial)
    }

    /// Run `proceed` when permitted.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use care_console::domain::{
    ///     Action, ActionGate, AuthorizationContext, GateOutcome, Resource, SessionUser,
    /// };
    /// use care_console::domain::ports::FixtureFeedback;
    ///
    /// let ctx = AuthorizationContext::for_user(SessionUser::super_admin("root"));
    /// let gate = ActionGate::new(Arc::new(ctx), Arc::new(FixtureFeedback));
    /// let outcome = gate.require(Resource::Client, Action::Delete, || 7);
    /// assert_eq!(outcome, GateOutcome::Granted(7));
    /// ```
    pub fn require<T, F>(&self, resource: Resource, action: Action, proceed: F) -> GateOutcome<T>
    where
        F: FnOnce() -> T,
    {
        match self.authorize(resource, action) {
            Ok(()) => GateOutcome::Granted(proceed()),
            Err(denial) => GateOutcome::Denied(denial),
        }
    }

    /// Async form of [`Self::require`]; `proceed` is not polled on denial.
    pub async fn require_async<T, F, Fut>(
        &self,
        resource: Resource,
        action: Action,
        proceed: F,
    ) -> GateOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        match self.authorize(resource, action) {
            Ok(()) => GateOutcome::Granted(proceed().await),
            Err(denial) => GateOutcome::Denied(denial),
        }
    }
}
