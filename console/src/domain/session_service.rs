//! Session lifecycle: login, restore, profile refresh, validation, logout.
//!
//! The persisted session is a cache of the last server answer. The server
//! profile always supersedes it, and a disabled or missing user clears it.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::ports::{ApiError, AuthApi, SessionStore, StoredSession, UserFeedback};
use crate::domain::session::SESSION_INVALID_MESSAGE;
use crate::domain::{AuthorizationContext, ConsoleResult, Error, LoginCredentials};

/// Signed-in session ready to drive panels.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    /// Token and user as persisted.
    pub stored: StoredSession,
    /// Permissions derived from the user.
    pub context: Arc<AuthorizationContext>,
}

/// Session service over an [`AuthApi`] and a [`SessionStore`].
pub struct SessionService<A, S> {
    auth: Arc<A>,
    store: Arc<S>,
    feedback: Arc<dyn UserFeedback>,
}

impl<A, S> fmt::Debug for SessionService<A, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionService").finish_non_exhaustive()
    }
}

impl<A, S> Clone for SessionService<A, S> {
    fn clone(&self) -> Self {
        Self {
            auth: Arc::clone(&self.auth),
            store: Arc::clone(&self.store),
            feedback: Arc::clone(&self.feedback),
        }
    }
}

impl<A, S> SessionService<A, S>
where
    A: AuthApi,
    S: SessionStore,
{
    /// Create a service over the given ports.
    pub fn new(auth: Arc<A>, store: Arc<S>, feedback: Arc<dyn UserFeedback>) -> Self {
        Self {
            auth,
            store,
            feedback,
        }
    }

    /// Sign in and persist the session.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ErrorCode::InvalidRequest`] for blank
    /// credentials, the mapped API error when login fails, or
    /// [`crate::domain::ErrorCode::Unauthorized`] when the account is
    /// disabled.
    pub async fn login(&self, username: &str, password: &str) -> ConsoleResult<ActiveSession> {
        let credentials = LoginCredentials::try_from_parts(username, password)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let grant = self.auth.login(&credentials).await.map_err(|err| {
            warn!(username = credentials.username(), error = %err, "login failed");
            Error::from(err)
        })?;
        let stored = StoredSession {
            token: grant.token,
            user: grant.user,
        };
        let context = self.validate(Some(&stored))?;
        self.store.save(&stored)?;
        info!(username = %stored.user.username, role = %stored.user.role.as_str(), "signed in");
        Ok(ActiveSession {
            stored,
            context: Arc::new(context),
        })
    }

    /// Read the persisted session.
    ///
    /// Absent or unreadable data yields `None`; corrupt data is cleared.
    #[must_use]
    pub fn restore(&self) -> Option<StoredSession> {
        match self.store.load() {
            Ok(stored) => stored,
            Err(err) => {
                warn!(error = %err, "discarding stored session");
                if let Err(clear_err) = self.store.clear() {
                    warn!(error = %clear_err, "could not clear stored session");
                }
                None
            }
        }
    }

    /// Replace the stored user with the server profile.
    ///
    /// # Errors
    ///
    /// A rejected token invalidates the session; other API failures are
    /// returned without touching the stored session.
    pub async fn refresh_profile(&self, stored: &StoredSession) -> ConsoleResult<StoredSession> {
        let user = match self.auth.profile(&stored.token).await {
            Ok(user) => user,
            Err(ApiError::Unauthorized { message }) => {
                debug!(%message, "profile rejected the token");
                return Err(self.invalidate());
            }
            Err(err) => return Err(err.into()),
        };
        let refreshed = StoredSession {
            token: stored.token.clone(),
            user,
        };
        self.store.save(&refreshed)?;
        Ok(refreshed)
    }

    /// Authorization context for `stored`, requiring an enabled user.
    ///
    /// # Errors
    ///
    /// A missing or disabled user clears the store, alerts the operator and
    /// returns [`crate::domain::ErrorCode::Unauthorized`].
    pub fn validate(&self, stored: Option<&StoredSession>) -> ConsoleResult<AuthorizationContext> {
        let context = stored.map_or_else(AuthorizationContext::anonymous, |session| {
            AuthorizationContext::for_user(session.user.clone())
        });
        match context.validate() {
            Ok(_) => Ok(context),
            Err(_) => Err(self.invalidate()),
        }
    }

    /// Restore, refresh from the server and validate in one step.
    ///
    /// # Errors
    ///
    /// See [`Self::refresh_profile`] and [`Self::validate`].
    pub async fn resume(&self) -> ConsoleResult<ActiveSession> {
        let Some(stored) = self.restore() else {
            return Err(self.invalidate());
        };
        let stored = self.refresh_profile(&stored).await?;
        let context = self.validate(Some(&stored))?;
        Ok(ActiveSession {
            stored,
            context: Arc::new(context),
        })
    }

    /// Forget the persisted session.
    ///
    /// # Errors
    ///
    /// Fails when the store cannot be cleared.
    pub fn logout(&self) -> ConsoleResult<()> {
        self.store.clear()?;
        info!("signed out");
        Ok(())
    }

    fn invalidate(&self) -> Error {
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "could not clear stored session");
        }
        self.feedback.alert(SESSION_INVALID_MESSAGE);
        Error::unauthorized(SESSION_INVALID_MESSAGE)
    }
}
