//! Driven port for the persisted session (token and user).

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::define_port_error;
use crate::domain::{BearerToken, Error, SessionUser};

define_port_error! {
    /// Failures raised by session stores.
    pub enum SessionStoreError {
        /// Storage could not be read or written.
        Io {
            /// Underlying failure.
            message: String,
        } => "session storage failed: {message}",
        /// Stored data was not a valid session.
        Corrupt {
            /// Parser failure.
            message: String,
        } => "stored session is corrupt: {message}",
    }
}

impl From<SessionStoreError> for Error {
    fn from(err: SessionStoreError) -> Self {
        Error::internal(err.to_string())
    }
}

/// Session persisted between console runs.
///
/// The token is stored as issued and never verified client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    /// Bearer token.
    pub token: BearerToken,
    /// User captured at login or last profile refresh.
    pub user: SessionUser,
}

/// Persistence for [`StoredSession`].
#[cfg_attr(test, mockall::automock)]
pub trait SessionStore: Send + Sync {
    /// Read the stored session; `Ok(None)` when nothing is stored.
    fn load(&self) -> Result<Option<StoredSession>, SessionStoreError>;

    /// Replace the stored session.
    fn save(&self, session: &StoredSession) -> Result<(), SessionStoreError>;

    /// Remove any stored session.
    fn clear(&self) -> Result<(), SessionStoreError>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<StoredSession>>,
}

impl MemorySessionStore {
    /// Store pre-seeded with `session`.
    #[must_use]
    pub const fn with_session(session: StoredSession) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<StoredSession>>, SessionStoreError> {
        self.session
            .lock()
            .map_err(|err| SessionStoreError::io(err.to_string()))
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<StoredSession>, SessionStoreError> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, session: &StoredSession) -> Result<(), SessionStoreError> {
        *self.lock()? = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        *self.lock()? = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::PermissionMap;

    #[test]
    fn memory_store_round_trips_and_clears() {
        let store = MemorySessionStore::default();
        assert_eq!(store.load().expect("load"), None);

        let session = StoredSession {
            token: BearerToken::new("t"),
            user: SessionUser::staff("amy", PermissionMap::empty()),
        };
        store.save(&session).expect("save");
        assert_eq!(store.load().expect("load"), Some(session));

        store.clear().expect("clear");
        assert_eq!(store.load().expect("load"), None);
    }
}
