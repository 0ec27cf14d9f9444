//! Driven port for the authentication endpoints.

use async_trait::async_trait;

use super::ApiError;
use crate::domain::{BearerToken, LoginCredentials, SessionUser};

/// Token and user returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginGrant {
    /// Bearer token for later requests.
    pub token: BearerToken,
    /// Signed-in user.
    pub user: SessionUser,
}

/// Login and profile lookup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST auth/login`.
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginGrant, ApiError>;

    /// `GET user/profile` for the token's owner.
    async fn profile(&self, token: &BearerToken) -> Result<SessionUser, ApiError>;
}

/// In-memory authenticator for local runs and tests.
///
/// `admin` / `password` signs in as a superuser; anything else is rejected.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAuthApi;

const FIXTURE_TOKEN: &str = "fixture-token";

#[async_trait]
impl AuthApi for FixtureAuthApi {
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginGrant, ApiError> {
        if credentials.username() == "admin" && credentials.password() == "password" {
            Ok(LoginGrant {
                token: BearerToken::new(FIXTURE_TOKEN),
                user: SessionUser::super_admin("admin"),
            })
        } else {
            Err(ApiError::unauthorized("Invalid credentials"))
        }
    }

    async fn profile(&self, token: &BearerToken) -> Result<SessionUser, ApiError> {
        if token.expose() == FIXTURE_TOKEN {
            Ok(SessionUser::super_admin("admin"))
        } else {
            Err(ApiError::unauthorized("Missing/Invalid token"))
        }
    }
}
