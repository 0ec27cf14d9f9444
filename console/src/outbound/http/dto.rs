//! Wire shapes of the authentication endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::ports::{ApiError, LoginGrant};
use crate::domain::{BearerToken, LoginCredentials, SessionUser};

#[derive(Debug, Serialize)]
pub(super) struct LoginRequestDto<'a> {
    username: &'a str,
    password: &'a str,
}

impl<'a> From<&'a LoginCredentials> for LoginRequestDto<'a> {
    fn from(credentials: &'a LoginCredentials) -> Self {
        Self {
            username: credentials.username(),
            password: credentials.password(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginResponseDto {
    token: String,
    user: Value,
}

impl LoginResponseDto {
    pub(super) fn into_grant(self) -> Result<LoginGrant, ApiError> {
        if self.token.trim().is_empty() {
            return Err(ApiError::decode("login response carried an empty token"));
        }
        Ok(LoginGrant {
            token: BearerToken::new(self.token),
            user: decode_user(&self.user)?,
        })
    }
}

pub(super) fn decode_user(value: &Value) -> Result<SessionUser, ApiError> {
    SessionUser::from_value(value)
        .map_err(|err| ApiError::decode(format!("invalid user payload: {err}")))
}
