//! Signed-in user and the authorization context panels are built with.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::permissions::{Action, PermissionMap, Resource};
use super::records::normalize;

/// Message shown when the stored session is unusable.
pub const SESSION_INVALID_MESSAGE: &str =
    "Your account is disabled or session expired. Please log in again.";

/// Actor recorded on statements and notes when nobody is signed in.
pub const SYSTEM_ACTOR: &str = "System";

/// Role attached to a console user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Role {
    /// Superuser; every permission check passes.
    SuperAdmin,
    /// Regular staff member; the permission map applies.
    #[default]
    Staff,
    /// Any other role string, kept verbatim.
    Other(String),
}

impl Role {
    /// Parse a role name; blank input yields the default role.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" | "STAFF" => Self::Staff,
            "SUPER_ADMIN" => Self::SuperAdmin,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Wire name of the role.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::SuperAdmin => "SUPER_ADMIN",
            Self::Staff => "STAFF",
            Self::Other(name) => name.as_str(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<String>::deserialize(deserializer)
            .map(|raw| raw.map_or_else(Self::default, |name| Self::parse(&name)))
    }
}

/// Error raised when a user payload cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionUserError {
    /// Payload was not a JSON object.
    #[error("user payload must be an object")]
    NotAnObject,
    /// Payload had no usable username.
    #[error("user payload has no username")]
    MissingUsername,
}

/// User loaded from the persisted session or the profile endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    /// Login name.
    pub username: String,
    /// Human-readable name; falls back to the username.
    pub display_name: String,
    /// Role.
    pub role: Role,
    /// Disabled users must sign in again.
    pub enabled: bool,
    /// Stored permission map.
    pub permissions: PermissionMap,
    /// Employee identifier, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emp_id: Option<String>,
}

impl SessionUser {
    /// Staff user with the given permissions.
    pub fn staff(username: impl Into<String>, permissions: PermissionMap) -> Self {
        let username = username.into();
        Self {
            display_name: username.clone(),
            username,
            role: Role::Staff,
            enabled: true,
            permissions,
            emp_id: None,
        }
    }

    /// Superuser with an empty stored map.
    pub fn super_admin(username: impl Into<String>) -> Self {
        Self {
            role: Role::SuperAdmin,
            ..Self::staff(username, PermissionMap::empty())
        }
    }

    /// Interpret a user payload leniently.
    ///
    /// `enabled` defaults to true when absent; `display_name` falls back to
    /// `name` and then the username.
    ///
    /// # Errors
    ///
    /// Fails when the payload is not an object or has no username.
    pub fn from_value(value: &Value) -> Result<Self, SessionUserError> {
        if !value.is_object() {
            return Err(SessionUserError::NotAnObject);
        }
        let username = normalize::text(value, &["username"]);
        if username.is_empty() {
            return Err(SessionUserError::MissingUsername);
        }
        let display_name = Some(normalize::text(value, &["display_name", "displayName", "name"]))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| username.clone());
        let emp_id = Some(normalize::text(value, &["emp_id", "empId"])).filter(|id| !id.is_empty());

        Ok(Self {
            display_name,
            role: Role::parse(&normalize::text(value, &["role"])),
            enabled: normalize::flag(value, &["enabled"]).unwrap_or(true),
            permissions: PermissionMap::from_value(
                normalize::pick(value, &["permissions"]).unwrap_or(&Value::Null),
            ),
            emp_id,
            username,
        })
    }
}

impl<'de> Deserialize<'de> for SessionUser {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}

/// Error returned by [`AuthorizationContext::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{SESSION_INVALID_MESSAGE}")]
pub struct SessionInvalid;

/// Explicit authorization input for gates and panels.
///
/// An anonymous context denies everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationContext {
    user: Option<SessionUser>,
}

impl AuthorizationContext {
    /// Nobody signed in.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { user: None }
    }

    /// Context for a signed-in user.
    #[must_use]
    pub const fn for_user(user: SessionUser) -> Self {
        Self { user: Some(user) }
    }

    /// Signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    /// Whether the user holds the superuser role.
    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.user
            .as_ref()
            .is_some_and(|user| user.role == Role::SuperAdmin)
    }

    /// Effective permission map: all granted for the superuser, the stored
    /// map otherwise, empty when anonymous.
    #[must_use]
    pub fn permissions(&self) -> PermissionMap {
        match &self.user {
            Some(user) if user.role == Role::SuperAdmin => PermissionMap::all(),
            Some(user) => user.permissions.clone(),
            None => PermissionMap::empty(),
        }
    }

    /// Whether `action` on `resource` is allowed.
    #[must_use]
    pub fn allows(&self, resource: Resource, action: Action) -> bool {
        self.is_super_admin()
            || self
                .user
                .as_ref()
                .is_some_and(|user| user.permissions.allows(resource, action))
    }

    /// Signed-in, enabled user.
    ///
    /// # Errors
    ///
    /// Returns [`SessionInvalid`] when anonymous or when the user is disabled.
    pub fn validate(&self) -> Result<&SessionUser, SessionInvalid> {
        self.user
            .as_ref()
            .filter(|user| user.enabled)
            .ok_or(SessionInvalid)
    }

    /// Name recorded as `created_by` / `enteredBy` on new entries.
    #[must_use]
    pub fn actor_name(&self) -> &str {
        self.user
            .as_ref()
            .map_or(SYSTEM_ACTOR, |user| user.display_name.as_str())
    }
}
