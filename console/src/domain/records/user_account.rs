//! Back-office user accounts managed by the superuser.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use zeroize::Zeroizing;

use super::{ApiRecord, normalize};
use crate::domain::permissions::{Action, PermissionMap};
use crate::domain::session::Role;

/// Account as listed by `GET users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAccount {
    /// Login name; the account identifier.
    pub username: String,
    /// Employee name.
    pub display_name: String,
    /// Employee identifier.
    pub emp_id: String,
    /// Role reported by the API.
    pub role: Role,
    /// Whether the account may sign in.
    pub enabled: bool,
    /// Permissions as reported.
    pub permissions: PermissionMap,
}

/// Read a listing permission map.
///
/// The listing flattens each resource to a single boolean meaning "may view";
/// full objects are read as usual.
fn listing_permissions(value: &Value) -> PermissionMap {
    let Some(object) = value.as_object() else {
        return PermissionMap::empty();
    };
    let expanded: Map<String, Value> = object
        .iter()
        .map(|(key, entry)| {
            let entry = match entry {
                Value::Bool(view) => Value::Object(Map::from_iter([(
                    Action::View.as_str().to_owned(),
                    Value::Bool(*view),
                )])),
                other => other.clone(),
            };
            (key.clone(), entry)
        })
        .collect();
    PermissionMap::from_value(&Value::Object(expanded))
}

impl ApiRecord for UserAccount {
    fn from_value(value: &Value) -> Self {
        let username = normalize::text(value, &["username"]);
        Self {
            display_name: normalize::opt_text(value, &["display_name", "emp_name"])
                .unwrap_or_else(|| username.clone()),
            emp_id: normalize::text(value, &["emp_id"]),
            role: Role::parse(&normalize::text(value, &["role"])),
            enabled: normalize::flag(value, &["enabled"]).unwrap_or(true),
            permissions: listing_permissions(
                normalize::pick(value, &["permissions"]).unwrap_or(&Value::Null),
            ),
            username,
        }
    }
}

fn expose_password<S: Serializer>(
    password: &Option<Zeroizing<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match password {
        Some(secret) => serializer.serialize_some(secret.as_str()),
        None => serializer.serialize_none(),
    }
}

fn read_password<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Zeroizing<String>>, D::Error> {
    Option::<String>::deserialize(deserializer).map(|raw| raw.map(Zeroizing::new))
}

/// Payload for creating or updating an account.
///
/// Absent fields are left untouched on update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDraft {
    /// Login name; required.
    pub username: String,
    /// Employee name; required on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emp_name: Option<String>,
    /// Employee identifier; required on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emp_id: Option<String>,
    /// New password; required on create.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "expose_password",
        deserialize_with = "read_password"
    )]
    pub password: Option<Zeroizing<String>>,
    /// Whether the account may sign in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Full permission table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<PermissionMap>,
}

impl UserDraft {
    /// Draft with every known resource present in the permission table.
    #[must_use]
    pub fn with_complete_permissions(mut self) -> Self {
        self.permissions = self.permissions.map(|map| {
            map.complete()
                .into_iter()
                .fold(PermissionMap::empty(), |acc, (resource, actions)| {
                    acc.with(resource, actions)
                })
        });
        self
    }
}

impl From<&UserAccount> for UserDraft {
    fn from(account: &UserAccount) -> Self {
        Self {
            username: account.username.clone(),
            emp_name: Some(account.display_name.clone()),
            emp_id: Some(account.emp_id.clone()),
            password: None,
            enabled: Some(account.enabled),
            permissions: Some(account.permissions.clone()),
        }
    }
}
