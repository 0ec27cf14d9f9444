//! Resource/action permission map.
//!
//! The map is advisory: it decides which console actions are offered and
//! attempted. The API enforces its own authorization independently.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Domain noun subject to CRUD actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// Local authority funding clients.
    Council,
    /// Person receiving care.
    Client,
    /// Managed service attached to a client.
    Service,
    /// Billing statement line of a service.
    Statement,
    /// Free-text notes of a service.
    Notes,
    /// Back-office user account.
    User,
}

impl Resource {
    /// Every resource, in permission-map order.
    pub const ALL: [Self; 6] = [
        Self::Council,
        Self::Client,
        Self::Service,
        Self::Statement,
        Self::Notes,
        Self::User,
    ];

    /// Key used in permission maps and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Council => "council",
            Self::Client => "client",
            Self::Service => "service",
            Self::Statement => "statement",
            Self::Notes => "notes",
            Self::User => "user",
        }
    }
}

/// Operation applied to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Read a list or a record.
    View,
    /// Create a record.
    Add,
    /// Modify a record, including its status.
    Edit,
    /// Remove a record.
    Delete,
}

impl Action {
    /// Every action.
    pub const ALL: [Self; 4] = [Self::View, Self::Add, Self::Edit, Self::Delete];

    /// Key used in permission maps and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Add => "add",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }
}

/// Error raised when parsing an unknown resource or action name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownName {
    kind: &'static str,
    value: String,
}

impl FromStr for Resource {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|resource| resource.as_str() == key)
            .ok_or_else(|| UnknownName {
                kind: "resource",
                value: s.to_owned(),
            })
    }
}

impl FromStr for Action {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == key)
            .ok_or_else(|| UnknownName {
                kind: "action",
                value: s.to_owned(),
            })
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allowed actions on one resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "mirrors the four permission flags of the wire format"
)]
pub struct ActionSet {
    /// `view` flag.
    #[serde(default)]
    pub view: bool,
    /// `add` flag.
    #[serde(default)]
    pub add: bool,
    /// `edit` flag.
    #[serde(default)]
    pub edit: bool,
    /// `delete` flag.
    #[serde(default)]
    pub delete: bool,
}

impl ActionSet {
    /// Nothing allowed.
    pub const NONE: Self = Self {
        view: false,
        add: false,
        edit: false,
        delete: false,
    };

    /// Everything allowed.
    pub const ALL: Self = Self {
        view: true,
        add: true,
        edit: true,
        delete: true,
    };

    /// Whether `action` is allowed.
    #[must_use]
    pub const fn allows(self, action: Action) -> bool {
        match action {
            Action::View => self.view,
            Action::Add => self.add,
            Action::Edit => self.edit,
            Action::Delete => self.delete,
        }
    }

    /// Copy with `action` set to `allowed`.
    #[must_use]
    pub const fn with(mut self, action: Action, allowed: bool) -> Self {
        match action {
            Action::View => self.view = allowed,
            Action::Add => self.add = allowed,
            Action::Edit => self.edit = allowed,
            Action::Delete => self.delete = allowed,
        }
        self
    }

    fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::NONE;
        };
        Action::ALL.into_iter().fold(Self::NONE, |set, action| {
            let granted = matches!(object.get(action.as_str()), Some(Value::Bool(true)));
            set.with(action, granted)
        })
    }
}

/// Per-resource action table.
///
/// Missing resources grant nothing. Deserialisation is lenient: unknown
/// resources or actions are ignored, non-object entries grant nothing, and
/// only the JSON literal `true` grants an action.
///
/// # Examples
/// ```
/// use care_console::domain::{Action, PermissionMap, Resource};
/// use serde_json::json;
///
/// let map = PermissionMap::from_value(&json!({
///     "client": { "view": true, "edit": "yes" },
///     "service": false,
///     "reports": { "view": true }
/// }));
/// assert!(map.allows(Resource::Client, Action::View));
/// assert!(!map.allows(Resource::Client, Action::Edit));
/// assert!(!map.allows(Resource::Service, Action::View));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PermissionMap(BTreeMap<Resource, ActionSet>);

impl PermissionMap {
    /// Map granting nothing.
    #[must_use]
    pub const fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Map granting every action on every resource.
    #[must_use]
    pub fn all() -> Self {
        Self(
            Resource::ALL
                .into_iter()
                .map(|resource| (resource, ActionSet::ALL))
                .collect(),
        )
    }

    /// Parse a stored or server-provided map leniently.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::empty();
        };
        Self(
            object
                .iter()
                .filter_map(|(key, entry)| {
                    key.parse::<Resource>()
                        .ok()
                        .map(|resource| (resource, ActionSet::from_value(entry)))
                })
                .collect(),
        )
    }

    /// Builder: set the actions allowed on `resource`.
    #[must_use]
    pub fn with(mut self, resource: Resource, actions: ActionSet) -> Self {
        self.0.insert(resource, actions);
        self
    }

    /// Actions allowed on `resource`; all false when absent.
    #[must_use]
    pub fn actions(&self, resource: Resource) -> ActionSet {
        self.0.get(&resource).copied().unwrap_or(ActionSet::NONE)
    }

    /// Whether `action` on `resource` is allowed.
    #[must_use]
    pub fn allows(&self, resource: Resource, action: Action) -> bool {
        self.actions(resource).allows(action)
    }

    /// Full table with every known resource present, defaulting to all false.
    #[must_use]
    pub fn complete(&self) -> BTreeMap<Resource, ActionSet> {
        Resource::ALL
            .into_iter()
            .map(|resource| (resource, self.actions(resource)))
            .collect()
    }

    /// Wire form `{resource: {view, add, edit, delete}}`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let object: Map<String, Value> = self
            .0
            .iter()
            .map(|(resource, actions)| {
                let flags: Map<String, Value> = Action::ALL
                    .into_iter()
                    .map(|action| (action.as_str().to_owned(), Value::Bool(actions.allows(action))))
                    .collect();
                (resource.as_str().to_owned(), Value::Object(flags))
            })
            .collect();
        Value::Object(object)
    }
}

impl<'de> Deserialize<'de> for PermissionMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|value| Self::from_value(&value))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::not_an_object(json!("admin"))]
    #[case::null(json!(null))]
    #[case::array(json!([{ "client": { "view": true } }]))]
    fn malformed_maps_deny_everything(#[case] value: Value) {
        let map = PermissionMap::from_value(&value);
        for resource in Resource::ALL {
            for action in Action::ALL {
                assert!(!map.allows(resource, action), "{resource}.{action}");
            }
        }
    }

    #[rstest]
    #[case::literal_true(json!(true), true)]
    #[case::string_true(json!("true"), false)]
    #[case::one(json!(1), false)]
    #[case::literal_false(json!(false), false)]
    fn only_literal_true_grants(#[case] flag: Value, #[case] expected: bool) {
        let map = PermissionMap::from_value(&json!({ "notes": { "delete": flag } }));
        assert_eq!(map.allows(Resource::Notes, Action::Delete), expected);
    }

    #[test]
    fn unknown_resources_and_actions_are_ignored() {
        let map = PermissionMap::from_value(&json!({
            "reports": { "view": true },
            "council": { "approve": true, "view": true },
        }));
        assert_eq!(map.actions(Resource::Council), ActionSet::NONE.with(Action::View, true));
        assert_eq!(map.complete().len(), Resource::ALL.len());
    }

    #[test]
    fn wire_form_round_trips_through_the_lenient_parser() {
        let map = PermissionMap::empty().with(
            Resource::Statement,
            ActionSet::NONE.with(Action::View, true).with(Action::Add, true),
        );
        let value = map.to_value();
        assert_eq!(value["statement"]["add"], json!(true));
        assert_eq!(value["statement"]["delete"], json!(false));
        let back: PermissionMap = serde_json::from_value(value).expect("deserialise");
        assert_eq!(back, map);
    }

    #[rstest]
    #[case(" Client ", Ok(Resource::Client))]
    #[case("notes", Ok(Resource::Notes))]
    fn resource_names_parse_case_insensitively(
        #[case] raw: &str,
        #[case] expected: Result<Resource, UnknownName>,
    ) {
        assert_eq!(raw.parse::<Resource>(), expected);
    }

    #[test]
    fn unknown_action_name_is_reported() {
        let err = "approve".parse::<Action>().expect_err("unknown action");
        assert_eq!(err.to_string(), "unknown action `approve`");
    }
}
