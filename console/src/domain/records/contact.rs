//! Client address and next-of-kin history entries.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use super::{ApiRecord, normalize};

/// Postal address fields shared by addresses and kin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    /// House number or name.
    #[serde(default)]
    pub house_number: String,
    /// Street.
    #[serde(default)]
    pub street_name: String,
    /// City.
    #[serde(default)]
    pub city: String,
    /// Country.
    #[serde(default)]
    pub country: String,
    /// Postcode.
    #[serde(default)]
    pub postcode: String,
}

impl PostalAddress {
    fn from_value(value: &Value) -> Self {
        Self {
            house_number: normalize::text(value, &["house_number", "house_no"]),
            street_name: normalize::text(value, &["street_name", "street"]),
            city: normalize::text(value, &["city"]),
            country: normalize::text(value, &["country"]),
            postcode: normalize::text(value, &["postcode"]),
        }
    }

    /// Single-line rendering that skips blank parts.
    #[must_use]
    pub fn one_line(&self) -> String {
        let street = format!("{} {}", self.house_number, self.street_name);
        [
            street.trim(),
            self.city.as_str(),
            self.country.as_str(),
            self.postcode.as_str(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

const CURRENT_KEYS: [&str; 2] = ["is_current", "isCurrent"];

/// Current-entry marker of a history entry.
///
/// A key sent as `null` still counts as a marker: it switches the list to
/// flag-based selection without making the entry current or former.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CurrentMarker {
    /// The API sent no marker key.
    #[default]
    Absent,
    /// The key is present but null or unreadable.
    Unset,
    /// Marked as the current entry.
    Current,
    /// Marked as an older entry.
    Former,
}

impl CurrentMarker {
    fn read(value: &Value) -> Self {
        if !CURRENT_KEYS.iter().any(|key| value.get(*key).is_some()) {
            return Self::Absent;
        }
        match normalize::flag(value, &CURRENT_KEYS) {
            Some(true) => Self::Current,
            Some(false) => Self::Former,
            None => Self::Unset,
        }
    }

    /// True when no marker key was sent.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Boolean value of the marker, if it has one.
    #[must_use]
    pub const fn flag(self) -> Option<bool> {
        match self {
            Self::Current => Some(true),
            Self::Former => Some(false),
            Self::Absent | Self::Unset => None,
        }
    }
}

impl Serialize for CurrentMarker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.flag().serialize(serializer)
    }
}

/// Entry in a client's address history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Address {
    /// Address fields.
    #[serde(flatten)]
    pub postal: PostalAddress,
    /// Current marker, when the API sends one.
    #[serde(skip_serializing_if = "CurrentMarker::is_absent")]
    pub is_current: CurrentMarker,
}

impl ApiRecord for Address {
    fn from_value(value: &Value) -> Self {
        Self {
            postal: PostalAddress::from_value(value),
            is_current: CurrentMarker::read(value),
        }
    }
}

/// Entry in a client's next-of-kin history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Kin {
    /// Kin name.
    pub name: String,
    /// Relationship to the client.
    pub relationship: String,
    /// Kin address.
    #[serde(flatten)]
    pub postal: PostalAddress,
    /// Kin email.
    pub email: String,
    /// Current marker, when the API sends one.
    #[serde(skip_serializing_if = "CurrentMarker::is_absent")]
    pub is_current: CurrentMarker,
}

impl ApiRecord for Kin {
    fn from_value(value: &Value) -> Self {
        Self {
            name: normalize::text(value, &["name", "kin_name"]),
            relationship: normalize::text(value, &["relationship", "kin_relationship"]),
            postal: PostalAddress::from_value(value),
            email: normalize::text(value, &["email"]),
            is_current: CurrentMarker::read(value),
        }
    }
}

/// Payload for appending a next-of-kin entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KinDraft {
    /// Kin name; required.
    pub name: String,
    /// Relationship to the client.
    #[serde(default)]
    pub relationship: String,
    /// Kin address.
    #[serde(flatten)]
    pub postal: PostalAddress,
    /// Kin email.
    #[serde(default)]
    pub email: String,
}
