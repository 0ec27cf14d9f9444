//! Councils: local authorities that fund clients.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApiRecord, normalize};

/// Council availability flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CouncilStatus {
    /// Selectable when creating clients.
    #[default]
    Enabled,
    /// Hidden from client forms.
    Disabled,
}

impl CouncilStatus {
    /// Status for an enabled flag.
    #[must_use]
    pub const fn from_enabled(enabled: bool) -> Self {
        if enabled { Self::Enabled } else { Self::Disabled }
    }

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "Enabled",
            Self::Disabled => "Disabled",
        }
    }

    fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("disabled") {
            Self::Disabled
        } else {
            Self::Enabled
        }
    }
}

impl fmt::Display for CouncilStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Council as listed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Council {
    /// Identifier; numeric on the wire, kept as text.
    pub id: String,
    /// Council name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// Postcode.
    pub postcode: String,
    /// Availability.
    pub status: CouncilStatus,
    /// Creation date, when reported.
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDate>,
}

impl ApiRecord for Council {
    fn from_value(value: &Value) -> Self {
        Self {
            id: normalize::text(value, &["id", "council_id", "councilId"]),
            name: normalize::text(value, &["name"]),
            address: normalize::text(value, &["address"]),
            city: normalize::text(value, &["city"]),
            postcode: normalize::text(value, &["postcode"]),
            status: CouncilStatus::parse(&normalize::text(value, &["status"])),
            created_at: normalize::date(value, &["createdAt", "created_at"]),
        }
    }
}

/// Fields submitted when creating or updating a council.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouncilDraft {
    /// Council name; required.
    pub name: String,
    /// Street address.
    #[serde(default)]
    pub address: String,
    /// City.
    #[serde(default)]
    pub city: String,
    /// Postcode.
    #[serde(default)]
    pub postcode: String,
    /// Availability.
    #[serde(default)]
    pub status: CouncilStatus,
}

impl From<&Council> for CouncilDraft {
    fn from(council: &Council) -> Self {
        Self {
            name: council.name.clone(),
            address: council.address.clone(),
            city: council.city.clone(),
            postcode: council.postcode.clone(),
            status: council.status,
        }
    }
}
