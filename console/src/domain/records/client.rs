//! Clients: people receiving care.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApiRecord, normalize};

/// Client record; also the payload for create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// Identifier; generated by the API when blank on create.
    #[serde(default)]
    pub id: String,
    /// Title (Mr, Ms, ...).
    #[serde(default)]
    pub title: String,
    /// Given name; required.
    #[serde(default)]
    pub first_name: String,
    /// Family name; required.
    #[serde(default)]
    pub last_name: String,
    /// Date of birth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<NaiveDate>,
    /// Gender.
    #[serde(default)]
    pub gender: String,
    /// Funding council.
    #[serde(rename = "councilId", default, skip_serializing_if = "Option::is_none")]
    pub council_id: Option<String>,
    /// Phone number.
    #[serde(default)]
    pub phone: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Recorded disabilities.
    #[serde(default)]
    pub disabilities: Vec<String>,
    /// Ethnicity group.
    #[serde(default)]
    pub ethnicity_type: String,
    /// Ethnicity.
    #[serde(default)]
    pub ethnicity: String,
    /// Preferred language.
    #[serde(default)]
    pub language: String,
    /// Status, `Active` unless stated.
    #[serde(default = "default_status")]
    pub status: String,
    /// Free-form extra fields, kept verbatim.
    #[serde(default)]
    pub optional_fields: Vec<Value>,
    /// Council name, when the API joins it in.
    #[serde(default, skip_serializing)]
    pub council: Option<String>,
}

fn default_status() -> String {
    "Active".to_owned()
}

impl Default for Client {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            dob: None,
            gender: String::new(),
            council_id: None,
            phone: String::new(),
            email: String::new(),
            disabilities: Vec::new(),
            ethnicity_type: String::new(),
            ethnicity: String::new(),
            language: String::new(),
            status: default_status(),
            optional_fields: Vec::new(),
            council: None,
        }
    }
}

impl Client {
    /// `first last`, trimmed.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

impl ApiRecord for Client {
    fn from_value(value: &Value) -> Self {
        let council = normalize::pick(value, &["council"]).and_then(|council| match council {
            Value::Object(_) => normalize::opt_text(council, &["name"]),
            Value::String(name) => Some(name.clone()),
            _ => None,
        });
        Self {
            id: normalize::text(value, &["id", "client_id", "clientId"]),
            title: normalize::text(value, &["title"]),
            first_name: normalize::text(value, &["first_name", "firstName"]),
            last_name: normalize::text(value, &["last_name", "lastName"]),
            dob: normalize::date(value, &["dob"]),
            gender: normalize::text(value, &["gender"]),
            council_id: normalize::opt_text(value, &["councilId", "council_id"]),
            phone: normalize::text(value, &["phone"]),
            email: normalize::text(value, &["email"]),
            disabilities: normalize::list(value, &["disabilities"])
                .iter()
                .filter_map(|entry| entry.as_str().map(str::to_owned))
                .collect(),
            ethnicity_type: normalize::text(value, &["ethnicity_type", "ethnicityType"]),
            ethnicity: normalize::text(value, &["ethnicity"]),
            language: normalize::text(value, &["language"]),
            status: normalize::opt_text(value, &["status"]).unwrap_or_else(default_status),
            optional_fields: normalize::list(value, &["optional_fields", "optional"]).to_vec(),
            council,
        }
    }
}
