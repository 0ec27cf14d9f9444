//! Services: managed-account and payroll arrangements attached to a client.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApiRecord, normalize};

/// Setup fee category; decides which statement kinds a service accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum SetupFee {
    /// `Managed Account Setup Cost`.
    ManagedAccount,
    /// `Payroll Setup Cost`.
    Payroll,
    /// `Managed Account and Payroll Setup Cost`.
    ManagedAccountAndPayroll,
    /// Missing or unrecognised value, kept verbatim.
    #[default]
    Unspecified,
    /// Any other label.
    Other(String),
}

impl SetupFee {
    /// Parse the wire label.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" => Self::Unspecified,
            "Managed Account Setup Cost" => Self::ManagedAccount,
            "Payroll Setup Cost" => Self::Payroll,
            "Managed Account and Payroll Setup Cost" => Self::ManagedAccountAndPayroll,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Wire label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ManagedAccount => "Managed Account Setup Cost",
            Self::Payroll => "Payroll Setup Cost",
            Self::ManagedAccountAndPayroll => "Managed Account and Payroll Setup Cost",
            Self::Unspecified => "",
            Self::Other(label) => label.as_str(),
        }
    }
}

impl fmt::Display for SetupFee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SetupFee {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SetupFee {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<String>::deserialize(deserializer)
            .map(|raw| raw.map_or(Self::Unspecified, |label| Self::parse(&label)))
    }
}

/// Service record; also the payload for create and update.
///
/// The API reports dates as `dd/mm/yyyy` and mirrors several keys in
/// snake_case; reading goes through [`ApiRecord::from_value`], writing uses
/// the camelCase names the API accepts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Service {
    /// Identifier, `SV-{client}-{seq}`; assigned by the API.
    #[serde(rename = "serviceId", skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Owning client; required.
    pub client_id: String,
    /// Referral reference.
    pub reference: String,
    /// Service type label.
    pub service_type: String,
    /// Setup fee category.
    pub setup_fee: SetupFee,
    /// Setup budget.
    #[serde(with = "rust_decimal::serde::float")]
    pub setup_budget: Decimal,
    /// First day of the service; statements may not predate it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Last day of the service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Referral category.
    pub referred_by: String,
    /// Insurer.
    pub insurance: String,
    /// Monthly management fee.
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_fee: Decimal,
    /// One-off initial fee.
    #[serde(with = "rust_decimal::serde::float")]
    pub initial_fee: Decimal,
    /// Annual pension fee.
    #[serde(with = "rust_decimal::serde::float")]
    pub pension_fee: Decimal,
    /// Pension setup cost.
    #[serde(with = "rust_decimal::serde::float")]
    pub pension_setup: Decimal,
    /// Annual fee.
    #[serde(with = "rust_decimal::serde::float")]
    pub annual_fee: Decimal,
    /// Annual year-end fee.
    #[serde(with = "rust_decimal::serde::float")]
    pub year_end_fee: Decimal,
    /// Weekly carer budget.
    #[serde(with = "rust_decimal::serde::float")]
    pub carer_budget: Decimal,
    /// Weekly agency budget.
    #[serde(with = "rust_decimal::serde::float")]
    pub agency_budget: Decimal,
    /// Carer names.
    pub carers: Vec<String>,
    /// Agency names.
    pub agency: Vec<String>,
    /// Self-employed PA names.
    pub pa: Vec<String>,
    /// Free-form extra fields, kept verbatim.
    pub optional: Vec<Value>,
    /// Free-text notes.
    pub notes: String,
}

fn names(value: &Value, key: &str) -> Vec<String> {
    normalize::list(value, &[key])
        .iter()
        .filter_map(|entry| entry.as_str().map(str::to_owned))
        .collect()
}

impl ApiRecord for Service {
    fn from_value(value: &Value) -> Self {
        Self {
            id: normalize::text(value, &["serviceId", "service_id", "id"]),
            client_id: normalize::text(value, &["clientId", "client_id"]),
            reference: normalize::text(value, &["reference"]),
            service_type: normalize::text(value, &["serviceType", "service_type"]),
            setup_fee: SetupFee::parse(&normalize::text(value, &["setupFee", "setup_fee"])),
            setup_budget: normalize::amount(value, &["setupBudget", "setup_budget"]),
            start_date: normalize::date(value, &["startDate", "start_date"]),
            end_date: normalize::date(value, &["endDate", "end_date"]),
            referred_by: normalize::text(value, &["referredBy", "referred_by"]),
            insurance: normalize::text(value, &["insurance"]),
            monthly_fee: normalize::amount(value, &["monthlyFee", "monthly_fee"]),
            initial_fee: normalize::amount(value, &["initialFee", "initial_fee"]),
            pension_fee: normalize::amount(value, &["pensionFee", "pension_fee"]),
            pension_setup: normalize::amount(value, &["pensionSetup", "pension_setup"]),
            annual_fee: normalize::amount(value, &["annualFee", "annual_fee"]),
            year_end_fee: normalize::amount(value, &["yearEndFee", "year_end_fee"]),
            carer_budget: normalize::amount(value, &["carerBudget", "carer_budget"]),
            agency_budget: normalize::amount(value, &["agencyBudget", "agency_budget"]),
            carers: names(value, "carers"),
            agency: names(value, "agency"),
            pa: names(value, "pa"),
            optional: normalize::list(value, &["optional", "optional_fields"]).to_vec(),
            notes: normalize::text(value, &["notes"]),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use std::str::FromStr;

    #[rstest]
    fn mirrored_payload_is_read_once() {
        let service = Service::from_value(&json!({
            "serviceId": "SV-0000000001-0001",
            "service_id": "SV-0000000001-0001",
            "clientId": "0000000001",
            "setupFee": "Payroll Setup Cost",
            "setup_fee": "Payroll Setup Cost",
            "startDate": "01/04/2024",
            "start_date": "01/04/2024",
            "monthlyFee": "35.5",
            "carerBudget": null,
            "carers": ["Jo"],
            "pa": "none",
            "optional_fields": [{ "label": "Ref" }]
        }));
        assert_eq!(service.id, "SV-0000000001-0001");
        assert_eq!(service.setup_fee, SetupFee::Payroll);
        assert_eq!(service.start_date, NaiveDate::from_ymd_opt(2024, 4, 1));
        assert_eq!(service.monthly_fee, Decimal::from_str("35.50").expect("decimal"));
        assert_eq!(service.carer_budget, Decimal::ZERO);
        assert_eq!(service.carers, vec!["Jo".to_owned()]);
        assert!(service.pa.is_empty());
        assert_eq!(service.optional.len(), 1);
    }

    #[rstest]
    #[case("Managed Account Setup Cost", SetupFee::ManagedAccount)]
    #[case("Managed Account and Payroll Setup Cost", SetupFee::ManagedAccountAndPayroll)]
    #[case("  ", SetupFee::Unspecified)]
    #[case("Legacy", SetupFee::Other("Legacy".to_owned()))]
    fn setup_fee_labels(#[case] raw: &str, #[case] expected: SetupFee) {
        assert_eq!(SetupFee::parse(raw), expected);
    }

    #[rstest]
    fn payload_is_camel_case_with_numeric_money() {
        let service = Service {
            client_id: "0000000001".to_owned(),
            monthly_fee: Decimal::from_str("12.25").expect("decimal"),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 2),
            ..Service::default()
        };
        let value = serde_json::to_value(&service).expect("serialise");
        assert_eq!(value["clientId"], "0000000001");
        assert_eq!(value["monthlyFee"], json!(12.25));
        assert_eq!(value["startDate"], "2024-01-02");
        assert!(value.get("serviceId").is_none());
    }
}
