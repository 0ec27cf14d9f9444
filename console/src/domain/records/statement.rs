//! Statement lines of a service.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApiRecord, normalize};

/// One ledger line as stored by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    /// Identifier; read from `_id`, `statementId` or `id`.
    pub id: String,
    /// Value date; undated rows sort first.
    pub date: Option<NaiveDate>,
    /// Line description.
    pub description: String,
    /// Amount paid in.
    #[serde(with = "rust_decimal::serde::float")]
    pub credit: Decimal,
    /// Amount paid out.
    #[serde(with = "rust_decimal::serde::float")]
    pub debit: Decimal,
    /// Operator who recorded the line.
    pub entered_by: String,
}

impl ApiRecord for Statement {
    fn from_value(value: &Value) -> Self {
        Self {
            id: normalize::text(value, &["_id", "statementId", "id"]),
            date: normalize::date(value, &["date"]),
            description: normalize::text(value, &["description"]),
            credit: normalize::amount(value, &["credit"]),
            debit: normalize::amount(value, &["debit"]),
            entered_by: normalize::text(value, &["enteredBy", "entered_by"]),
        }
    }
}

/// Payload for creating or updating a statement line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementDraft {
    /// Value date.
    pub date: NaiveDate,
    /// Line description; required.
    pub description: String,
    /// Amount paid in.
    #[serde(with = "rust_decimal::serde::float", default)]
    pub credit: Decimal,
    /// Amount paid out.
    #[serde(with = "rust_decimal::serde::float", default)]
    pub debit: Decimal,
    /// Operator recording the line.
    #[serde(default)]
    pub entered_by: String,
}
