//! Lenient field access over API payloads.
//!
//! The API mixes snake_case and camelCase keys and sometimes sends both for
//! the same field, so records are read from a [`Value`] by trying a list of
//! candidate keys in order rather than through derived deserialisers.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::domain::date_filter::parse_flexible_date;

/// First candidate key whose value is present and not null.
#[must_use]
pub fn pick<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .find(|field| !field.is_null())
}

/// Field as trimmed text; numbers and booleans are stringified, anything else
/// is empty.
#[must_use]
pub fn text(value: &Value, keys: &[&str]) -> String {
    match pick(value, keys) {
        Some(Value::String(s)) => s.trim().to_owned(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Field as optional text; blank becomes `None`.
#[must_use]
pub fn opt_text(value: &Value, keys: &[&str]) -> Option<String> {
    Some(text(value, keys)).filter(|s| !s.is_empty())
}

/// Boolean field; accepts booleans, `"true"`/`"false"` and `1`/`0`.
#[must_use]
pub fn flag(value: &Value, keys: &[&str]) -> Option<bool> {
    match pick(value, keys)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

/// Money field; numbers or numeric strings, anything else is zero.
#[must_use]
pub fn amount(value: &Value, keys: &[&str]) -> Decimal {
    match pick(value, keys) {
        Some(Value::Number(n)) => parse_decimal(&n.to_string()),
        Some(Value::String(s)) => parse_decimal(s),
        _ => Decimal::ZERO,
    }
}

/// Date field in any shape [`parse_flexible_date`] accepts.
#[must_use]
pub fn date(value: &Value, keys: &[&str]) -> Option<NaiveDate> {
    pick(value, keys)
        .and_then(Value::as_str)
        .and_then(parse_flexible_date)
}

/// Array field; anything that is not an array is empty.
#[must_use]
pub fn list<'a>(value: &'a Value, keys: &[&str]) -> &'a [Value] {
    pick(value, keys)
        .and_then(Value::as_array)
        .map_or(&[], Vec::as_slice)
}

/// Items of a collection response.
///
/// Accepts a bare array or an object carrying the array under
/// `envelope`; anything else is empty.
///
/// # Examples
/// ```
/// use care_console::domain::records::normalize::collection;
/// use serde_json::json;
///
/// assert_eq!(collection(&json!([1, 2]), Some("notes")).len(), 2);
/// assert_eq!(collection(&json!({ "notes": [1] }), Some("notes")).len(), 1);
/// assert!(collection(&json!({ "detail": "x" }), Some("notes")).is_empty());
/// ```
#[must_use]
pub fn collection<'a>(value: &'a Value, envelope: Option<&str>) -> &'a [Value] {
    match (value, envelope) {
        (Value::Array(items), _) => items.as_slice(),
        (Value::Object(_), Some(key)) => list(value, &[key]),
        _ => &[],
    }
}

fn parse_decimal(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map(|d| d.round_dp(2))
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn first_present_key_wins_over_later_mirrors() {
        let payload = json!({ "serviceId": "S-1", "service_id": "S-2", "id": null });
        assert_eq!(text(&payload, &["id", "serviceId", "service_id"]), "S-1");
    }

    #[rstest]
    #[case::number(json!({ "v": 12.5 }), "12.50")]
    #[case::string(json!({ "v": " 7.1 " }), "7.10")]
    #[case::scientific(json!({ "v": "1e2" }), "100")]
    #[case::null(json!({ "v": null }), "0")]
    #[case::garbage(json!({ "v": "n/a" }), "0")]
    #[case::missing(json!({}), "0")]
    fn amounts_default_to_zero(#[case] payload: Value, #[case] expected: &str) {
        let expected = Decimal::from_str(expected).expect("decimal");
        assert_eq!(amount(&payload, &["v"]), expected);
    }

    #[rstest]
    #[case(json!({ "f": true }), Some(true))]
    #[case(json!({ "f": "false" }), Some(false))]
    #[case(json!({ "f": 0 }), Some(false))]
    #[case(json!({ "f": [] }), None)]
    fn flags_accept_loose_shapes(#[case] payload: Value, #[case] expected: Option<bool>) {
        assert_eq!(flag(&payload, &["f"]), expected);
    }

    #[rstest]
    fn non_array_lists_are_empty() {
        assert!(list(&json!({ "items": "nope" }), &["items"]).is_empty());
        assert!(collection(&json!("text"), None).is_empty());
    }
}
