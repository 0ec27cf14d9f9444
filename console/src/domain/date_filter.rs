//! Date parsing and the in-memory list filter shared by every panel.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Parse the date shapes the API emits.
///
/// Accepts ISO dates, optionally followed by a time part
/// (`2024-01-31`, `2024-01-31T09:00:00`), and day-first dates
/// (`31/01/2024`).
///
/// # Examples
/// ```
/// use care_console::domain::parse_flexible_date;
/// use chrono::NaiveDate;
///
/// let expected = NaiveDate::from_ymd_opt(2024, 1, 31);
/// assert_eq!(parse_flexible_date("2024-01-31T10:00:00Z"), expected);
/// assert_eq!(parse_flexible_date("31/01/2024"), expected);
/// assert_eq!(parse_flexible_date("soon"), None);
/// ```
#[must_use]
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.contains('/') {
        return NaiveDate::parse_from_str(trimmed, "%d/%m/%Y").ok();
    }
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Inclusive date window.
///
/// With neither bound set the range passes everything through, including
/// undated records. Once a bound is set, undated records are excluded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Earliest date kept, inclusive.
    pub from: Option<NaiveDate>,
    /// Latest date kept, inclusive.
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Range with both bounds optional.
    #[must_use]
    pub const fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// Whether any bound is set.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// Whether a record dated `date` is kept.
    #[must_use]
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        if !self.is_active() {
            return true;
        }
        let Some(day) = date else {
            return false;
        };
        self.from.is_none_or(|from| day >= from) && self.to.is_none_or(|to| day <= to)
    }
}

/// Filter applied to a panel's loaded list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Date window over the schema's record date.
    #[serde(default)]
    pub range: DateRange,
    /// Case-insensitive search over the schema's search text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl RecordFilter {
    /// Date-only filter.
    #[must_use]
    pub const fn dates(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self {
            range: DateRange::new(from, to),
            text: None,
        }
    }

    /// Text-only filter; blank text clears the search.
    pub fn search(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            range: DateRange::default(),
            text: Some(text).filter(|t| !t.trim().is_empty()),
        }
    }

    /// Whether the filter keeps everything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !self.range.is_active() && self.text.is_none()
    }

    /// Whether a record with `date` and `haystack` passes.
    #[must_use]
    pub fn matches(&self, date: Option<NaiveDate>, haystack: &str) -> bool {
        let text_ok = self.text.as_deref().is_none_or(|needle| {
            haystack
                .to_lowercase()
                .contains(needle.trim().to_lowercase().as_str())
        });
        text_ok && self.range.contains(date)
    }
}
