//! Free-text notes attached to a service.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApiRecord, normalize};

/// Note as listed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    /// Identifier.
    pub id: String,
    /// Date the note refers to.
    pub note_date: Option<NaiveDate>,
    /// Note body.
    pub description: String,
    /// Author; `System` when unknown.
    pub created_by: String,
    /// Creation date, used for ordering when `note_date` is missing.
    pub created_at: Option<NaiveDate>,
}

impl Note {
    /// Date used for ordering and filtering.
    #[must_use]
    pub fn effective_date(&self) -> Option<NaiveDate> {
        self.note_date.or(self.created_at)
    }
}

impl ApiRecord for Note {
    fn from_value(value: &Value) -> Self {
        Self {
            id: normalize::text(value, &["id", "note_id", "noteId"]),
            note_date: normalize::date(value, &["note_date", "noteDate"]),
            description: normalize::text(value, &["description"]),
            created_by: normalize::opt_text(value, &["created_by", "createdBy"])
                .unwrap_or_else(|| crate::domain::session::SYSTEM_ACTOR.to_owned()),
            created_at: normalize::date(value, &["created_at", "createdAt"]),
        }
    }
}

/// Payload for creating or updating a note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    /// Date the note refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_date: Option<NaiveDate>,
    /// Note body; required.
    pub description: String,
    /// Author.
    #[serde(default)]
    pub created_by: String,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_author_defaults_to_system_and_date_falls_back() {
        let note = Note::from_value(&json!({
            "id": 4,
            "description": "Called family",
            "created_at": "2024-05-02T08:00:00"
        }));
        assert_eq!(note.created_by, "System");
        assert_eq!(note.effective_date(), NaiveDate::from_ymd_opt(2024, 5, 2));
    }
}
