//! Per-resource parameters of the generic panel.

use chrono::NaiveDate;
use pagination::PageSize;
use serde::Serialize;
use serde_json::Value;

use crate::domain::Error;
use crate::domain::permissions::Resource;
use crate::domain::ports::ResourcePath;
use crate::domain::records::ApiRecord;

/// What the editor is working on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EditTarget {
    /// A record that does not exist yet.
    New,
    /// The record with this identifier.
    Existing(String),
}

/// Page to show after a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAnchor {
    /// Stay on the current page, clamped to the new page count.
    Keep,
    /// Jump to the last page, where appended rows land.
    Last,
}

/// Required-field or business-rule failure detected before any request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    /// Failure with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Self::invalid_request(err.0)
    }
}

/// Fail with `message` when `value` is blank.
///
/// # Errors
///
/// Returns [`ValidationError`] carrying `message`.
pub fn require_text(value: &str, message: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new(message))
    } else {
        Ok(())
    }
}

/// Describes one resource to [`super::ResourcePanel`].
pub trait ResourceSchema: Send + Sync {
    /// Normalised record type.
    type Record: ApiRecord + Clone + Serialize + Send + Sync;
    /// Payload submitted by the editor.
    type Draft: Serialize + Send + Sync;

    /// Resource checked by the gate.
    const RESOURCE: Resource;

    /// Collection endpoint.
    fn collection(&self) -> ResourcePath;

    /// Key wrapping the list in collection responses, if any.
    fn envelope(&self) -> Option<&'static str> {
        None
    }

    /// Endpoint of one record.
    fn record_path(&self, id: &str) -> ResourcePath {
        self.collection().child(id)
    }

    /// Rows per page.
    fn page_size(&self) -> PageSize {
        PageSize::default()
    }

    /// Identifier of `record`.
    fn record_id(record: &Self::Record) -> &str;

    /// Apply the display order in place; API order by default.
    fn order(&self, _records: &mut [Self::Record]) {}

    /// Date used by date-range filters.
    fn record_date(_record: &Self::Record) -> Option<NaiveDate> {
        None
    }

    /// Text searched by free-text filters.
    fn search_text(record: &Self::Record) -> String;

    /// Check a draft before it is sent.
    ///
    /// # Errors
    ///
    /// Returns the message to show the operator.
    fn validate(&self, draft: &Self::Draft, target: &EditTarget) -> Result<(), ValidationError>;

    /// Body of the status PATCH, or `None` when the resource has no status.
    fn status_body(&self, _enabled: bool) -> Option<Value> {
        None
    }

    /// Page shown after creating a record.
    fn after_create(&self) -> PageAnchor {
        PageAnchor::Keep
    }

    /// Confirmation prompt for deleting `record`.
    fn delete_prompt(record: &Self::Record) -> String;
}
