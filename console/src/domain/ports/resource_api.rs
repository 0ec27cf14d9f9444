//! Driven port for the REST resource endpoints.
//!
//! Panels speak raw JSON through this port and normalise records themselves,
//! so one adapter serves every resource.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use super::define_port_error;
use crate::domain::Error;

define_port_error! {
    /// Failures reported by API adapters.
    pub enum ApiError {
        /// The API could not be reached, timed out or failed server-side.
        Transport {
            /// Underlying failure.
            message: String,
        } => "API request failed: {message}",
        /// The API rejected the bearer token or credentials (401).
        Unauthorized {
            /// Server detail.
            message: String,
        } => "API rejected the session: {message}",
        /// The API refused the action (403).
        Forbidden {
            /// Server detail.
            message: String,
        } => "API refused access: {message}",
        /// The addressed record does not exist (404).
        NotFound {
            /// Server detail.
            message: String,
        } => "not found: {message}",
        /// Any other client error.
        Rejected {
            /// HTTP status.
            status: u16,
            /// Server detail.
            message: String,
        } => "API rejected the request ({status}): {message}",
        /// The response body was not the expected JSON.
        Decode {
            /// Parser failure.
            message: String,
        } => "API response could not be decoded: {message}",
    }
}

impl ApiError {
    /// Server-side explanation without the category prefix.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::Transport { message }
            | Self::Unauthorized { message }
            | Self::Forbidden { message }
            | Self::NotFound { message }
            | Self::Rejected { message, .. }
            | Self::Decode { message } => message.as_str(),
        }
    }
}

/// Path of an endpoint relative to the API base URL, as raw segments.
///
/// Segments are escaped by the adapter, so identifiers containing `/` or
/// spaces stay within their segment.
///
/// # Examples
/// ```
/// use care_console::domain::ports::ResourcePath;
///
/// let path = ResourcePath::new("services").child("SV-1").child("statements");
/// assert_eq!(path.to_string(), "services/SV-1/statements");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath(Vec<String>);

impl ResourcePath {
    /// Path with a single segment.
    pub fn new(collection: impl Into<String>) -> Self {
        Self(vec![collection.into()])
    }

    /// Path extended by one segment.
    #[must_use]
    pub fn child(mut self, segment: impl Into<String>) -> Self {
        self.0.push(segment.into());
        self
    }

    /// Raw segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        self.0.as_slice()
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// JSON-over-HTTP access to resource collections.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// `GET` a collection or a single record.
    async fn get(&self, path: &ResourcePath) -> Result<Value, ApiError>;

    /// `POST` a new record.
    async fn post(&self, path: &ResourcePath, body: &Value) -> Result<Value, ApiError>;

    /// `PUT` a full update.
    async fn put(&self, path: &ResourcePath, body: &Value) -> Result<Value, ApiError>;

    /// `PATCH` a partial update such as a status toggle.
    async fn patch(&self, path: &ResourcePath, body: &Value) -> Result<Value, ApiError>;

    /// `DELETE` a record.
    async fn delete(&self, path: &ResourcePath) -> Result<(), ApiError>;
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Transport { message } => Error::service_unavailable(message),
            ApiError::Unauthorized { message } => Error::unauthorized(message),
            ApiError::Forbidden { message } => Error::forbidden(message),
            ApiError::NotFound { message } => Error::not_found(message),
            ApiError::Rejected { status, message } => {
                Error::invalid_request(message).with_details(serde_json::json!({ "status": status }))
            }
            ApiError::Decode { message } => Error::internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(ApiError::rejected(422_u16, "bad date"), "API rejected the request (422): bad date", "bad date")]
    #[case(ApiError::not_found("Client not found"), "not found: Client not found", "Client not found")]
    fn messages_and_details(#[case] err: ApiError, #[case] display: &str, #[case] detail: &str) {
        assert_eq!(err.to_string(), display);
        assert_eq!(err.detail(), detail);
    }

    #[rstest]
    #[case(ApiError::transport("timeout"), ErrorCode::ServiceUnavailable)]
    #[case(ApiError::unauthorized("Missing/Invalid token"), ErrorCode::Unauthorized)]
    #[case(ApiError::rejected(400_u16, "bad"), ErrorCode::InvalidRequest)]
    #[case(ApiError::decode("eof"), ErrorCode::InternalError)]
    fn maps_onto_driver_error_codes(#[case] err: ApiError, #[case] code: ErrorCode) {
        assert_eq!(Error::from(err).code(), code);
    }

    #[test]
    fn paths_keep_raw_segments() {
        let path = ResourcePath::new("users").child("amy smith").child("status");
        assert_eq!(path.segments(), ["users", "amy smith", "status"]);
    }
}
