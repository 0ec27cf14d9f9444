//! Console settings loaded via OrthoConfig.
//!
//! Values come from `CARE_CONSOLE_*` environment variables or a config file;
//! command-line flags in the binary override them.

use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

/// API base used when none is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api/";

const DEFAULT_SESSION_FILE: &str = "care-console-session.json";

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// The API base URL did not parse.
    #[error("invalid API base URL `{value}`: {message}")]
    InvalidBaseUrl {
        /// Configured value.
        value: String,
        /// Parser failure.
        message: String,
    },
}

/// Configuration values for the console.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CARE_CONSOLE")]
pub struct ConsoleSettings {
    /// REST API base URL.
    pub api_base_url: Option<String>,
    /// Where the session token and user are persisted.
    pub session_file: Option<PathBuf>,
    /// Per-request timeout in seconds; unset means no timeout.
    pub timeout_secs: Option<u64>,
    /// Accept every confirmation prompt without asking.
    #[ortho_config(default = false)]
    pub assume_yes: bool,
}

impl ConsoleSettings {
    /// Configured API base URL, falling back to the default.
    ///
    /// A trailing slash is added so relative paths nest under the base.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidBaseUrl`] when the value does not parse.
    pub fn api_base_url(&self) -> Result<Url, SettingsError> {
        let raw = self
            .api_base_url
            .as_deref()
            .map_or(DEFAULT_API_BASE_URL, str::trim);
        let normalised = if raw.ends_with('/') {
            raw.to_owned()
        } else {
            format!("{raw}/")
        };
        Url::parse(&normalised).map_err(|err| SettingsError::InvalidBaseUrl {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    /// Configured session file, falling back to the default.
    #[must_use]
    pub fn session_file(&self) -> PathBuf {
        self.session_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE))
    }

    /// Request timeout, when one is configured and non-zero.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
