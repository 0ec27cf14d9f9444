//! Driven port for server-generated statement and note reports.

use async_trait::async_trait;

use super::{ApiError, ResourcePath};
use crate::domain::date_filter::DateRange;

/// File format of a statement download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Printable statement.
    Pdf,
    /// Spreadsheet report.
    Csv,
}

impl ExportFormat {
    /// File extension and query value.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Csv => "csv",
        }
    }
}

/// Report to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportRequest {
    /// Full statement of a service, `services/{id}/statements/download`.
    Statement {
        /// Service identifier.
        service_id: String,
        /// Output format.
        format: ExportFormat,
    },
    /// Statement CSV for a date window, `services/{id}/statements/report/csv`.
    StatementReport {
        /// Service identifier.
        service_id: String,
        /// Inclusive window; open bounds are omitted.
        range: DateRange,
    },
    /// Notes CSV for a date window, `services/{id}/notes/report/csv`.
    NotesReport {
        /// Service identifier.
        service_id: String,
        /// Inclusive window; open bounds are omitted.
        range: DateRange,
    },
}

impl ExportRequest {
    /// Service the report belongs to.
    #[must_use]
    pub fn service_id(&self) -> &str {
        match self {
            Self::Statement { service_id, .. }
            | Self::StatementReport { service_id, .. }
            | Self::NotesReport { service_id, .. } => service_id.as_str(),
        }
    }

    /// Endpoint path.
    #[must_use]
    pub fn path(&self) -> ResourcePath {
        let service = ResourcePath::new("services").child(self.service_id());
        match self {
            Self::Statement { .. } => service.child("statements").child("download"),
            Self::StatementReport { .. } => service.child("statements").child("report").child("csv"),
            Self::NotesReport { .. } => service.child("notes").child("report").child("csv"),
        }
    }

    /// Query parameters.
    #[must_use]
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Statement { format, .. } => vec![("format", format.extension().to_owned())],
            Self::StatementReport { range, .. } | Self::NotesReport { range, .. } => [
                ("start", range.from),
                ("end", range.to),
            ]
            .into_iter()
            .filter_map(|(key, day)| day.map(|d| (key, d.format("%Y-%m-%d").to_string())))
            .collect(),
        }
    }

    /// Filename used when the response names none.
    #[must_use]
    pub fn fallback_filename(&self) -> String {
        match self {
            Self::Statement { service_id, format } => {
                format!("Statement_{service_id}.{}", format.extension())
            }
            Self::StatementReport { service_id, .. } => format!("Statement_Report_{service_id}.csv"),
            Self::NotesReport { service_id, .. } => format!("Notes_{service_id}.csv"),
        }
    }
}

/// Downloaded report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Suggested filename.
    pub filename: String,
    /// Declared content type, if any.
    pub content_type: Option<String>,
    /// File content.
    pub bytes: Vec<u8>,
}

/// Extract the filename from a `Content-Disposition` header value.
///
/// # Examples
/// ```
/// use care_console::domain::ports::filename_from_disposition;
///
/// assert_eq!(
///     filename_from_disposition(r#"attachment; filename="Statement_SV-1.pdf""#),
///     Some("Statement_SV-1.pdf".to_owned())
/// );
/// assert_eq!(filename_from_disposition("inline"), None);
/// ```
#[must_use]
pub fn filename_from_disposition(header: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("filename"))
        .map(|(_, value)| value.trim().trim_matches('"').to_owned())
        .filter(|name| !name.is_empty())
}

/// Report downloads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExportApi: Send + Sync {
    /// Fetch the report file.
    async fn download(&self, request: &ExportRequest) -> Result<Download, ApiError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    #[rstest]
    fn statement_download_addresses_the_pdf_endpoint() {
        let request = ExportRequest::Statement {
            service_id: "SV-1".to_owned(),
            format: ExportFormat::Pdf,
        };
        assert_eq!(request.path().to_string(), "services/SV-1/statements/download");
        assert_eq!(request.query(), vec![("format", "pdf".to_owned())]);
        assert_eq!(request.fallback_filename(), "Statement_SV-1.pdf");
    }

    #[rstest]
    fn reports_omit_open_bounds() {
        let request = ExportRequest::NotesReport {
            service_id: "SV-2".to_owned(),
            range: DateRange::new(NaiveDate::from_ymd_opt(2024, 1, 1), None),
        };
        assert_eq!(request.path().to_string(), "services/SV-2/notes/report/csv");
        assert_eq!(request.query(), vec![("start", "2024-01-01".to_owned())]);
        assert_eq!(request.fallback_filename(), "Notes_SV-2.csv");
    }

    #[rstest]
    #[case("attachment; filename=report.csv", Some("report.csv"))]
    #[case("attachment; FILENAME=\"a b.pdf\"", Some("a b.pdf"))]
    #[case("attachment; filename=\"\"", None)]
    fn disposition_filenames(#[case] header: &str, #[case] expected: Option<&str>) {
        assert_eq!(filename_from_disposition(header).as_deref(), expected);
    }
}
