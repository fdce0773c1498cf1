//! Systems report formats and attachment naming

use std::fmt;
use std::str::FromStr;

use crate::domain::DomainError;

/// File name used when the server does not name the pdf attachment.
pub const DEFAULT_PDF_NAME: &str = "katello_systems_report.pdf";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Html,
    Csv,
    Pdf,
}

impl ReportFormat {
    /// MIME type sent in the `Accept` header.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Text => "text/plain",
            Self::Html => "text/html",
            Self::Csv => "text/csv",
            Self::Pdf => "application/pdf",
        }
    }

    /// Binary formats are written to a file instead of stdout.
    pub fn is_attachment(self) -> bool {
        matches!(self, Self::Pdf)
    }
}

impl FromStr for ReportFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "html" => Ok(Self::Html),
            "csv" => Ok(Self::Csv),
            "pdf" => Ok(Self::Pdf),
            other => Err(DomainError::UnknownReportFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Text => "text",
            Self::Html => "html",
            Self::Csv => "csv",
            Self::Pdf => "pdf",
        };
        f.write_str(s)
    }
}

/// Extract the file name from a `Content-Disposition` header value.
///
/// Falls back to `default` when the header is absent or carries no usable name.
/// Any directory part of the suggested name is dropped.
pub fn attachment_file_name(content_disposition: Option<&str>, default: &str) -> String {
    let Some(header) = content_disposition else {
        return default.to_string();
    };
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"'))
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default.to_string())
}
