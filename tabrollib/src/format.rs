//! The fixed table of supported output formats.
//!
//! This replaces a mutable process-wide registry with an immutable enum:
//! callers enumerate [`OutputFormat::ALL`], look up MIME types and file
//! extensions for content negotiation, and map user input through the
//! permissive [`OutputFormat::from_name`].

use serde::{Deserialize, Serialize};

/// One supported output format family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// HTML table markup (default)
    #[default]
    Html,
    /// Comma-separated values
    Csv,
    /// Tab-separated values
    Tsv,
    /// XLSX spreadsheet
    Xlsx,
    /// Paginated plain text
    Text,
}

impl OutputFormat {
    /// Every supported format, in registry order.
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Html,
        OutputFormat::Csv,
        OutputFormat::Tsv,
        OutputFormat::Xlsx,
        OutputFormat::Text,
    ];

    /// Parse a format name; unknown names fall back to the first registry
    /// entry (HTML), mirroring the permissive-defaults policy.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "csv" => OutputFormat::Csv,
            "tsv" => OutputFormat::Tsv,
            "xlsx" => OutputFormat::Xlsx,
            "text" | "txt" => OutputFormat::Text,
            _ => OutputFormat::Html,
        }
    }

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Csv => "csv",
            OutputFormat::Tsv => "tsv",
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Text => "text",
        }
    }

    /// MIME type for HTTP content negotiation.
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Html => "text/html",
            OutputFormat::Csv => "text/csv",
            OutputFormat::Tsv => "text/tab-separated-values",
            OutputFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            OutputFormat::Text => "text/plain",
        }
    }

    /// File extension including the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Html => ".html",
            OutputFormat::Csv => ".csv",
            OutputFormat::Tsv => ".tsv",
            OutputFormat::Xlsx => ".xlsx",
            OutputFormat::Text => ".txt",
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            OutputFormat::Html => "HTML",
            OutputFormat::Csv => "Comma-Separated Values",
            OutputFormat::Tsv => "Tab-Separated Values",
            OutputFormat::Xlsx => "XLSX Spreadsheet",
            OutputFormat::Text => "Paginated Plain Text",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_known() {
        assert_eq!(OutputFormat::from_name("csv"), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_name("TSV"), OutputFormat::Tsv);
        assert_eq!(OutputFormat::from_name("xlsx"), OutputFormat::Xlsx);
        assert_eq!(OutputFormat::from_name("txt"), OutputFormat::Text);
    }

    #[test]
    fn test_from_name_falls_back_to_first_entry() {
        assert_eq!(OutputFormat::from_name("pdf"), OutputFormat::Html);
        assert_eq!(OutputFormat::from_name(""), OutputFormat::Html);
        assert_eq!(OutputFormat::from_name("html"), OutputFormat::Html);
    }

    #[test]
    fn test_registry_metadata() {
        for fmt in OutputFormat::ALL {
            assert!(!fmt.name().is_empty());
            assert!(fmt.extension().starts_with('.'));
            assert!(!fmt.mime_type().is_empty());
            assert!(!fmt.description().is_empty());
        }
    }
}
