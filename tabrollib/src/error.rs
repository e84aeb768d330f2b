//! Error types for tabrollib

use thiserror::Error;

/// Errors that can surface while a report is being generated.
///
/// Configuration problems never appear here: invalid alignment, format,
/// or output-format names normalize to safe defaults by policy, and rows
/// missing a referenced column read as empty values. What does surface is
/// sink I/O — and it propagates as-is, with no retry and no rollback of
/// output already flushed.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Underlying stream or file write failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited writer failed
    #[error("delimited output error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet writer failed
    #[error("spreadsheet output error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// A custom sink or page device reported a failure
    #[error("sink error: {0}")]
    Sink(String),
}
