//! # tabrollib
//!
//! A streaming, multi-level grouped report generator. Feed it flat data
//! rows one at a time; it groups them into nested levels, keeps running
//! totals per level, and renders the result through a pluggable sink —
//! HTML table, CSV/TSV, XLSX workbook, or paginated plain text.
//!
//! ## Overview
//!
//! A report is configured from two descriptor lists:
//!
//! - [`Column`]s describe the output grid: headings, alignment, numeric
//!   formatting, duplicate suppression, and which levels they total at.
//! - [`Level`]s describe the grouping hierarchy, outermost first: which
//!   columns identify a group, and how its totals row is captioned.
//!
//! The [`Report`] engine detects group boundaries by comparing each row's
//! identity columns against the previous row, flushes pending totals
//! innermost-first when one crosses, and blanks repeated group keys. The
//! rendering target is any [`Sink`] implementation; the engine itself
//! never branches on output format.
//!
//! ## Example
//!
//! ```rust
//! use tabrollib::{Column, Destination, DelimitedSink, Level, Record, Report};
//!
//! let columns = vec![
//!     Column::new("client", "Client"),
//!     Column::new("amount", "Amount").number(2).totals_at(["client"]),
//! ];
//! let levels = vec![Level::new("client", ["client"])];
//!
//! let sink = DelimitedSink::csv(Destination::buffer()).with_totals(true);
//! let mut report = Report::new(columns, levels, sink).title("Sales");
//!
//! report.output_row(&Record::new().with("client", "Acme").with("amount", 10.5))?;
//! report.output_row(&Record::new().with("client", "Acme").with("amount", 2.0))?;
//! report.output_row(&Record::new().with("client", "Zenith").with("amount", 7.0))?;
//! report.finish()?;
//!
//! let csv = report.into_sink().into_output()?.as_text().unwrap();
//! assert!(csv.contains("\"12.50\""));
//! # Ok::<(), tabrollib::ReportError>(())
//! ```

pub mod column;
pub mod error;
pub mod format;
pub mod level;
pub mod report;
pub mod sink;
pub mod totals;
pub mod value;

pub use column::{format_number, round_half_away, Align, Column, ColumnFormat, ComputeFn, DisplayFn};
pub use error::ReportError;
pub use format::OutputFormat;
pub use level::Level;
pub use report::Report;
pub use sink::{
    CustomColumn, DelimitedSink, Destination, HtmlOptions, HtmlSink, PageDevice, PagedSink,
    RowKind, Sink, SpannedCell, TextPageDevice, WorkbookSink,
};
pub use totals::TotalsTracker;
pub use value::{Record, Value};

/// Result type for tabrollib operations
pub type Result<T> = std::result::Result<T, ReportError>;
