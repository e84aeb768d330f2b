//! The sink boundary: where the report engine hands rows to a renderer.
//!
//! The engine is format-agnostic. It decides *what* to emit — headings,
//! data rows, totals rows, custom rows — and a [`Sink`] implementation
//! decides how that lands in one concrete format. Four families ship with
//! the crate: markup ([`HtmlSink`]), delimited text ([`DelimitedSink`]),
//! spreadsheet ([`WorkbookSink`]) and paginated ([`PagedSink`]). The
//! engine never inspects the output format; everything format-specific is
//! answered through the trait, including the two capability queries
//! (group-key visibility, totals inclusion) whose defaults differ per
//! format family.

pub mod delim;
pub mod html;
pub mod paged;
pub mod sheet;

pub use delim::DelimitedSink;
pub use html::{HtmlOptions, HtmlSink};
pub use paged::{PageDevice, PagedSink, TextPageDevice};
pub use sheet::WorkbookSink;

use crate::column::{Align, Column};
use crate::level::Level;
use crate::Result;
use std::collections::HashSet;
use std::io::{self, Write};

/// Visual treatment of a row; a styling hint only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// Styled like the column headings
    Heading,
    /// Styled like an ordinary data row
    Detail,
    /// Styled like a totals row
    Totals,
}

/// A pre-resolved cell occupying one or more grid columns.
///
/// The engine resolves totals captions and custom-row spans into these
/// before calling the sink, so every implementation sees the same clamped
/// layout.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedCell {
    /// Text to render, already formatted.
    pub text: String,
    /// Horizontal alignment.
    pub align: Align,
    /// Number of real grid columns consumed (always ≥ 1).
    pub span: u32,
}

/// Caller-supplied shape of one custom-row column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomColumn {
    /// Horizontal alignment.
    pub align: Align,
    /// Real columns to span; zero normalizes to 1.
    pub span: u32,
}

impl CustomColumn {
    /// Create a custom column spanning `span` grid columns.
    pub fn new(align: Align, span: u32) -> Self {
        Self {
            align,
            span: span.max(1),
        }
    }
}

impl Default for CustomColumn {
    fn default() -> Self {
        Self {
            align: Align::Left,
            span: 1,
        }
    }
}

/// Where a text-producing sink writes its bytes.
///
/// `Buffer` accumulates in memory and can be read back after the report
/// finishes; `Writer` streams to any caller-supplied `io::Write` (a file,
/// a socket, stdout) and keeps nothing.
pub enum Destination {
    /// Accumulate output in memory.
    Buffer(Vec<u8>),
    /// Stream output to the wrapped writer.
    Writer(Box<dyn Write>),
}

impl Destination {
    /// An empty in-memory buffer.
    pub fn buffer() -> Self {
        Destination::Buffer(Vec::new())
    }

    /// Stream to a caller-supplied writer.
    pub fn writer(w: impl Write + 'static) -> Self {
        Destination::Writer(Box::new(w))
    }

    /// Create (truncating) the named file and stream to it.
    pub fn file(path: impl AsRef<std::path::Path>) -> io::Result<Self> {
        Ok(Destination::Writer(Box::new(std::fs::File::create(path)?)))
    }

    /// The accumulated bytes, when buffering.
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Destination::Buffer(b) => Some(b),
            Destination::Writer(_) => None,
        }
    }

    /// The accumulated output as text, when buffering.
    pub fn as_text(&self) -> Option<String> {
        self.bytes().map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// Drop any buffered bytes; streams are left untouched.
    pub fn reset(&mut self) {
        if let Destination::Buffer(b) = self {
            b.clear();
        }
    }
}

impl Default for Destination {
    fn default() -> Self {
        Destination::buffer()
    }
}

impl std::fmt::Debug for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Buffer(b) => f.debug_tuple("Buffer").field(&b.len()).finish(),
            Destination::Writer(_) => f.debug_tuple("Writer").finish(),
        }
    }
}

impl Write for Destination {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Destination::Buffer(b) => b.write(buf),
            Destination::Writer(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Destination::Buffer(_) => Ok(()),
            Destination::Writer(w) => w.flush(),
        }
    }
}

/// The renderer contract driven by the report engine.
///
/// Implementations own every format-specific decision: markup structure,
/// cell placement, page geometry, styling. The engine calls methods in a
/// fixed discipline — `begin` before the first write of a section,
/// `write_heading` before any body row, `finish` exactly once at the end
/// — and reacts to the two capability queries when deciding suppression
/// and totals accumulation.
pub trait Sink {
    /// Lazily open the underlying structure (table, workbook, first
    /// page). Paginated sinks also start a new page when forced or when
    /// the heading no longer fits. Returns whether a new section or page
    /// was started — the engine passes that through to `write_heading`
    /// so title and page number render at the top of each fresh section.
    fn begin(&mut self, force_new_page: bool) -> Result<bool>;

    /// Emit the column-heading row. `new_section` is the value `begin`
    /// just returned.
    fn write_heading(&mut self, columns: &[Column], title: &str, new_section: bool) -> Result<()>;

    /// Emit one data row. `display` is parallel to `columns`;
    /// `suppressed` names the columns blanked as duplicate group keys.
    fn write_row(
        &mut self,
        columns: &[Column],
        display: &[String],
        odd: bool,
        suppressed: &HashSet<String>,
    ) -> Result<()>;

    /// Emit one totals row, already resolved into spanned cells.
    fn write_totals_row(
        &mut self,
        columns: &[Column],
        level: &Level,
        cells: &[SpannedCell],
    ) -> Result<()>;

    /// Emit one custom row with the given visual treatment. `columns` is
    /// the real grid the spans were resolved against (paginated sinks
    /// size spanned cells from its relative widths).
    fn write_custom_row(
        &mut self,
        columns: &[Column],
        cells: &[SpannedCell],
        appearance: RowKind,
    ) -> Result<()>;

    /// Whether a row of the given kind fits without a page break. Only
    /// paginated sinks ever answer false; "no page open yet" counts as
    /// not fitting.
    fn will_row_fit(&self, _kind: RowKind) -> bool {
        true
    }

    /// Close open structural wrappers and produce the final output.
    fn finish(&mut self) -> Result<()>;

    /// Return the sink to its pre-output state, dropping buffered output.
    fn reset(&mut self);

    /// When true, duplicate group-key values are never suppressed in this
    /// format. Delimited sinks default to true; everything else false.
    fn always_show_group_keys(&self) -> bool {
        false
    }

    /// When false, the engine neither accumulates nor emits totals for
    /// this sink. Delimited sinks default to false.
    fn include_totals(&self) -> bool {
        true
    }
}

impl<T: Sink + ?Sized> Sink for Box<T> {
    fn begin(&mut self, force_new_page: bool) -> Result<bool> {
        (**self).begin(force_new_page)
    }

    fn write_heading(&mut self, columns: &[Column], title: &str, new_section: bool) -> Result<()> {
        (**self).write_heading(columns, title, new_section)
    }

    fn write_row(
        &mut self,
        columns: &[Column],
        display: &[String],
        odd: bool,
        suppressed: &HashSet<String>,
    ) -> Result<()> {
        (**self).write_row(columns, display, odd, suppressed)
    }

    fn write_totals_row(
        &mut self,
        columns: &[Column],
        level: &Level,
        cells: &[SpannedCell],
    ) -> Result<()> {
        (**self).write_totals_row(columns, level, cells)
    }

    fn write_custom_row(
        &mut self,
        columns: &[Column],
        cells: &[SpannedCell],
        appearance: RowKind,
    ) -> Result<()> {
        (**self).write_custom_row(columns, cells, appearance)
    }

    fn will_row_fit(&self, kind: RowKind) -> bool {
        (**self).will_row_fit(kind)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn always_show_group_keys(&self) -> bool {
        (**self).always_show_group_keys()
    }

    fn include_totals(&self) -> bool {
        (**self).include_totals()
    }
}
