//! Delimited-text sink: CSV and TSV.
//!
//! CSV fields are always quoted (quotes doubled) with embedded CR/LF
//! stripped; TSV fields are never quoted with embedded tab/CR/LF
//! stripped; records end in CRLF either way. Spanned cells pad with
//! empty fields so every record keeps its grid width.
//!
//! Delimited output is the one family where totals lines are usually
//! unwanted (consumers re-aggregate themselves) and duplicate group keys
//! must stay visible, so `include_totals` defaults to false and
//! `show_group_keys` to true. Both are configurable.

use super::{Destination, RowKind, Sink, SpannedCell};
use crate::column::Column;
use crate::error::ReportError;
use crate::level::Level;
use crate::Result;
use std::collections::HashSet;

/// Field separator profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// Comma-separated, always quoted
    Comma,
    /// Tab-separated, never quoted
    Tab,
}

impl Separator {
    fn build_writer(&self, dest: Destination) -> csv::Writer<Destination> {
        let mut builder = csv::WriterBuilder::new();
        builder
            .terminator(csv::Terminator::CRLF)
            .flexible(true);
        match self {
            Separator::Comma => builder.delimiter(b',').quote_style(csv::QuoteStyle::Always),
            Separator::Tab => builder.delimiter(b'\t').quote_style(csv::QuoteStyle::Never),
        };
        builder.from_writer(dest)
    }

    /// Strip the characters the profile cannot represent inside a field.
    fn sanitize(&self, text: &str) -> String {
        let strip_tabs = matches!(self, Separator::Tab);
        text.chars()
            .filter(|c| !matches!(c, '\r' | '\n') && !(strip_tabs && *c == '\t'))
            .collect()
    }
}

/// CSV/TSV renderer built on the `csv` crate.
pub struct DelimitedSink {
    separator: Separator,
    writer: Option<csv::Writer<Destination>>,
    include_totals: bool,
    show_group_keys: bool,
}

impl std::fmt::Debug for DelimitedSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelimitedSink")
            .field("separator", &self.separator)
            .field("include_totals", &self.include_totals)
            .field("show_group_keys", &self.show_group_keys)
            .finish()
    }
}

impl DelimitedSink {
    /// Comma-separated sink writing to the given destination.
    pub fn csv(dest: Destination) -> Self {
        Self::with_separator(Separator::Comma, dest)
    }

    /// Tab-separated sink writing to the given destination.
    pub fn tsv(dest: Destination) -> Self {
        Self::with_separator(Separator::Tab, dest)
    }

    /// Sink with an explicit separator profile.
    pub fn with_separator(separator: Separator, dest: Destination) -> Self {
        Self {
            separator,
            writer: Some(separator.build_writer(dest)),
            include_totals: false,
            show_group_keys: true,
        }
    }

    /// Builder: emit totals rows in delimited output (off by default).
    pub fn with_totals(mut self, on: bool) -> Self {
        self.include_totals = on;
        self
    }

    /// Builder: control duplicate group-key suppression (shown by
    /// default).
    pub fn with_group_keys(mut self, on: bool) -> Self {
        self.show_group_keys = on;
        self
    }

    /// Consume the sink and recover its destination (flushing first).
    pub fn into_output(mut self) -> Result<Destination> {
        match self.writer.take() {
            Some(w) => w.into_inner().map_err(|e| ReportError::Csv(e.into_error().into())),
            None => Ok(Destination::buffer()),
        }
    }

    fn writer_mut(&mut self) -> Result<&mut csv::Writer<Destination>> {
        self.writer
            .as_mut()
            .ok_or_else(|| ReportError::Sink("delimited writer unavailable".to_string()))
    }

    fn write_fields(&mut self, fields: Vec<String>) -> Result<()> {
        self.writer_mut()?.write_record(&fields)?;
        Ok(())
    }

    /// Expand spanned cells into grid-width fields: the text, then
    /// span − 1 empty fields.
    fn spanned_fields(&self, cells: &[SpannedCell]) -> Vec<String> {
        let mut fields = Vec::new();
        for cell in cells {
            fields.push(self.separator.sanitize(&cell.text));
            for _ in 1..cell.span {
                fields.push(String::new());
            }
        }
        fields
    }
}

impl Sink for DelimitedSink {
    fn begin(&mut self, _force_new_page: bool) -> Result<bool> {
        Ok(false)
    }

    fn write_heading(&mut self, columns: &[Column], _title: &str, _new_section: bool) -> Result<()> {
        let fields: Vec<String> = columns
            .iter()
            .map(|c| self.separator.sanitize(&c.heading))
            .collect();
        self.write_fields(fields)
    }

    fn write_row(
        &mut self,
        _columns: &[Column],
        display: &[String],
        _odd: bool,
        _suppressed: &HashSet<String>,
    ) -> Result<()> {
        let fields: Vec<String> = display.iter().map(|t| self.separator.sanitize(t)).collect();
        self.write_fields(fields)
    }

    fn write_totals_row(
        &mut self,
        _columns: &[Column],
        _level: &Level,
        cells: &[SpannedCell],
    ) -> Result<()> {
        let fields = self.spanned_fields(cells);
        self.write_fields(fields)
    }

    fn write_custom_row(
        &mut self,
        _columns: &[Column],
        cells: &[SpannedCell],
        _appearance: RowKind,
    ) -> Result<()> {
        let fields = self.spanned_fields(cells);
        self.write_fields(fields)
    }

    fn finish(&mut self) -> Result<()> {
        self.writer_mut()?.flush()?;
        Ok(())
    }

    fn reset(&mut self) {
        if let Some(w) = self.writer.take() {
            match w.into_inner() {
                Ok(mut dest) => {
                    dest.reset();
                    self.writer = Some(self.separator.build_writer(dest));
                }
                Err(e) => self.writer = Some(e.into_inner()),
            }
        }
    }

    fn always_show_group_keys(&self) -> bool {
        self.show_group_keys
    }

    fn include_totals(&self) -> bool {
        self.include_totals
    }
}
