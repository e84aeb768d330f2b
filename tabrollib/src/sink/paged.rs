//! Paginated sink: page-fit logic, running page numbers, repeated
//! headings.
//!
//! Everything that makes paginated output hard — "does this row still fit,
//! and if not, open a page and re-emit the title, page number, and column
//! headings" — lives in [`PagedSink`]. The actual drawing goes through the
//! [`PageDevice`] trait, which carries only measurement and drawing
//! primitives; the sink never knows whether the device writes PDF
//! operators or monospace text. [`TextPageDevice`] is the in-crate device:
//! fixed-width character cells, form-feed page breaks.
//!
//! Column widths are allocated from each column's `relative_width`,
//! truncated to whole device units, with a fixed spacing gap between
//! columns.

use super::{Destination, RowKind, Sink, SpannedCell};
use crate::column::{Align, Column};
use crate::level::Level;
use crate::Result;
use std::collections::HashSet;
use std::io::Write;

/// Drawing primitives for one paginated target.
///
/// Implementations own page geometry and rendering; the sink drives them
/// row by row. All widths and heights are in the device's own units
/// (points for a PDF device, characters/lines for a text device).
pub trait PageDevice {
    /// Whether a page is currently open.
    fn is_open(&self) -> bool;

    /// Open a fresh page; subsequent drawing starts at its top.
    fn begin_page(&mut self) -> Result<()>;

    /// Usable content width of a page.
    fn content_width(&self) -> f64;

    /// Height of one row of the given kind.
    fn line_height(&self, kind: RowKind) -> f64;

    /// Whether `height` more units fit on the open page. False when no
    /// page is open.
    fn fits(&self, height: f64) -> bool;

    /// Draw the title/page-number line at the top of a fresh page.
    fn draw_title_line(&mut self, title: &str, page_number: u32) -> Result<()>;

    /// Draw one cell of `width` units on the current line.
    fn draw_cell(
        &mut self,
        width: f64,
        text: &str,
        align: Align,
        kind: RowKind,
        odd: Option<bool>,
    ) -> Result<()>;

    /// Draw a horizontal gap between cells.
    fn draw_gap(&mut self, width: f64) -> Result<()>;

    /// Terminate the current line and move down.
    fn end_line(&mut self, kind: RowKind) -> Result<()>;

    /// Flush and close the device output.
    fn finish(&mut self) -> Result<()>;

    /// Drop all device state and buffered output.
    fn reset(&mut self);
}

/// Paginated renderer over an abstract page device.
#[derive(Debug)]
pub struct PagedSink<D: PageDevice> {
    device: D,
    page_number: u32,
    column_spacing: f64,
    show_group_keys: bool,
}

impl<D: PageDevice> PagedSink<D> {
    /// Create a sink drawing on the given device.
    pub fn new(device: D) -> Self {
        Self {
            device,
            page_number: 0,
            column_spacing: 2.0,
            show_group_keys: false,
        }
    }

    /// Builder: set the gap between columns, in device units.
    pub fn column_spacing(mut self, spacing: f64) -> Self {
        self.column_spacing = spacing.max(0.0);
        self
    }

    /// Builder: control duplicate group-key suppression (suppressed by
    /// default).
    pub fn with_group_keys(mut self, on: bool) -> Self {
        self.show_group_keys = on;
        self
    }

    /// The running page number (0 before the first page).
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Access the underlying device, e.g. to read buffered output.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Consume the sink and return its device.
    pub fn into_device(self) -> D {
        self.device
    }

    /// Per-column widths from relative widths, truncated to whole units.
    fn column_widths(&self, columns: &[Column]) -> Vec<f64> {
        let total_rel: f64 = columns.iter().map(|c| c.relative_width).sum();
        let gaps = self.column_spacing * columns.len().saturating_sub(1) as f64;
        let usable = (self.device.content_width() - gaps).max(0.0);
        columns
            .iter()
            .map(|c| (c.relative_width / total_rel * usable).floor())
            .collect()
    }

    /// Width of `span` columns starting at `start`, including the gaps
    /// they absorb.
    fn span_width(&self, widths: &[f64], start: usize, span: usize) -> f64 {
        let end = (start + span).min(widths.len());
        let cells: f64 = widths[start..end].iter().sum();
        cells + self.column_spacing * end.saturating_sub(start + 1) as f64
    }

    fn new_page(&mut self) -> Result<()> {
        self.device.begin_page()?;
        self.page_number += 1;
        Ok(())
    }

    fn draw_spanned(
        &mut self,
        columns: &[Column],
        cells: &[SpannedCell],
        kind: RowKind,
    ) -> Result<()> {
        let widths = self.column_widths(columns);
        let mut ci = 0;
        for (i, cell) in cells.iter().enumerate() {
            if i > 0 {
                self.device.draw_gap(self.column_spacing)?;
            }
            let width = self.span_width(&widths, ci, cell.span as usize);
            self.device.draw_cell(width, &cell.text, cell.align, kind, None)?;
            ci += cell.span as usize;
        }
        self.device.end_line(kind)
    }
}

impl<D: PageDevice> Sink for PagedSink<D> {
    fn begin(&mut self, force_new_page: bool) -> Result<bool> {
        if !self.device.is_open() || force_new_page {
            self.new_page()?;
            return Ok(true);
        }
        if !self.device.fits(self.device.line_height(RowKind::Heading)) {
            self.new_page()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn write_heading(&mut self, columns: &[Column], title: &str, new_section: bool) -> Result<()> {
        if new_section {
            self.device.draw_title_line(title, self.page_number)?;
        }
        let widths = self.column_widths(columns);
        for (i, (col, width)) in columns.iter().zip(&widths).enumerate() {
            if i > 0 {
                self.device.draw_gap(self.column_spacing)?;
            }
            self.device
                .draw_cell(*width, &col.heading, Align::Center, RowKind::Heading, None)?;
        }
        self.device.end_line(RowKind::Heading)
    }

    fn write_row(
        &mut self,
        columns: &[Column],
        display: &[String],
        odd: bool,
        _suppressed: &HashSet<String>,
    ) -> Result<()> {
        let widths = self.column_widths(columns);
        for (i, (col, text)) in columns.iter().zip(display).enumerate() {
            if i > 0 {
                self.device.draw_gap(self.column_spacing)?;
            }
            self.device
                .draw_cell(widths[i], text, col.align, RowKind::Detail, Some(odd))?;
        }
        self.device.end_line(RowKind::Detail)
    }

    fn write_totals_row(
        &mut self,
        columns: &[Column],
        _level: &Level,
        cells: &[SpannedCell],
    ) -> Result<()> {
        self.draw_spanned(columns, cells, RowKind::Totals)
    }

    fn write_custom_row(
        &mut self,
        columns: &[Column],
        cells: &[SpannedCell],
        appearance: RowKind,
    ) -> Result<()> {
        self.draw_spanned(columns, cells, appearance)
    }

    fn will_row_fit(&self, kind: RowKind) -> bool {
        self.device.is_open() && self.device.fits(self.device.line_height(kind))
    }

    fn finish(&mut self) -> Result<()> {
        self.device.finish()
    }

    fn reset(&mut self) {
        self.device.reset();
        self.page_number = 0;
    }

    fn always_show_group_keys(&self) -> bool {
        self.show_group_keys
    }
}

/// Monospace page device: fixed-width character cells, a fixed number of
/// lines per page, form-feed page separators.
pub struct TextPageDevice {
    dest: Destination,
    width: usize,
    lines_per_page: usize,
    lines_used: usize,
    open: bool,
    pages: u32,
    line: String,
}

impl std::fmt::Debug for TextPageDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextPageDevice")
            .field("width", &self.width)
            .field("lines_per_page", &self.lines_per_page)
            .field("lines_used", &self.lines_used)
            .field("pages", &self.pages)
            .finish()
    }
}

impl TextPageDevice {
    /// Device writing to the given destination, 100 characters wide and
    /// 60 lines per page.
    pub fn new(dest: Destination) -> Self {
        Self::with_geometry(dest, 100, 60)
    }

    /// Device with explicit page geometry.
    pub fn with_geometry(dest: Destination, width: usize, lines_per_page: usize) -> Self {
        Self {
            dest,
            width: width.max(1),
            lines_per_page: lines_per_page.max(2),
            lines_used: 0,
            open: false,
            pages: 0,
            line: String::new(),
        }
    }

    /// The buffered text, when buffering.
    pub fn output(&self) -> Option<String> {
        self.dest.as_text()
    }

    /// Pages opened so far.
    pub fn page_count(&self) -> u32 {
        self.pages
    }

    fn pad(text: &str, width: usize, align: Align) -> String {
        let truncated: String = text.chars().take(width).collect();
        match align {
            Align::Left => format!("{:<width$}", truncated, width = width),
            Align::Right => format!("{:>width$}", truncated, width = width),
            Align::Center => format!("{:^width$}", truncated, width = width),
        }
    }
}

impl PageDevice for TextPageDevice {
    fn is_open(&self) -> bool {
        self.open
    }

    fn begin_page(&mut self) -> Result<()> {
        if self.pages > 0 {
            self.dest.write_all(b"\x0c\n")?;
        }
        self.pages += 1;
        self.lines_used = 0;
        self.open = true;
        self.line.clear();
        Ok(())
    }

    fn content_width(&self) -> f64 {
        self.width as f64
    }

    fn line_height(&self, _kind: RowKind) -> f64 {
        1.0
    }

    fn fits(&self, height: f64) -> bool {
        self.open && self.lines_used + height.ceil() as usize <= self.lines_per_page
    }

    fn draw_title_line(&mut self, title: &str, page_number: u32) -> Result<()> {
        let page_text = format!("Page {}", page_number);
        let title_width = self.width.saturating_sub(page_text.len() + 1);
        let line = format!(
            "{} {}",
            Self::pad(title, title_width, Align::Left),
            page_text
        );
        self.dest.write_all(line.as_bytes())?;
        self.dest.write_all(b"\n")?;
        self.lines_used += 1;
        Ok(())
    }

    fn draw_cell(
        &mut self,
        width: f64,
        text: &str,
        align: Align,
        _kind: RowKind,
        _odd: Option<bool>,
    ) -> Result<()> {
        self.line.push_str(&Self::pad(text, width.max(0.0) as usize, align));
        Ok(())
    }

    fn draw_gap(&mut self, width: f64) -> Result<()> {
        for _ in 0..width.max(0.0) as usize {
            self.line.push(' ');
        }
        Ok(())
    }

    fn end_line(&mut self, _kind: RowKind) -> Result<()> {
        self.dest.write_all(self.line.trim_end().as_bytes())?;
        self.dest.write_all(b"\n")?;
        self.line.clear();
        self.lines_used += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.dest.flush()?;
        Ok(())
    }

    fn reset(&mut self) {
        self.dest.reset();
        self.lines_used = 0;
        self.open = false;
        self.pages = 0;
        self.line.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("name", "Name").relative_width(2.0),
            Column::new("amount", "Amount").number(2),
        ]
    }

    fn text_sink(width: usize, lines: usize) -> PagedSink<TextPageDevice> {
        PagedSink::new(TextPageDevice::with_geometry(
            Destination::buffer(),
            width,
            lines,
        ))
        .column_spacing(1.0)
    }

    #[test]
    fn test_begin_opens_first_page_and_numbers_it() {
        let mut sink = text_sink(40, 10);
        assert!(!sink.will_row_fit(RowKind::Detail));
        assert!(sink.begin(false).unwrap());
        assert_eq!(sink.page_number(), 1);
        assert!(!sink.begin(false).unwrap());
        assert!(sink.begin(true).unwrap());
        assert_eq!(sink.page_number(), 2);
    }

    #[test]
    fn test_title_and_page_number_on_new_section() {
        let mut sink = text_sink(40, 10);
        let new_section = sink.begin(false).unwrap();
        sink.write_heading(&columns(), "Sales", new_section).unwrap();
        sink.finish().unwrap();
        let out = sink.device().output().unwrap();
        assert!(out.starts_with("Sales"));
        assert!(out.lines().next().unwrap().ends_with("Page 1"));
        assert!(out.contains("Name"));
        assert!(out.contains("Amount"));
    }

    #[test]
    fn test_page_break_when_lines_run_out() {
        let mut sink = text_sink(40, 4);
        let new_section = sink.begin(false).unwrap();
        sink.write_heading(&columns(), "T", new_section).unwrap();
        // Two lines used (title + heading); two detail rows fit.
        let none = HashSet::new();
        let cols = columns();
        for i in 0..2 {
            assert!(sink.will_row_fit(RowKind::Detail), "row {} should fit", i);
            sink.write_row(&cols, &[format!("r{}", i), "1.00".into()], i % 2 == 0, &none)
                .unwrap();
        }
        assert!(!sink.will_row_fit(RowKind::Detail));
        sink.finish().unwrap();
        assert_eq!(sink.device().page_count(), 1);
    }

    #[test]
    fn test_relative_widths_allocate_characters() {
        let sink = text_sink(31, 10);
        let widths = sink.column_widths(&columns());
        // 31 - 1 gap = 30 usable; 2:1 split -> 20 and 10.
        assert_eq!(widths, vec![20.0, 10.0]);
    }

    #[test]
    fn test_cell_alignment_and_truncation() {
        assert_eq!(TextPageDevice::pad("abc", 5, Align::Left), "abc  ");
        assert_eq!(TextPageDevice::pad("abc", 5, Align::Right), "  abc");
        assert_eq!(TextPageDevice::pad("abc", 5, Align::Center), " abc ");
        assert_eq!(TextPageDevice::pad("abcdef", 3, Align::Left), "abc");
    }

    #[test]
    fn test_form_feed_between_pages() {
        let mut sink = text_sink(20, 3);
        sink.begin(false).unwrap();
        sink.begin(true).unwrap();
        sink.finish().unwrap();
        assert!(sink.device().output().unwrap().contains('\x0c'));
    }
}
