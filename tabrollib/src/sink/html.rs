//! Markup sink: renders the report as an HTML table.
//!
//! Markup structure is managed lazily: the `<table>` opens on the first
//! write, `<thead>`/`<tbody>` sections switch as heading and body rows
//! interleave, and `finish` closes whatever is open. With
//! `complete_document` set (the default) the table is wrapped in a full
//! `<html><head><title>…` document; disable it to splice the table into a
//! larger page.

use super::{Destination, RowKind, Sink, SpannedCell};
use crate::column::Column;
use crate::level::Level;
use crate::Result;
use std::collections::HashSet;
use std::io::Write;

/// CSS classes and tag attributes for the emitted markup.
///
/// Empty strings omit the attribute entirely.
#[derive(Debug, Clone)]
pub struct HtmlOptions {
    /// Class on the `<table>` tag.
    pub table_class: String,
    /// `border` attribute on the table.
    pub table_border: String,
    /// `cellspacing` attribute on the table.
    pub table_cell_spacing: String,
    /// `cellpadding` attribute on the table.
    pub table_cell_padding: String,
    /// Class on `<thead>`.
    pub thead_class: String,
    /// Class on heading `<tr>`.
    pub thead_tr_class: String,
    /// Class on heading `<th>`.
    pub thead_th_class: String,
    /// Emit `nowrap` on heading cells.
    pub thead_th_nowrap: bool,
    /// Class on `<tbody>`.
    pub tbody_class: String,
    /// Class on body `<tr>`.
    pub tbody_tr_class: String,
    /// Extra class on odd body rows.
    pub odd_row_class: String,
    /// Extra class on even body rows.
    pub even_row_class: String,
    /// Class on body `<td>`.
    pub tbody_td_class: String,
    /// Emit `nowrap` on body cells.
    pub tbody_td_nowrap: bool,
    /// Class on totals `<tr>`.
    pub totals_tr_class: String,
    /// Class on totals `<td>`.
    pub totals_td_class: String,
    /// Emit `nowrap` on totals cells.
    pub totals_td_nowrap: bool,
    /// Wrap the table in a complete HTML document.
    pub complete_document: bool,
    /// Never suppress duplicate group-key values in this sink.
    pub show_group_keys: bool,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            table_class: "reportTable".to_string(),
            table_border: "1".to_string(),
            table_cell_spacing: "0".to_string(),
            table_cell_padding: "2".to_string(),
            thead_class: String::new(),
            thead_tr_class: String::new(),
            thead_th_class: String::new(),
            thead_th_nowrap: true,
            tbody_class: String::new(),
            tbody_tr_class: String::new(),
            odd_row_class: "odd".to_string(),
            even_row_class: "even".to_string(),
            tbody_td_class: String::new(),
            tbody_td_nowrap: true,
            totals_tr_class: "reportTotals".to_string(),
            totals_td_class: String::new(),
            totals_td_nowrap: true,
            complete_document: true,
            show_group_keys: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Head,
    Body,
}

/// HTML table renderer.
pub struct HtmlSink {
    options: HtmlOptions,
    dest: Destination,
    table_open: bool,
    section: Option<Section>,
    title: String,
}

impl HtmlSink {
    /// Create a sink buffering its markup in memory.
    pub fn new(options: HtmlOptions) -> Self {
        Self::with_destination(options, Destination::buffer())
    }

    /// Create a sink writing to the given destination.
    pub fn with_destination(options: HtmlOptions, dest: Destination) -> Self {
        Self {
            options,
            dest,
            table_open: false,
            section: None,
            title: String::new(),
        }
    }

    /// The buffered markup, when buffering.
    pub fn output(&self) -> Option<String> {
        self.dest.as_text()
    }

    fn out(&mut self, text: &str) -> Result<()> {
        if !text.is_empty() {
            self.dest.write_all(text.as_bytes())?;
        }
        Ok(())
    }

    fn ensure_table_open(&mut self) -> Result<()> {
        if self.table_open {
            return Ok(());
        }
        self.table_open = true;
        if self.options.complete_document {
            let head = format!(
                "<html><head><title>{}</title></head><body>",
                escape(&self.title)
            );
            self.out(&head)?;
        }
        let mut tag = String::from("<table");
        push_attr(&mut tag, "border", &self.options.table_border);
        push_attr(&mut tag, "cellspacing", &self.options.table_cell_spacing);
        push_attr(&mut tag, "cellpadding", &self.options.table_cell_padding);
        push_attr(&mut tag, "class", &self.options.table_class);
        tag.push('>');
        self.out(&tag)
    }

    fn ensure_section(&mut self, section: Section) -> Result<()> {
        self.ensure_table_open()?;
        if self.section == Some(section) {
            return Ok(());
        }
        self.close_section()?;
        let tag = match section {
            Section::Head => {
                let mut t = String::from("<thead");
                push_attr(&mut t, "class", &self.options.thead_class);
                t.push('>');
                t
            }
            Section::Body => {
                let mut t = String::from("<tbody");
                push_attr(&mut t, "class", &self.options.tbody_class);
                t.push('>');
                t
            }
        };
        self.out(&tag)?;
        self.section = Some(section);
        Ok(())
    }

    fn close_section(&mut self) -> Result<()> {
        match self.section.take() {
            Some(Section::Head) => self.out("</thead>"),
            Some(Section::Body) => self.out("</tbody>"),
            None => Ok(()),
        }
    }

    fn td(
        &self,
        tag: &str,
        class: &str,
        nowrap: bool,
        align: &str,
        span: u32,
        text: &str,
    ) -> String {
        let mut cell = format!("<{}", tag);
        push_attr(&mut cell, "class", class);
        if nowrap {
            cell.push_str(" nowrap=\"nowrap\"");
        }
        push_attr(&mut cell, "align", align);
        if span > 1 {
            cell.push_str(&format!(" colspan=\"{}\"", span));
        }
        cell.push('>');
        if text.trim().is_empty() {
            cell.push_str("&nbsp;");
        } else {
            cell.push_str(&escape(text));
        }
        cell.push_str(&format!("</{}>", tag));
        cell
    }
}

impl Sink for HtmlSink {
    fn begin(&mut self, _force_new_page: bool) -> Result<bool> {
        // Markup has no pages; the table itself opens lazily on the
        // first write so the title is known by then.
        Ok(false)
    }

    fn write_heading(&mut self, columns: &[Column], title: &str, _new_section: bool) -> Result<()> {
        self.title = title.to_string();
        self.ensure_section(Section::Head)?;
        let mut row = String::from("<tr");
        push_attr(&mut row, "class", &self.options.thead_tr_class);
        row.push('>');
        for col in columns {
            row.push_str(&self.td(
                "th",
                &self.options.thead_th_class,
                self.options.thead_th_nowrap,
                "center",
                1,
                &col.heading,
            ));
        }
        row.push_str("</tr>");
        self.out(&row)
    }

    fn write_row(
        &mut self,
        columns: &[Column],
        display: &[String],
        odd: bool,
        _suppressed: &HashSet<String>,
    ) -> Result<()> {
        self.ensure_section(Section::Body)?;
        let parity_class = if odd {
            &self.options.odd_row_class
        } else {
            &self.options.even_row_class
        };
        let tr_class = format!("{} {}", self.options.tbody_tr_class, parity_class)
            .trim()
            .to_string();
        let mut row = String::from("<tr");
        push_attr(&mut row, "class", &tr_class);
        row.push('>');
        for (col, text) in columns.iter().zip(display) {
            row.push_str(&self.td(
                "td",
                &self.options.tbody_td_class,
                self.options.tbody_td_nowrap,
                col.align.name(),
                1,
                text,
            ));
        }
        row.push_str("</tr>");
        self.out(&row)
    }

    fn write_totals_row(
        &mut self,
        _columns: &[Column],
        _level: &Level,
        cells: &[SpannedCell],
    ) -> Result<()> {
        self.ensure_section(Section::Body)?;
        let mut row = String::from("<tr");
        push_attr(&mut row, "class", &self.options.totals_tr_class);
        row.push('>');
        for cell in cells {
            row.push_str(&self.td(
                "td",
                &self.options.totals_td_class,
                self.options.totals_td_nowrap,
                cell.align.name(),
                cell.span,
                &cell.text,
            ));
        }
        row.push_str("</tr>");
        self.out(&row)
    }

    fn write_custom_row(
        &mut self,
        _columns: &[Column],
        cells: &[SpannedCell],
        appearance: RowKind,
    ) -> Result<()> {
        let (section, tag, tr_class, td_class, nowrap) = match appearance {
            RowKind::Heading => (
                Section::Head,
                "th",
                self.options.thead_tr_class.clone(),
                self.options.thead_th_class.clone(),
                self.options.thead_th_nowrap,
            ),
            RowKind::Detail => (
                Section::Body,
                "td",
                format!("{} {}", self.options.tbody_tr_class, self.options.even_row_class)
                    .trim()
                    .to_string(),
                self.options.tbody_td_class.clone(),
                self.options.tbody_td_nowrap,
            ),
            RowKind::Totals => (
                Section::Body,
                "td",
                self.options.totals_tr_class.clone(),
                self.options.totals_td_class.clone(),
                self.options.totals_td_nowrap,
            ),
        };
        self.ensure_section(section)?;
        let mut row = String::from("<tr");
        push_attr(&mut row, "class", &tr_class);
        row.push('>');
        for cell in cells {
            row.push_str(&self.td(tag, &td_class, nowrap, cell.align.name(), cell.span, &cell.text));
        }
        row.push_str("</tr>");
        self.out(&row)
    }

    fn finish(&mut self) -> Result<()> {
        if self.table_open {
            self.close_section()?;
            self.out("</table>")?;
            if self.options.complete_document {
                self.out("</body></html>")?;
            }
            self.table_open = false;
        }
        self.dest.flush()?;
        Ok(())
    }

    fn reset(&mut self) {
        self.table_open = false;
        self.section = None;
        self.title.clear();
        self.dest.reset();
    }

    fn always_show_group_keys(&self) -> bool {
        self.options.show_group_keys
    }
}

/// Append ` name="value"` when the value is non-empty.
fn push_attr(tag: &mut String, name: &str, value: &str) {
    if !value.is_empty() {
        tag.push_str(&format!(" {}=\"{}\"", name, value));
    }
}

/// Minimal HTML escaping for text content and attribute values.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
