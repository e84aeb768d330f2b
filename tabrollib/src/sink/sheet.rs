//! Spreadsheet sink: renders the report into an XLSX workbook.
//!
//! Cell placement, styling and merging go through `rust_xlsxwriter`; this
//! sink only decides which cell gets what. All values are written as
//! strings, since the report engine has already applied suppression and
//! numeric formatting to every cell. Headings and totals are bold;
//! captions and custom spans become merged ranges.

use super::{Destination, RowKind, Sink, SpannedCell};
use crate::column::{Align, Column};
use crate::error::ReportError;
use crate::level::Level;
use crate::Result;
use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};
use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone)]
enum SheetTarget {
    File(PathBuf),
    Memory,
}

/// XLSX workbook renderer.
pub struct WorkbookSink {
    workbook: Option<Workbook>,
    row: u32,
    target: SheetTarget,
    saved: Option<Vec<u8>>,
    show_group_keys: bool,
}

impl std::fmt::Debug for WorkbookSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkbookSink")
            .field("open", &self.workbook.is_some())
            .field("row", &self.row)
            .field("target", &self.target)
            .finish()
    }
}

impl WorkbookSink {
    /// Sink saving the workbook to the named file on `finish`.
    pub fn to_path(path: impl Into<PathBuf>) -> Self {
        Self {
            workbook: None,
            row: 0,
            target: SheetTarget::File(path.into()),
            saved: None,
            show_group_keys: false,
        }
    }

    /// Sink keeping the finished workbook bytes in memory.
    pub fn in_memory() -> Self {
        Self {
            workbook: None,
            row: 0,
            target: SheetTarget::Memory,
            saved: None,
            show_group_keys: false,
        }
    }

    /// Builder: control duplicate group-key suppression (suppressed by
    /// default).
    pub fn with_group_keys(mut self, on: bool) -> Self {
        self.show_group_keys = on;
        self
    }

    /// The finished workbook bytes, for in-memory sinks after `finish`.
    pub fn output(&self) -> Option<&[u8]> {
        self.saved.as_deref()
    }

    /// Write the finished workbook bytes into a destination.
    pub fn copy_output_to(&self, dest: &mut Destination) -> Result<()> {
        if let Some(bytes) = self.output() {
            dest.write_all(bytes)?;
        }
        Ok(())
    }

    fn sheet(&mut self) -> Result<&mut Worksheet> {
        let workbook = self
            .workbook
            .as_mut()
            .ok_or_else(|| ReportError::Sink("workbook not open".to_string()))?;
        Ok(workbook.worksheet_from_index(0)?)
    }
}

/// Cell format for the given alignment, optionally bold.
fn cell_format(align: Align, bold: bool) -> Format {
    let format = Format::new().set_align(match align {
        Align::Left => FormatAlign::Left,
        Align::Center => FormatAlign::Center,
        Align::Right => FormatAlign::Right,
    });
    if bold {
        format.set_bold()
    } else {
        format
    }
}

impl Sink for WorkbookSink {
    fn begin(&mut self, _force_new_page: bool) -> Result<bool> {
        if self.workbook.is_some() {
            return Ok(false);
        }
        let mut workbook = Workbook::new();
        workbook.add_worksheet();
        self.workbook = Some(workbook);
        self.row = 0;
        Ok(true)
    }

    fn write_heading(&mut self, columns: &[Column], _title: &str, _new_section: bool) -> Result<()> {
        let row = self.row;
        let sheet = self.sheet()?;
        let format = cell_format(Align::Center, true);
        for (c, col) in columns.iter().enumerate() {
            sheet.write_string_with_format(row, c as u16, &col.heading, &format)?;
        }
        self.row += 1;
        Ok(())
    }

    fn write_row(
        &mut self,
        columns: &[Column],
        display: &[String],
        _odd: bool,
        _suppressed: &HashSet<String>,
    ) -> Result<()> {
        let row = self.row;
        let sheet = self.sheet()?;
        for (c, (col, text)) in columns.iter().zip(display).enumerate() {
            sheet.write_string_with_format(row, c as u16, text, &cell_format(col.align, false))?;
        }
        self.row += 1;
        Ok(())
    }

    fn write_totals_row(
        &mut self,
        _columns: &[Column],
        _level: &Level,
        cells: &[SpannedCell],
    ) -> Result<()> {
        let row = self.row;
        let sheet = self.sheet()?;
        let mut c: u16 = 0;
        for cell in cells {
            // Blank single cells stay unwritten so totals rows only
            // touch the cells that carry a caption or a sum.
            if cell.span > 1 {
                let format = cell_format(cell.align, true);
                sheet.merge_range(row, c, row, c + cell.span as u16 - 1, &cell.text, &format)?;
            } else if !cell.text.is_empty() {
                sheet.write_string_with_format(row, c, &cell.text, &cell_format(cell.align, true))?;
            }
            c += cell.span as u16;
        }
        self.row += 1;
        Ok(())
    }

    fn write_custom_row(
        &mut self,
        _columns: &[Column],
        cells: &[SpannedCell],
        appearance: RowKind,
    ) -> Result<()> {
        let bold = matches!(appearance, RowKind::Heading | RowKind::Totals);
        let row = self.row;
        let sheet = self.sheet()?;
        let mut c: u16 = 0;
        for cell in cells {
            let format = cell_format(cell.align, bold);
            if cell.span > 1 {
                sheet.merge_range(row, c, row, c + cell.span as u16 - 1, &cell.text, &format)?;
            } else {
                sheet.write_string_with_format(row, c, &cell.text, &format)?;
            }
            c += cell.span as u16;
        }
        self.row += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let Some(workbook) = self.workbook.as_mut() else {
            return Ok(());
        };
        match &self.target {
            SheetTarget::File(path) => workbook.save(path)?,
            SheetTarget::Memory => self.saved = Some(workbook.save_to_buffer()?),
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.workbook = None;
        self.row = 0;
        self.saved = None;
    }

    fn always_show_group_keys(&self) -> bool {
        self.show_group_keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("name", "Name"),
            Column::new("amount", "Amount").number(2),
        ]
    }

    #[test]
    fn test_begin_opens_workbook_once() {
        let mut sink = WorkbookSink::in_memory();
        assert!(sink.begin(false).unwrap());
        assert!(!sink.begin(false).unwrap());
        assert!(!sink.begin(true).unwrap());
    }

    #[test]
    fn test_rows_advance_and_buffer_is_zip() {
        let mut sink = WorkbookSink::in_memory();
        let cols = columns();
        sink.begin(false).unwrap();
        sink.write_heading(&cols, "", true).unwrap();
        sink.write_row(&cols, &["a".into(), "1.00".into()], true, &HashSet::new())
            .unwrap();
        assert_eq!(sink.row, 2);
        sink.finish().unwrap();
        let bytes = sink.output().unwrap();
        // XLSX is a zip container.
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_file_target_saves_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let mut sink = WorkbookSink::to_path(&path);
        let cols = columns();
        sink.begin(false).unwrap();
        sink.write_heading(&cols, "", true).unwrap();
        sink.finish().unwrap();
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_merge_range_for_spans() {
        let mut sink = WorkbookSink::in_memory();
        sink.begin(false).unwrap();
        sink.write_custom_row(
            &columns(),
            &[SpannedCell {
                text: "Section".to_string(),
                align: Align::Center,
                span: 2,
            }],
            RowKind::Heading,
        )
        .unwrap();
        sink.finish().unwrap();
        assert!(sink.output().is_some());
    }
}
