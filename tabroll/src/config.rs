//! Report definition files.
//!
//! A definition is a JSON document describing the columns and levels of a
//! report. It maps one-to-one onto [`Column`] and [`Level`] descriptors;
//! alignment and format names go through the library's permissive parsers,
//! so an unknown name degrades to the default rather than failing the run.
//! Compute and display hooks are code, not configuration, and cannot be
//! expressed in a definition file.

use serde::Deserialize;
use std::path::Path;
use tabrollib::{Align, Column, ColumnFormat, Level};

/// Top-level definition document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportDefinition {
    /// Report title, rendered by sinks that show one.
    pub title: String,
    /// Output columns, left to right.
    pub columns: Vec<ColumnDef>,
    /// Grouping levels, outermost first.
    pub levels: Vec<LevelDef>,
}

/// One column in a definition file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnDef {
    /// Field name in the input data.
    pub name: String,
    /// Column heading; defaults to the name.
    pub heading: String,
    /// `left`, `center` or `right`.
    pub align: String,
    /// `string` or `number`.
    pub format: String,
    /// Decimal places for number columns.
    pub decimal_places: u32,
    /// Thousands separator for number columns.
    pub thousands_separator: bool,
    /// Blank out negative values.
    pub suppress_negative: bool,
    /// Blank out zero values.
    pub suppress_zero: bool,
    /// Blank out positive values.
    pub suppress_positive: bool,
    /// Width relative to the other columns (paginated output).
    pub relative_width: f64,
    /// Level names this column totals at.
    pub totals_levels: Vec<String>,
}

impl Default for ColumnDef {
    fn default() -> Self {
        Self {
            name: String::new(),
            heading: String::new(),
            align: String::new(),
            format: String::new(),
            decimal_places: 0,
            thousands_separator: true,
            suppress_negative: false,
            suppress_zero: false,
            suppress_positive: false,
            relative_width: 1.0,
            totals_levels: Vec::new(),
        }
    }
}

/// One grouping level in a definition file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LevelDef {
    /// Level name, referenced by column `totals_levels`.
    pub name: String,
    /// Identity column names for this level.
    pub group_by: Vec<String>,
    /// Caption on this level's totals rows.
    pub totals_caption: String,
    /// Leftmost column holding the caption.
    pub caption_column: String,
    /// Grid columns the caption spans.
    pub caption_span: u32,
    /// Caption alignment.
    pub caption_align: String,
    /// Re-emit headings after this level's totals.
    pub repeat_heading_after_totals: bool,
}

impl Default for LevelDef {
    fn default() -> Self {
        Self {
            name: String::new(),
            group_by: Vec::new(),
            totals_caption: String::new(),
            caption_column: String::new(),
            caption_span: 1,
            caption_align: String::new(),
            repeat_heading_after_totals: false,
        }
    }
}

impl ReportDefinition {
    /// Load a definition from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let def: ReportDefinition = serde_json::from_str(&text)?;
        Ok(def)
    }

    /// Materialize the column descriptors.
    pub fn columns(&self) -> Vec<Column> {
        self.columns.iter().map(ColumnDef::to_column).collect()
    }

    /// Materialize the level descriptors.
    pub fn levels(&self) -> Vec<Level> {
        self.levels.iter().map(LevelDef::to_level).collect()
    }
}

impl ColumnDef {
    fn to_column(&self) -> Column {
        let heading = if self.heading.is_empty() {
            &self.name
        } else {
            &self.heading
        };
        let mut column = Column::new(&self.name, heading)
            .align(Align::from_name(&self.align))
            .format(ColumnFormat::from_name(&self.format))
            .decimal_places(self.decimal_places)
            .thousands_separator(self.thousands_separator)
            .relative_width(self.relative_width)
            .totals_at(self.totals_levels.clone());
        if self.suppress_negative {
            column = column.suppress_negative();
        }
        if self.suppress_zero {
            column = column.suppress_zero();
        }
        if self.suppress_positive {
            column = column.suppress_positive();
        }
        column
    }
}

impl LevelDef {
    fn to_level(&self) -> Level {
        let mut level = Level::new(&self.name, self.group_by.clone())
            .totals_caption(&self.totals_caption, &self.caption_column)
            .caption_span(self.caption_span)
            .caption_align(Align::from_name(&self.caption_align));
        if self.repeat_heading_after_totals {
            level = level.repeat_heading_after_totals();
        }
        level
    }
}
