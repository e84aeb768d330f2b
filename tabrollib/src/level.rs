//! Level descriptors: static definitions of one grouping level.
//!
//! Levels are ordered outermost-first: the level at index 0 is the
//! broadest grouping (where grand totals print) and each following level
//! nests inside the previous one. A level's identity columns are the
//! column names whose values stay constant across all rows of one group
//! at that level; a change in any of them is a boundary crossing.

use crate::column::Align;

/// Static definition of one grouping level.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    /// Unique mnemonic name, referenced by `Column::totals_levels`.
    pub name: String,
    /// Identity column names defining group membership at this level.
    pub group_by: Vec<String>,
    /// Caption prepended to this level's totals rows.
    pub totals_caption: String,
    /// Name of the leftmost column that holds the caption. The caption
    /// only prints when this names an actual report column.
    pub caption_column: String,
    /// Number of grid columns the caption spans.
    pub caption_span: u32,
    /// Caption alignment.
    pub caption_align: Align,
    /// Re-emit the column headings before the first data row following
    /// this level's totals.
    pub repeat_heading_after_totals: bool,
}

impl Level {
    /// Create a level grouping by the given identity columns.
    pub fn new<I, S>(name: impl Into<String>, group_by: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            group_by: group_by.into_iter().map(Into::into).collect(),
            totals_caption: String::new(),
            caption_column: String::new(),
            caption_span: 1,
            caption_align: Align::Left,
            repeat_heading_after_totals: false,
        }
    }

    /// Builder: set the totals caption and the column it starts in.
    pub fn totals_caption(
        mut self,
        caption: impl Into<String>,
        leftmost_column: impl Into<String>,
    ) -> Self {
        self.totals_caption = caption.into();
        self.caption_column = leftmost_column.into();
        self
    }

    /// Builder: set the caption's column span. Zero normalizes to 1.
    pub fn caption_span(mut self, span: u32) -> Self {
        self.caption_span = span.max(1);
        self
    }

    /// Builder: set the caption alignment.
    pub fn caption_align(mut self, align: Align) -> Self {
        self.caption_align = align;
        self
    }

    /// Builder: repeat the headings after this level's totals print.
    pub fn repeat_heading_after_totals(mut self) -> Self {
        self.repeat_heading_after_totals = true;
        self
    }

    /// True when the named column is one of this level's identity columns.
    pub fn groups_by(&self, column_name: &str) -> bool {
        self.group_by.iter().any(|n| n == column_name)
    }
}
