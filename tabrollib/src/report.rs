//! The report engine: a single-threaded state machine that turns a flat
//! stream of rows into grouped output with per-level totals.
//!
//! For every incoming row the engine decides whether a group boundary was
//! crossed, which totals buckets must flush and in what order, whether
//! the column headings need re-emitting, and which duplicate group-key
//! cells to blank out — then hands fully-resolved rows to its [`Sink`].
//! It never branches on the output format; everything format-specific is
//! answered by the sink itself.
//!
//! Boundary detection scans levels outermost-first and stops at the first
//! identity-column mismatch. A mismatch at an outer level therefore also
//! flushes every level nested inside it, innermost first. Group-key
//! columns of outer levels that still matched are suppression candidates;
//! nothing at or below the mismatch level is.
//!
//! The engine is not safe for concurrent use; independent report runs
//! need independent engines and sinks.

use crate::column::Column;
use crate::level::Level;
use crate::sink::{CustomColumn, RowKind, Sink, SpannedCell};
use crate::totals::TotalsTracker;
use crate::value::{Record, Value};
use crate::Result;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// A report run: descriptors, session state, and the sink being driven.
#[derive(Debug)]
pub struct Report<S: Sink> {
    columns: Vec<Column>,
    levels: Vec<Level>,
    sink: S,
    title: String,
    heading_emitted: bool,
    odd_row: bool,
    prev_id_values: HashMap<String, Value>,
    totals: TotalsTracker,
}

impl<S: Sink> Report<S> {
    /// Create a report over the given columns and levels, driving `sink`.
    ///
    /// Levels are ordered outermost-first: the first element is the level
    /// at which grand totals print.
    pub fn new(columns: Vec<Column>, levels: Vec<Level>, sink: S) -> Self {
        Self {
            columns,
            levels,
            sink,
            title: String::new(),
            heading_emitted: false,
            odd_row: false,
            prev_id_values: HashMap::new(),
            totals: TotalsTracker::new(),
        }
    }

    /// Builder: set the report title (rendered by sinks that show one).
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// The sink being driven.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consume the report and return its sink, e.g. to collect buffered
    /// output after [`finish`](Self::finish).
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Clear all transient session state — heading flag, zebra parity,
    /// previous group keys, pending totals — without touching the sink's
    /// destination.
    pub fn soft_reset(&mut self) {
        self.heading_emitted = false;
        self.odd_row = false;
        self.prev_id_values.clear();
        self.totals.clear();
    }

    /// [`soft_reset`](Self::soft_reset), then reset the sink too.
    pub fn reset(&mut self) {
        self.soft_reset();
        self.sink.reset();
    }

    /// Force the headings to be re-emitted before the next row.
    pub fn force_new_headings(&mut self) {
        self.heading_emitted = false;
    }

    /// Index of the named level, outermost-first.
    pub fn find_level_idx(&self, level_name: &str) -> Option<usize> {
        self.levels.iter().position(|l| l.name == level_name)
    }

    /// Discard the pending totals of the level at `idx` without output.
    pub fn reset_totals_for_level_idx(&mut self, idx: usize) {
        if let Some(level) = self.levels.get(idx) {
            self.totals.reset_level(&level.name);
        }
    }

    /// Discard the pending totals of the named level without output.
    pub fn reset_totals_for_level(&mut self, level_name: &str) {
        self.totals.reset_level(level_name);
    }

    fn output_heading(&mut self, force_new_page: bool) -> Result<()> {
        let new_section = self.sink.begin(force_new_page)?;
        self.sink
            .write_heading(&self.columns, &self.title, new_section)?;
        self.heading_emitted = true;
        Ok(())
    }

    /// Process one data row.
    ///
    /// Detects group boundaries against the previous row, flushes the
    /// affected totals (innermost level first), re-emits headings where a
    /// level asks for it, suppresses duplicate group keys, and emits the
    /// formatted row. Finally the row is folded into the running totals.
    pub fn output_row(&mut self, row: &Record) -> Result<()> {
        let mut allow_suppression = true;
        let mut just_output_heading = false;

        // A detail row that no longer fits (or a page that was never
        // opened) forces a fresh page with new headings.
        if !self.sink.will_row_fit(RowKind::Detail) {
            self.output_heading(true)?;
            just_output_heading = true;
            allow_suppression = false;
        }
        if !self.heading_emitted {
            self.output_heading(false)?;
            just_output_heading = true;
            allow_suppression = false;
        }

        self.odd_row = !self.odd_row;

        // Canonical row: computed values for every configured column.
        let mut crow = Record::new();
        for col in &self.columns {
            crow.set(col.name.clone(), col.value_for(row, None));
        }

        if self.sink.always_show_group_keys() {
            allow_suppression = false;
        }

        // Boundary scan, outermost level first. The first mismatching
        // level wins; levels inside it flush along with it below.
        let mut suppress: HashSet<String> = HashSet::new();
        let mut totals_print_level: Option<usize> = None;
        let mut need_another_heading = false;
        'levels: for (idx, level) in self.levels.iter().enumerate() {
            let mut matched: Vec<&str> = Vec::new();
            for col in &self.columns {
                if !level.groups_by(&col.name) {
                    continue;
                }
                let current = crow.get_or_empty(&col.name);
                match self.prev_id_values.get(&col.name) {
                    Some(prev) if *prev == current => matched.push(&col.name),
                    _ => {
                        totals_print_level = Some(idx);
                        allow_suppression = false;
                        if !just_output_heading && level.repeat_heading_after_totals {
                            need_another_heading = true;
                        }
                        break 'levels;
                    }
                }
            }
            if allow_suppression {
                for name in matched {
                    suppress.insert(name.to_string());
                }
            }
        }

        if let Some(level_idx) = totals_print_level {
            debug!(level = %self.levels[level_idx].name, "group boundary crossed");
            for idx in (level_idx..self.levels.len()).rev() {
                self.output_and_flush_totals(idx)?;
            }
            if need_another_heading {
                self.output_heading(false)?;
                self.odd_row = true;
            }
        }

        let mut display: Vec<String> = Vec::with_capacity(self.columns.len());
        for col in &self.columns {
            if suppress.contains(&col.name) {
                display.push(String::new());
            } else {
                let value = crow.get_or_empty(&col.name);
                display.push(col.display_value(row, None, &value));
            }
        }

        trace!(odd = self.odd_row, suppressed = suppress.len(), "emit row");
        self.sink
            .write_row(&self.columns, &display, self.odd_row, &suppress)?;

        // Remember the raw group-key values for the next boundary scan.
        for col in &self.columns {
            if self.levels.iter().any(|l| l.groups_by(&col.name)) {
                self.prev_id_values
                    .insert(col.name.clone(), crow.get_or_empty(&col.name));
            }
        }

        if self.sink.include_totals() {
            self.totals.accumulate(&self.columns, &crow);
        }
        Ok(())
    }

    /// Emit a custom row — section headings and the like — outside the
    /// normal column model.
    ///
    /// Each custom column consumes `span` real grid columns left to
    /// right, clamped so the row never exceeds the grid; emission stops
    /// once the real columns are exhausted. `appearance` is a styling
    /// hint passed through to the sink.
    pub fn output_custom_row(
        &mut self,
        custom_columns: &[CustomColumn],
        texts: &[&str],
        appearance: RowKind,
    ) -> Result<()> {
        if !self.sink.will_row_fit(appearance) {
            self.output_heading(true)?;
        }
        if !self.heading_emitted {
            self.output_heading(false)?;
        }

        let total = self.columns.len();
        let mut cells: Vec<SpannedCell> = Vec::new();
        let mut used = 0usize;
        for (i, custom) in custom_columns.iter().enumerate() {
            if used >= total {
                break;
            }
            let span = (custom.span as usize).min(total - used);
            cells.push(SpannedCell {
                text: texts.get(i).copied().unwrap_or("").to_string(),
                align: custom.align,
                span: span as u32,
            });
            used += span;
        }

        self.sink
            .write_custom_row(&self.columns, &cells, appearance)?;
        self.odd_row = true;
        Ok(())
    }

    /// Flush and emit the totals of the level at `level_idx`, if any are
    /// pending, then clear its bucket. No-op for sinks that exclude
    /// totals. Called automatically on boundary crossings and at
    /// [`finish`](Self::finish); public for callers that need a manual
    /// flush mid-report.
    pub fn output_and_flush_totals(&mut self, level_idx: usize) -> Result<()> {
        if !self.sink.include_totals() {
            return Ok(());
        }
        let level_name = self.levels[level_idx].name.clone();
        if !self.totals.has(&level_name) {
            return Ok(());
        }

        if !self.sink.will_row_fit(RowKind::Totals) {
            self.output_heading(true)?;
        }
        if !self.heading_emitted {
            self.output_heading(false)?;
        }

        let Some(bucket) = self.totals.flush(&level_name) else {
            return Ok(());
        };
        debug!(level = %level_name, columns = bucket.len(), "flushing totals");

        // The accumulated sums double as the pseudo-row handed to hooks.
        let bucket_row: Record = bucket
            .iter()
            .map(|(name, sum)| (name.clone(), Value::Num(*sum)))
            .collect();

        let level = &self.levels[level_idx];
        let mut cells: Vec<SpannedCell> = Vec::new();
        let mut ci = 0;
        while ci < self.columns.len() {
            let col = &self.columns[ci];
            if !level.caption_column.is_empty() && col.name == level.caption_column {
                let span = (level.caption_span as usize).min(self.columns.len() - ci);
                cells.push(SpannedCell {
                    text: format!("{}:", level.totals_caption),
                    align: level.caption_align,
                    span: span as u32,
                });
                ci += span;
            } else if col.totals_at_level(&level_name) {
                let value = match &col.compute {
                    Some(f) => f(&bucket_row, Some(level)),
                    None => Value::Num(bucket.get(&col.name).copied().unwrap_or(0.0)),
                };
                cells.push(SpannedCell {
                    text: col.display_value(&bucket_row, Some(level), &value),
                    align: col.align,
                    span: 1,
                });
                ci += 1;
            } else {
                cells.push(SpannedCell {
                    text: String::new(),
                    align: col.align,
                    span: 1,
                });
                ci += 1;
            }
        }

        self.sink.write_totals_row(&self.columns, level, &cells)?;
        self.odd_row = true;
        Ok(())
    }

    /// End the report run: emit a heading if none was ever emitted, flush
    /// every level's pending totals innermost-first (end of data is a
    /// boundary for every level), and let the sink close its output.
    ///
    /// Must be called exactly once per run; skipping it loses the final
    /// group's totals.
    pub fn finish(&mut self) -> Result<()> {
        if !self.heading_emitted {
            self.output_heading(false)?;
        }
        for idx in (0..self.levels.len()).rev() {
            self.output_and_flush_totals(idx)?;
        }
        debug!("report finished");
        self.sink.finish()
    }
}
