//! Per-level running totals.
//!
//! Buckets are keyed by level name and created lazily on the first
//! contribution. Every accumulation step re-rounds the running sum to the
//! column's decimal places, the classic report-writer rule: three
//! additions of `0.005` at two places yield `0.03`, not the `0.02` a
//! single final rounding would produce.

use crate::column::{round_half_away, Column};
use crate::value::{Record, Value};
use std::collections::HashMap;

/// Running sums for every level with pending contributions.
#[derive(Debug, Clone, Default)]
pub struct TotalsTracker {
    buckets: HashMap<String, HashMap<String, f64>>,
}

impl TotalsTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one computed row into every bucket its columns total at.
    ///
    /// For each column with totals levels, the row's value (0.0 when
    /// absent or non-numeric) is added to each listed level's entry and
    /// the entry re-rounded to the column's decimal places.
    pub fn accumulate(&mut self, columns: &[Column], row: &Record) {
        for col in columns {
            if !col.has_totals() {
                continue;
            }
            let add = row.get(&col.name).map(Value::as_number).unwrap_or(0.0);
            for level_name in &col.totals_levels {
                let bucket = self.buckets.entry(level_name.clone()).or_default();
                let sum = bucket.get(col.name.as_str()).copied().unwrap_or(0.0) + add;
                bucket.insert(col.name.clone(), round_half_away(sum, col.decimal_places));
            }
        }
    }

    /// True when the level has a pending bucket.
    pub fn has(&self, level_name: &str) -> bool {
        self.buckets.contains_key(level_name)
    }

    /// Return and remove the level's bucket; `None` when nothing is
    /// pending.
    pub fn flush(&mut self, level_name: &str) -> Option<HashMap<String, f64>> {
        self.buckets.remove(level_name)
    }

    /// Discard a level's bucket without flushing it.
    pub fn reset_level(&mut self, level_name: &str) {
        self.buckets.remove(level_name);
    }

    /// Discard every bucket.
    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    /// True when no level has a pending bucket.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnFormat;

    fn amount_column() -> Column {
        Column::new("amount", "Amount")
            .format(ColumnFormat::Number)
            .decimal_places(2)
            .totals_at(["g"])
    }

    #[test]
    fn test_lazy_bucket_creation() {
        let tracker = TotalsTracker::new();
        assert!(!tracker.has("g"));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_incremental_rounding_differs_from_naive_sum() {
        let columns = vec![amount_column()];
        let mut tracker = TotalsTracker::new();
        for _ in 0..3 {
            tracker.accumulate(&columns, &Record::new().with("amount", 0.005));
        }
        let bucket = tracker.flush("g").unwrap();
        // Each step: 0.005 -> 0.01, 0.015 -> 0.02, 0.025 -> 0.03.
        // A single final rounding of 0.015 would give 0.02 instead.
        assert_eq!(bucket["amount"], 0.03);
        assert_ne!(bucket["amount"], round_half_away(0.005 * 3.0, 2));
    }

    #[test]
    fn test_flush_removes_bucket() {
        let columns = vec![amount_column()];
        let mut tracker = TotalsTracker::new();
        tracker.accumulate(&columns, &Record::new().with("amount", 5.0));
        assert!(tracker.has("g"));
        let bucket = tracker.flush("g").unwrap();
        assert_eq!(bucket["amount"], 5.0);
        assert!(!tracker.has("g"));
        assert!(tracker.flush("g").is_none());
    }

    #[test]
    fn test_missing_value_contributes_zero() {
        let columns = vec![amount_column()];
        let mut tracker = TotalsTracker::new();
        tracker.accumulate(&columns, &Record::new().with("other", 9.0));
        let bucket = tracker.flush("g").unwrap();
        assert_eq!(bucket["amount"], 0.0);
    }

    #[test]
    fn test_multiple_levels_accumulate_independently() {
        let columns = vec![Column::new("n", "N")
            .format(ColumnFormat::Number)
            .decimal_places(0)
            .totals_at(["outer", "inner"])];
        let mut tracker = TotalsTracker::new();
        tracker.accumulate(&columns, &Record::new().with("n", 2.0));
        tracker.accumulate(&columns, &Record::new().with("n", 3.0));

        let inner = tracker.flush("inner").unwrap();
        assert_eq!(inner["n"], 5.0);
        // Outer keeps accumulating after the inner flush.
        tracker.accumulate(&columns, &Record::new().with("n", 1.0));
        let outer = tracker.flush("outer").unwrap();
        assert_eq!(outer["n"], 6.0);
    }

    #[test]
    fn test_reset_level_discards_without_flush() {
        let columns = vec![amount_column()];
        let mut tracker = TotalsTracker::new();
        tracker.accumulate(&columns, &Record::new().with("amount", 1.0));
        tracker.reset_level("g");
        assert!(tracker.flush("g").is_none());
    }
}
