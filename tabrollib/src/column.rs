//! Column descriptors: static definitions of one output column.
//!
//! A [`Column`] names the row field it reads, how the cell is aligned and
//! formatted, which suppression rules apply, and at which grouping levels
//! its values are totaled. Two optional hooks customize behavior per row:
//! a compute hook that derives the value, and a display hook that formats
//! it. Both receive `Option<&Level>` — `None` for a regular data row,
//! `Some` when a totals line is being produced.
//!
//! Configuration is permissive by policy: unknown alignment or format
//! names normalize to the documented defaults instead of failing.

use crate::level::Level;
use crate::value::{Record, Value};
use serde::{Deserialize, Serialize};

/// Horizontal cell alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    /// Left-aligned (default)
    #[default]
    Left,
    /// Centered
    Center,
    /// Right-aligned
    Right,
}

impl Align {
    /// Parse an alignment name, normalizing anything unknown to `Left`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "center" | "centre" => Align::Center,
            "right" => Align::Right,
            _ => Align::Left,
        }
    }

    /// Canonical lowercase name, as used in markup attributes.
    pub fn name(&self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        }
    }
}

/// How a column's cells are interpreted and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnFormat {
    /// Plain text (default)
    #[default]
    Text,
    /// Numeric, rendered with fixed decimal places
    Number,
}

impl ColumnFormat {
    /// Parse a format name, normalizing anything unknown to `Text`.
    ///
    /// Accepts `"string"` as an alias for text.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "number" | "numeric" => ColumnFormat::Number,
            _ => ColumnFormat::Text,
        }
    }
}

/// Derives a column's value from a row (or from a totals bucket when the
/// level argument is `Some`).
///
/// Hooks are infallible; a panicking hook aborts report generation and
/// propagates to the caller uncaught.
pub type ComputeFn = Box<dyn Fn(&Record, Option<&Level>) -> Value>;

/// Formats a computed value for display. The returned string is emitted
/// verbatim by the sink. Panics propagate like [`ComputeFn`]'s.
pub type DisplayFn = Box<dyn Fn(&Record, Option<&Level>, &Value) -> String>;

/// Static definition of one report column.
pub struct Column {
    /// Field name used to read row data; unique within a report.
    pub name: String,
    /// Heading text emitted at the top of the column.
    pub heading: String,
    /// Horizontal alignment for data cells.
    pub align: Align,
    /// Text or number interpretation.
    pub format: ColumnFormat,
    /// Decimal places for number columns.
    pub decimal_places: u32,
    /// Insert a thousands separator in number columns. Defaults to true.
    pub thousands_separator: bool,
    /// Render negative numbers as blank.
    pub suppress_negative: bool,
    /// Render zero as blank.
    pub suppress_zero: bool,
    /// Render positive numbers as blank.
    pub suppress_positive: bool,
    /// Width relative to the other columns, used by paginated sinks.
    pub relative_width: f64,
    /// Names of the levels at which this column's values are totaled.
    pub totals_levels: Vec<String>,
    /// Optional value-computation hook.
    pub compute: Option<ComputeFn>,
    /// Optional display-formatting hook.
    pub display: Option<DisplayFn>,
}

impl std::fmt::Debug for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("heading", &self.heading)
            .field("align", &self.align)
            .field("format", &self.format)
            .field("decimal_places", &self.decimal_places)
            .field("thousands_separator", &self.thousands_separator)
            .field("relative_width", &self.relative_width)
            .field("totals_levels", &self.totals_levels)
            .field("compute", &self.compute.as_ref().map(|_| "<fn>"))
            .field("display", &self.display.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Column {
    /// Create a text column with default settings.
    pub fn new(name: impl Into<String>, heading: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            heading: heading.into(),
            align: Align::Left,
            format: ColumnFormat::Text,
            decimal_places: 0,
            thousands_separator: true,
            suppress_negative: false,
            suppress_zero: false,
            suppress_positive: false,
            relative_width: 1.0,
            totals_levels: Vec::new(),
            compute: None,
            display: None,
        }
    }

    /// Builder: set the alignment.
    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// Builder: set the cell format.
    pub fn format(mut self, format: ColumnFormat) -> Self {
        self.format = format;
        self
    }

    /// Builder: shorthand for a right-aligned number column.
    pub fn number(mut self, decimal_places: u32) -> Self {
        self.format = ColumnFormat::Number;
        self.align = Align::Right;
        self.decimal_places = decimal_places;
        self
    }

    /// Builder: set the decimal places for number cells.
    pub fn decimal_places(mut self, places: u32) -> Self {
        self.decimal_places = places;
        self
    }

    /// Builder: enable or disable the thousands separator.
    pub fn thousands_separator(mut self, on: bool) -> Self {
        self.thousands_separator = on;
        self
    }

    /// Builder: blank out negative values.
    pub fn suppress_negative(mut self) -> Self {
        self.suppress_negative = true;
        self
    }

    /// Builder: blank out zero values.
    pub fn suppress_zero(mut self) -> Self {
        self.suppress_zero = true;
        self
    }

    /// Builder: blank out positive values.
    pub fn suppress_positive(mut self) -> Self {
        self.suppress_positive = true;
        self
    }

    /// Builder: set the relative width. Non-positive inputs normalize
    /// to 1.0.
    pub fn relative_width(mut self, width: f64) -> Self {
        self.relative_width = if width > 0.0 { width } else { 1.0 };
        self
    }

    /// Builder: total this column at the named levels.
    pub fn totals_at<I, S>(mut self, levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.totals_levels = levels.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: install a value-computation hook.
    pub fn compute(mut self, f: impl Fn(&Record, Option<&Level>) -> Value + 'static) -> Self {
        self.compute = Some(Box::new(f));
        self
    }

    /// Builder: install a display-formatting hook.
    pub fn display(
        mut self,
        f: impl Fn(&Record, Option<&Level>, &Value) -> String + 'static,
    ) -> Self {
        self.display = Some(Box::new(f));
        self
    }

    /// True when this column totals at the named level.
    pub fn totals_at_level(&self, level_name: &str) -> bool {
        self.totals_levels.iter().any(|n| n == level_name)
    }

    /// True when this column totals at any level.
    pub fn has_totals(&self) -> bool {
        !self.totals_levels.is_empty()
    }

    /// Compute the column's value for a row: the compute hook when
    /// installed, the raw row value (empty when absent) otherwise.
    pub fn value_for(&self, row: &Record, level: Option<&Level>) -> Value {
        match &self.compute {
            Some(f) => f(row, level),
            None => row.get_or_empty(&self.name),
        }
    }

    /// Produce the display string for an already-computed value.
    ///
    /// Number columns apply the negative/zero/positive suppression rules
    /// first (yielding a blank cell), then either the display hook or the
    /// standard fixed-decimal formatting. Text columns use the display
    /// hook or the raw text.
    pub fn display_value(&self, row: &Record, level: Option<&Level>, value: &Value) -> String {
        match self.format {
            ColumnFormat::Number => {
                let n = value.as_number();
                if (n < 0.0 && self.suppress_negative)
                    || (n == 0.0 && self.suppress_zero)
                    || (n > 0.0 && self.suppress_positive)
                {
                    return String::new();
                }
                match &self.display {
                    Some(f) => f(row, level, value),
                    None => format_number(n, self.decimal_places, self.thousands_separator),
                }
            }
            ColumnFormat::Text => match &self.display {
                Some(f) => f(row, level, value),
                None => value.to_string(),
            },
        }
    }
}

/// Round to `places` decimal places, half away from zero.
///
/// Rounding operates on the value's shortest decimal representation, so a
/// value that prints as `1.005` rounds to `1.01` even though its nearest
/// binary double sits fractionally below the midpoint. Totals accumulation
/// and display formatting both go through here, keeping the two consistent.
pub fn round_half_away(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let text = format!("{}", value);
    let (neg, digits_text) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.as_str()),
    };
    let (int_part, frac_part) = digits_text.split_once('.').unwrap_or((digits_text, ""));
    let keep = places as usize;
    if frac_part.len() <= keep {
        return value;
    }

    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().take(keep))
        .map(|b| b - b'0')
        .collect();
    if frac_part.as_bytes()[keep] - b'0' >= 5 {
        let mut i = digits.len();
        loop {
            if i == 0 {
                digits.insert(0, 1);
                break;
            }
            i -= 1;
            if digits[i] == 9 {
                digits[i] = 0;
            } else {
                digits[i] += 1;
                break;
            }
        }
    }

    let int_len = digits.len() - keep;
    let mut out = String::with_capacity(digits.len() + 2);
    if neg {
        out.push('-');
    }
    for (i, d) in digits.iter().enumerate() {
        if i == int_len && keep > 0 {
            out.push('.');
        }
        out.push((b'0' + d) as char);
    }
    out.parse().unwrap_or(value)
}

/// Format a number with fixed decimal places and an optional thousands
/// separator: `1234.5` at two places becomes `1,234.50` (or `1234.50`).
pub fn format_number(value: f64, places: u32, thousands_separator: bool) -> String {
    let rounded = round_half_away(value, places);
    let fixed = format!("{:.*}", places as usize, rounded);
    if !thousands_separator {
        return fixed;
    }

    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}
