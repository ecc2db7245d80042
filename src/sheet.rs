//! Sheet grids: rows of [`RawValue`] cells read from delimited text.

use std::{path::Path, sync::OnceLock};

use anyhow::Result;
use encoding_rs::Encoding;
use log::debug;
use regex::Regex;

use crate::{
    io_utils,
    value::{RawValue, parse_naive_date, parse_naive_datetime, parse_time_span},
};

pub type Grid = Vec<Vec<RawValue>>;

/// How cell text becomes a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellMode {
    /// Keep the text exactly as shown.
    Formatted,
    /// Recover the typed value a spreadsheet would hold for the cell.
    Unboxed,
}

impl CellMode {
    pub fn from_formatted_flag(use_formatted_values: bool) -> Self {
        if use_formatted_values {
            CellMode::Formatted
        } else {
            CellMode::Unboxed
        }
    }
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?$")
            .expect("number pattern is valid")
    })
}

fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9]{1,3}:[0-5][0-9](?::[0-5][0-9])?$").expect("time pattern is valid")
    })
}

pub fn cell_value(text: &str, mode: CellMode) -> RawValue {
    if text.is_empty() {
        return RawValue::Null;
    }
    match mode {
        CellMode::Formatted => RawValue::Text(text.to_string()),
        CellMode::Unboxed => unbox_cell(text),
    }
}

/// Numbers become doubles, `TRUE`/`FALSE` booleans, and ISO-like dates and
/// times their temporal values. Anything else stays text.
pub fn unbox_cell(text: &str) -> RawValue {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return RawValue::Null;
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return RawValue::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return RawValue::Bool(false);
    }
    if number_pattern().is_match(trimmed)
        && let Ok(number) = trimmed.parse::<f64>()
        && number.is_finite()
    {
        return RawValue::Double(number);
    }
    if let Ok(datetime) = parse_naive_datetime(trimmed) {
        return RawValue::DateTime(datetime);
    }
    if let Ok(date) = parse_naive_date(trimmed) {
        return RawValue::Date(date);
    }
    if time_pattern().is_match(trimmed)
        && let Ok(span) = parse_time_span(trimmed)
    {
        return RawValue::Time(span);
    }
    RawValue::Text(text.to_string())
}

pub fn read_grid(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
    mode: CellMode,
    limit: Option<usize>,
) -> Result<Grid> {
    let records = io_utils::read_records(path, delimiter, encoding, limit)?;
    debug!("Read {} row(s) from {path:?} in {mode:?} mode", records.len());
    Ok(records
        .iter()
        .map(|record| record.iter().map(|field| cell_value(field, mode)).collect())
        .collect())
}

/// Column count of the widest row.
pub fn grid_width(grid: &[Vec<RawValue>]) -> usize {
    grid.iter().map(Vec::len).max().unwrap_or(0)
}
