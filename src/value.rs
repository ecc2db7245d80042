use std::fmt;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::catalog::{MYSQL_DATE_FORMAT, MYSQL_EMPTY_DATE};

/// A single cell as read from a spreadsheet, before any column typing.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Text(String),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    SqlDateTime(SqlDateTime),
    Time(TimeDelta),
    Guid(Uuid),
}

/// The MySQL driver's date-time, which can hold the all-zero date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlDateTime {
    Zero,
    Valid(NaiveDateTime),
}

impl SqlDateTime {
    pub fn is_valid(&self) -> bool {
        matches!(self, SqlDateTime::Valid(_))
    }

    pub fn valid(&self) -> Option<NaiveDateTime> {
        match self {
            SqlDateTime::Zero => None,
            SqlDateTime::Valid(dt) => Some(*dt),
        }
    }

    /// Converts to a native date-time, mapping the zero date to [`native_min_datetime`].
    pub fn to_native(self) -> NaiveDateTime {
        self.valid().unwrap_or_else(native_min_datetime)
    }

    pub fn parse(value: &str) -> Option<Self> {
        if is_zero_date_text(value) {
            return Some(SqlDateTime::Zero);
        }
        parse_date_like(value).map(SqlDateTime::Valid)
    }
}

impl From<NaiveDateTime> for SqlDateTime {
    fn from(value: NaiveDateTime) -> Self {
        SqlDateTime::Valid(value)
    }
}

impl fmt::Display for SqlDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlDateTime::Zero => f.write_str(MYSQL_EMPTY_DATE),
            SqlDateTime::Valid(dt) => write!(f, "{}", dt.format(MYSQL_DATE_FORMAT)),
        }
    }
}

/// The smallest native date-time, `0001-01-01 00:00:00`, standing in for "no date".
pub fn native_min_datetime() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .unwrap_or(NaiveDate::MIN)
        .and_time(NaiveTime::MIN)
}

impl RawValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    pub fn as_display(&self) -> String {
        match self {
            RawValue::Null => String::new(),
            RawValue::Text(s) => s.clone(),
            RawValue::Int8(v) => v.to_string(),
            RawValue::UInt8(v) => v.to_string(),
            RawValue::Int16(v) => v.to_string(),
            RawValue::UInt16(v) => v.to_string(),
            RawValue::Int32(v) => v.to_string(),
            RawValue::UInt32(v) => v.to_string(),
            RawValue::Int64(v) => v.to_string(),
            RawValue::UInt64(v) => v.to_string(),
            RawValue::Float(v) => v.to_string(),
            RawValue::Double(v) => v.to_string(),
            RawValue::Decimal(v) => v.to_string(),
            RawValue::Bool(b) => b.to_string(),
            RawValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            RawValue::DateTime(dt) => dt.format(MYSQL_DATE_FORMAT).to_string(),
            RawValue::SqlDateTime(sd) => sd.to_string(),
            RawValue::Time(span) => format_time_span(*span),
            RawValue::Guid(g) => g.to_string(),
        }
    }

    /// Invariant numeric text for numeric variants, `None` for everything else.
    pub fn numeric_literal(&self) -> Option<String> {
        let literal = match self {
            RawValue::Int8(v) => v.to_string(),
            RawValue::UInt8(v) => v.to_string(),
            RawValue::Int16(v) => v.to_string(),
            RawValue::UInt16(v) => v.to_string(),
            RawValue::Int32(v) => v.to_string(),
            RawValue::UInt32(v) => v.to_string(),
            RawValue::Int64(v) => v.to_string(),
            RawValue::UInt64(v) => v.to_string(),
            RawValue::Float(v) => v.to_string(),
            RawValue::Double(v) => v.to_string(),
            RawValue::Decimal(v) => v.to_string(),
            _ => return None,
        };
        Some(literal)
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// True when the text starts with one of the zero-date markers.
pub fn is_zero_date_text(value: &str) -> bool {
    value.starts_with("0000-00-00") || value.starts_with("00-00-00")
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &[
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%d/%m/%Y",
        "%d.%m.%Y",
        "%d-%m-%Y",
    ];
    let trimmed = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %I:%M:%S %p",
        "%d/%m/%Y %H:%M:%S",
        "%d.%m.%Y %H:%M:%S",
        "%d.%m.%Y %H:%M",
    ];
    let trimmed = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| anyhow!("Failed to parse '{value}' as datetime"))
}

/// Parses either a date-time or a bare date (at midnight).
pub fn parse_date_like(value: &str) -> Option<NaiveDateTime> {
    parse_naive_datetime(value)
        .ok()
        .or_else(|| {
            parse_naive_date(value)
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Parses `[-]H:MM[:SS]`, where hours may exceed 23.
pub fn parse_time_span(value: &str) -> Result<TimeDelta> {
    let trimmed = value.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let parts = body.split(':').collect::<Vec<_>>();
    if !(2..=3).contains(&parts.len()) {
        bail!("Failed to parse '{value}' as time");
    }
    let mut fields = [0i64; 3];
    for (slot, part) in fields.iter_mut().zip(&parts) {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            bail!("Failed to parse '{value}' as time");
        }
        *slot = part
            .parse()
            .with_context(|| format!("Failed to parse '{value}' as time"))?;
    }
    let [hours, minutes, seconds] = fields;
    if minutes > 59 || seconds > 59 {
        bail!("Time '{value}' has minutes or seconds out of range");
    }
    let total = hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes * 60 + seconds))
        .ok_or_else(|| anyhow!("Time '{value}' is out of range"))?;
    let total = if negative { -total } else { total };
    TimeDelta::try_seconds(total).ok_or_else(|| anyhow!("Time '{value}' is out of range"))
}

pub fn format_time_span(span: TimeDelta) -> String {
    let total = span.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.unsigned_abs();
    format!(
        "{sign}{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
