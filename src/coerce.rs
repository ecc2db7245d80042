//! Conversion of raw cell values into the values and SQL literals a target
//! column accepts.

use std::borrow::Cow;

use chrono::{NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::{
    catalog::{MYSQL_DATE_FORMAT, MYSQL_EMPTY_DATE, TypeFamily, TypeName},
    declaration::ColumnTypeSpec,
    mapping::{RuntimeType, runtime_type_of},
    value::{RawValue, SqlDateTime, is_zero_date_text, native_min_datetime, parse_date_like},
};

/// A coerced value; [`RawValue::Null`] stands for SQL NULL.
pub type CoercedValue = RawValue;

/// Storage traits of the column a value is being written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnTarget {
    pub allow_null: bool,
    pub is_numeric: bool,
    pub is_binary: bool,
    pub is_bool: bool,
    pub is_date: bool,
    pub requires_quoting: bool,
    pub runtime_type: RuntimeType,
}

impl ColumnTarget {
    pub fn for_spec(
        spec: &ColumnTypeSpec,
        allow_null: bool,
        unsigned: bool,
        dates_as_sql_dates: bool,
    ) -> Self {
        let name = spec.name();
        let single_bit = matches!(name, TypeName::Bit | TypeName::Tinyint) && spec.length() == Some(1);
        let family = name.family();
        let is_bool = family == TypeFamily::Boolean || single_bit;
        let runtime_type = if is_bool {
            RuntimeType::Bool
        } else {
            runtime_type_of(name, unsigned, dates_as_sql_dates)
        };
        Self {
            allow_null,
            is_numeric: family == TypeFamily::Numeric && !is_bool,
            is_binary: family == TypeFamily::Binary,
            is_bool,
            is_date: family == TypeFamily::Date,
            requires_quoting: matches!(
                family,
                TypeFamily::Text | TypeFamily::Date | TypeFamily::Time
            ),
            runtime_type,
        }
    }

    fn uses_native_dates(&self) -> bool {
        self.runtime_type == RuntimeType::DateTime
    }

    fn zero_date(&self) -> CoercedValue {
        if self.uses_native_dates() {
            RawValue::DateTime(native_min_datetime())
        } else {
            RawValue::SqlDateTime(SqlDateTime::Zero)
        }
    }

    fn date_value(&self, value: NaiveDateTime) -> CoercedValue {
        if self.uses_native_dates() {
            RawValue::DateTime(value)
        } else {
            RawValue::SqlDateTime(SqlDateTime::Valid(value))
        }
    }
}

/// Converts `raw` into a value the target column accepts. Values that cannot
/// be converted are returned unchanged.
pub fn coerce(raw: &RawValue, target: &ColumnTarget, escape_text: bool) -> CoercedValue {
    if raw.is_null() {
        return null_replacement(target);
    }
    if target.is_date {
        return coerce_date(raw, target);
    }
    if target.is_bool {
        return coerce_bool(raw);
    }
    if target.requires_quoting {
        let text = raw.as_display();
        return if escape_text {
            RawValue::Text(escape_data_value(&text).into_owned())
        } else {
            RawValue::Text(text)
        };
    }
    raw.clone()
}

fn null_replacement(target: &ColumnTarget) -> CoercedValue {
    if target.allow_null {
        RawValue::Null
    } else if target.is_numeric || target.is_binary {
        RawValue::Int32(0)
    } else if target.is_bool {
        RawValue::Bool(false)
    } else if target.is_date {
        target.zero_date()
    } else if target.requires_quoting {
        RawValue::Text(String::new())
    } else {
        RawValue::Null
    }
}

fn coerce_date(raw: &RawValue, target: &ColumnTarget) -> CoercedValue {
    match raw {
        RawValue::DateTime(dt) => target.date_value(*dt),
        RawValue::Date(date) => target.date_value(date.and_time(NaiveTime::MIN)),
        RawValue::SqlDateTime(SqlDateTime::Valid(dt)) => target.date_value(*dt),
        RawValue::SqlDateTime(SqlDateTime::Zero) => target.zero_date(),
        other => {
            let text = other.as_display();
            if is_zero_date_text(&text) || text == "0" {
                target.zero_date()
            } else if let Some(parsed) = parse_date_like(&text) {
                target.date_value(parsed)
            } else {
                raw.clone()
            }
        }
    }
}

fn coerce_bool(raw: &RawValue) -> CoercedValue {
    let text = raw.as_display().to_lowercase();
    match text.as_str() {
        "1" | "true" | "yes" | "ja" => RawValue::Bool(true),
        "0" | "false" | "no" | "nein" => RawValue::Bool(false),
        _ => raw.clone(),
    }
}

/// Backslash-escapes the characters MySQL treats specially inside quoted literals.
pub fn escape_data_value(text: &str) -> Cow<'_, str> {
    let needs_escape = |ch: char| matches!(ch, '\\' | '\'' | '"' | '\0' | '\n' | '\r' | '\t' | '\u{1a}');
    if !text.chars().any(needs_escape) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '\0' => escaped.push_str("\\0"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '\u{1a}' => escaped.push_str("\\Z"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

/// Text form of a value ready to place in an INSERT statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageLiteral {
    pub text: String,
    pub is_null: bool,
}

impl StorageLiteral {
    pub fn null() -> Self {
        Self {
            text: "null".to_string(),
            is_null: true,
        }
    }

    fn value(text: String) -> Self {
        Self {
            text,
            is_null: false,
        }
    }
}

/// Renders `raw` for storage in the target column. With `for_insertion` the
/// value is coerced (and text escaped) first.
pub fn format_for_storage(raw: &RawValue, target: &ColumnTarget, for_insertion: bool) -> StorageLiteral {
    let coerced;
    let value = if for_insertion {
        coerced = coerce(raw, target, true);
        &coerced
    } else {
        raw
    };
    match value {
        RawValue::Null => StorageLiteral::null(),
        RawValue::DateTime(dt) => format_datetime(Some(*dt), target),
        RawValue::Date(date) => format_datetime(Some(date.and_time(NaiveTime::MIN)), target),
        RawValue::SqlDateTime(sql_date) => format_datetime(sql_date.valid(), target),
        other => StorageLiteral::value(other.numeric_literal().unwrap_or_else(|| other.as_display())),
    }
}

fn format_datetime(value: Option<NaiveDateTime>, target: &ColumnTarget) -> StorageLiteral {
    match value.filter(|dt| *dt != native_min_datetime()) {
        Some(dt) => StorageLiteral::value(dt.format(MYSQL_DATE_FORMAT).to_string()),
        None if target.allow_null => StorageLiteral::null(),
        None => StorageLiteral::value(MYSQL_EMPTY_DATE.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn target(declaration: &str, allow_null: bool) -> ColumnTarget {
        let spec = ColumnTypeSpec::parse(declaration).unwrap();
        ColumnTarget::for_spec(&spec, allow_null, false, false)
    }

    fn sql_date_target(declaration: &str, allow_null: bool) -> ColumnTarget {
        let spec = ColumnTypeSpec::parse(declaration).unwrap();
        ColumnTarget::for_spec(&spec, allow_null, false, true)
    }

    #[test]
    fn target_flags_follow_type_family() {
        let int = target("int", false);
        assert!(int.is_numeric && !int.requires_quoting);
        let varchar = target("varchar(10)", false);
        assert!(varchar.requires_quoting && !varchar.is_numeric);
        let date = target("datetime", false);
        assert!(date.is_date && date.requires_quoting);
        assert!(target("bit(1)", false).is_bool);
        assert!(!target("bit(8)", false).is_bool);
        assert!(target("blob", false).is_binary);
        assert!(target("time", false).requires_quoting);
    }

    #[test]
    fn nulls_become_type_defaults_when_not_nullable() {
        assert_eq!(coerce(&RawValue::Null, &target("int", true), true), RawValue::Null);
        assert_eq!(coerce(&RawValue::Null, &target("int", false), true), RawValue::Int32(0));
        assert_eq!(coerce(&RawValue::Null, &target("blob", false), true), RawValue::Int32(0));
        assert_eq!(
            coerce(&RawValue::Null, &target("bool", false), true),
            RawValue::Bool(false)
        );
        assert_eq!(
            coerce(&RawValue::Null, &target("varchar(5)", false), true),
            RawValue::Text(String::new())
        );
        assert_eq!(
            coerce(&RawValue::Null, &target("date", false), true),
            RawValue::DateTime(native_min_datetime())
        );
        assert_eq!(
            coerce(&RawValue::Null, &sql_date_target("date", false), true),
            RawValue::SqlDateTime(SqlDateTime::Zero)
        );
    }

    #[test]
    fn dates_parse_from_text_and_zero_markers() {
        let expected = NaiveDate::from_ymd_opt(2023, 1, 5)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(
            coerce(&RawValue::Text("2023-01-05 10:00:00".into()), &target("datetime", false), false),
            RawValue::DateTime(expected)
        );
        assert_eq!(
            coerce(&RawValue::Text("0".into()), &sql_date_target("datetime", false), false),
            RawValue::SqlDateTime(SqlDateTime::Zero)
        );
        assert_eq!(
            coerce(&RawValue::Text("00-00-00".into()), &target("date", false), false),
            RawValue::DateTime(native_min_datetime())
        );
        let junk = RawValue::Text("soon".into());
        assert_eq!(coerce(&junk, &target("date", false), false), junk);
        assert_eq!(
            coerce(
                &RawValue::SqlDateTime(SqlDateTime::Zero),
                &target("datetime", false),
                false
            ),
            RawValue::DateTime(native_min_datetime())
        );
    }

    #[test]
    fn boolean_synonyms_coerce() {
        let target = target("bool", false);
        assert_eq!(coerce(&RawValue::Text("Ja".into()), &target, false), RawValue::Bool(true));
        assert_eq!(coerce(&RawValue::Text("NO".into()), &target, false), RawValue::Bool(false));
        assert_eq!(coerce(&RawValue::Int32(1), &target, false), RawValue::Bool(true));
        let other = RawValue::Text("maybe".into());
        assert_eq!(coerce(&other, &target, false), other);
    }

    #[test]
    fn quoted_targets_receive_escaped_text() {
        let target = target("varchar(45)", false);
        assert_eq!(
            coerce(&RawValue::Text("O'Brien \"x\"\n".into()), &target, true),
            RawValue::Text("O\\'Brien \\\"x\\\"\\n".into())
        );
        assert_eq!(
            coerce(&RawValue::Text("O'Brien".into()), &target, false),
            RawValue::Text("O'Brien".into())
        );
        assert_eq!(coerce(&RawValue::Double(2.5), &target, true), RawValue::Text("2.5".into()));
    }

    #[test]
    fn escaping_borrows_clean_text() {
        assert!(matches!(escape_data_value("plain"), Cow::Borrowed("plain")));
        assert_eq!(escape_data_value("a\\b\0\u{1a}\t\r"), "a\\\\b\\0\\Z\\t\\r");
    }

    #[test]
    fn zero_dates_format_as_null_or_empty_date() {
        let nullable = sql_date_target("datetime", true);
        let strict = sql_date_target("datetime", false);
        let zero = RawValue::SqlDateTime(SqlDateTime::Zero);
        assert_eq!(format_for_storage(&zero, &nullable, false), StorageLiteral::null());
        assert_eq!(
            format_for_storage(&zero, &strict, false).text,
            "0000-00-00 00:00:00"
        );
        let native_min = RawValue::DateTime(native_min_datetime());
        assert!(format_for_storage(&native_min, &target("date", true), false).is_null);
        assert_eq!(
            format_for_storage(&native_min, &target("date", false), false).text,
            MYSQL_EMPTY_DATE
        );
    }

    #[test]
    fn storage_literals_use_invariant_forms() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            format_for_storage(&RawValue::Date(date), &target("date", false), false).text,
            "2024-02-29 00:00:00"
        );
        assert_eq!(
            format_for_storage(&RawValue::Double(1234.5), &target("double", false), false).text,
            "1234.5"
        );
        assert_eq!(
            format_for_storage(&RawValue::Null, &target("int", true), false),
            StorageLiteral::null()
        );
        assert_eq!(
            format_for_storage(&RawValue::Null, &target("int", false), true).text,
            "0"
        );
        assert_eq!(
            format_for_storage(&RawValue::Text("yes".into()), &target("bool", false), true).text,
            "true"
        );
    }
}
