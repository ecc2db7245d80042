use std::{str::FromStr, sync::OnceLock};

use log::debug;
use regex::Regex;
use uuid::Uuid;

use crate::{
    catalog::TypeName,
    declaration::ColumnTypeSpec,
    value::{RawValue, SqlDateTime, is_zero_date_text, parse_date_like, parse_time_span},
};

/// Varchar length assumed for a bare `varchar` declaration.
const BARE_VARCHAR_LENGTH: u32 = 65535;
/// Precision and scale MySQL assumes for a bare `decimal`.
const BARE_DECIMAL: (u32, u32) = (10, 0);

/// Whether an already stored value equals an incoming spreadsheet value.
///
/// Values are equal when they are natively equal, or when the incoming value's
/// text parses, with the stored value's own parser, into an equal value.
pub fn values_equal(stored: &RawValue, input: &RawValue) -> bool {
    if stored == input {
        return true;
    }
    let input_text = input.as_display();
    let integral_text = match input {
        RawValue::Bool(true) => "1",
        RawValue::Bool(false) => "0",
        _ => input_text.as_str(),
    };
    match stored {
        RawValue::Null => false,
        RawValue::Text(text) => *text == input_text,
        RawValue::Int8(v) => parses_to(integral_text, v),
        RawValue::UInt8(v) => parses_to(integral_text, v),
        RawValue::Int16(v) => parses_to(integral_text, v),
        RawValue::UInt16(v) => parses_to(integral_text, v),
        RawValue::Int32(v) => parses_to(integral_text, v),
        RawValue::UInt32(v) => parses_to(integral_text, v),
        RawValue::Int64(v) => parses_to(integral_text, v),
        RawValue::UInt64(v) => parses_to(integral_text, v),
        RawValue::Decimal(v) => parses_to(&input_text, v),
        RawValue::Float(v) => input_text
            .trim()
            .parse::<f32>()
            .is_ok_and(|parsed| parsed == *v || (parsed.is_nan() && v.is_nan())),
        RawValue::Double(v) => input_text
            .trim()
            .parse::<f64>()
            .is_ok_and(|parsed| parsed == *v || (parsed.is_nan() && v.is_nan())),
        RawValue::Bool(v) => parse_bool_text(&input_text) == Some(*v),
        RawValue::Date(date) => {
            parse_date_like(&input_text) == Some(date.and_time(chrono::NaiveTime::MIN))
        }
        RawValue::DateTime(dt) => parse_date_like(&input_text) == Some(*dt),
        RawValue::SqlDateTime(sql_date) => SqlDateTime::parse(&input_text) == Some(*sql_date),
        RawValue::Time(span) => parse_time_span(&input_text).is_ok_and(|parsed| parsed == *span),
        RawValue::Guid(guid) => {
            let trimmed = input_text.trim().trim_matches(|c| matches!(c, '{' | '}'));
            Uuid::parse_str(trimmed).is_ok_and(|parsed| parsed == *guid)
        }
    }
}

fn parses_to<T>(text: &str, expected: &T) -> bool
where
    T: FromStr + PartialEq,
{
    text.trim()
        .parse::<T>()
        .is_ok_and(|parsed| parsed == *expected)
}

fn parse_bool_text(text: &str) -> Option<bool> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("true") || trimmed == "1" {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("false") || trimmed == "0" {
        Some(false)
    } else {
        None
    }
}

/// Whether `value` can be stored in a column declared as `declaration`.
/// Invalid declarations accept nothing.
pub fn can_store(value: &str, declaration: &str) -> bool {
    let spec = match ColumnTypeSpec::parse(declaration) {
        Ok(spec) => spec,
        Err(err) => {
            debug!("Cannot check '{value}' against '{declaration}': {err}");
            return false;
        }
    };
    use TypeName as T;
    let name = spec.name();
    match name {
        T::Tinytext
        | T::Text
        | T::Mediumtext
        | T::Longtext
        | T::Tinyblob
        | T::Blob
        | T::Mediumblob
        | T::Longblob
        | T::Binary
        | T::Varbinary => true,
        T::Bool | T::Boolean => is_bool_text(value),
        T::Bit if matches!(spec.length(), None | Some(1)) => is_bool_text(value),
        T::Bit => value.parse::<u64>().is_ok(),
        T::Int | T::Integer | T::Mediumint => value.parse::<i32>().is_ok(),
        T::Tinyint => value.parse::<u8>().is_ok(),
        T::Smallint => value.parse::<i16>().is_ok(),
        T::Bigint => value.parse::<i64>().is_ok(),
        T::Year => value
            .parse::<i32>()
            .is_ok_and(|year| (0..100).contains(&year) || (1901..2156).contains(&year)),
        T::Float => value.parse::<f32>().is_ok(),
        T::Double | T::Real => value.parse::<f64>().is_ok(),
        T::Time => parse_time_span(value).is_ok(),
        T::Date | T::Datetime | T::Timestamp => {
            is_zero_date_text(value) || parse_date_like(value).is_some()
        }
        T::Char | T::Varchar => {
            let default = if name == T::Char { 1 } else { BARE_VARCHAR_LENGTH };
            let limit = spec.length().unwrap_or(default);
            value.chars().count() <= limit as usize
        }
        T::Enum => spec
            .members()
            .is_some_and(|members| contains_member(members, value)),
        T::Set => spec.members().is_some_and(|members| {
            value
                .split(',')
                .all(|part| contains_member(members, part))
        }),
        T::Decimal | T::Numeric => {
            let (precision, scale) = spec.precision_scale().unwrap_or(BARE_DECIMAL);
            decimal_fits(value, precision, scale)
        }
    }
}

fn is_bool_text(value: &str) -> bool {
    let lowered = value.to_lowercase();
    matches!(
        lowered.as_str(),
        "true" | "false" | "0" | "1" | "yes" | "no" | "ja" | "nein"
    )
}

fn contains_member(members: &[String], value: &str) -> bool {
    let lowered = value.to_lowercase();
    members.iter().any(|member| member.to_lowercase() == lowered)
}

fn decimal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?(?P<int>[0-9]*)(?:\.(?P<frac>[0-9]*))?$")
            .expect("decimal pattern is valid")
    })
}

fn decimal_fits(value: &str, precision: u32, scale: u32) -> bool {
    let Some(captures) = decimal_pattern().captures(value.trim()) else {
        return false;
    };
    let integer = captures.name("int").map_or(0, |m| m.as_str().len());
    let fractional = captures.name("frac").map_or(0, |m| m.as_str().len());
    if integer + fractional == 0 {
        return false;
    }
    integer <= precision as usize && fractional <= scale as usize
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn native_equality_short_circuits() {
        assert!(values_equal(&RawValue::Int32(5), &RawValue::Int32(5)));
        assert!(!values_equal(&RawValue::Null, &RawValue::Text(String::new())));
    }

    #[test]
    fn input_text_is_parsed_with_stored_type() {
        assert!(values_equal(&RawValue::Int32(42), &RawValue::Text("42".into())));
        assert!(values_equal(&RawValue::Int64(42), &RawValue::Double(42.0)));
        assert!(!values_equal(&RawValue::Int32(42), &RawValue::Text("42.5".into())));
        assert!(values_equal(
            &RawValue::Decimal(Decimal::new(150, 2)),
            &RawValue::Text("1.5".into())
        ));
        assert!(values_equal(&RawValue::Double(0.25), &RawValue::Text("0.25".into())));
        let date = NaiveDate::from_ymd_opt(2022, 12, 31).unwrap();
        assert!(values_equal(
            &RawValue::DateTime(date.and_hms_opt(8, 30, 0).unwrap()),
            &RawValue::Text("2022-12-31 08:30:00".into())
        ));
        assert!(values_equal(
            &RawValue::SqlDateTime(SqlDateTime::Zero),
            &RawValue::Text("0000-00-00 00:00:00".into())
        ));
    }

    #[test]
    fn booleans_normalize_for_integer_columns() {
        assert!(values_equal(&RawValue::Int8(1), &RawValue::Bool(true)));
        assert!(values_equal(&RawValue::UInt64(0), &RawValue::Bool(false)));
        assert!(values_equal(&RawValue::Bool(true), &RawValue::Text("1".into())));
        assert!(values_equal(&RawValue::Bool(false), &RawValue::Text("False".into())));
        assert!(!values_equal(&RawValue::Bool(false), &RawValue::Bool(true)));
    }

    #[test]
    fn text_columns_compare_display_forms() {
        assert!(values_equal(&RawValue::Text("true".into()), &RawValue::Bool(true)));
        assert!(!values_equal(&RawValue::Text("abc".into()), &RawValue::Text("ABC".into())));
    }

    #[test]
    fn storability_of_numbers() {
        assert!(can_store("255", "tinyint"));
        assert!(!can_store("256", "tinyint"));
        assert!(can_store("-32768", "smallint"));
        assert!(!can_store("3000000000", "int(11)"));
        assert!(can_store("3000000000", "bigint"));
        assert!(can_store("1.5e3", "double"));
        assert!(!can_store("abc", "float"));
        assert!(can_store("99", "year"));
        assert!(can_store("2024", "year(4)"));
        assert!(!can_store("1900", "year"));
    }

    #[test]
    fn storability_of_decimals() {
        assert!(can_store("1234.56", "decimal(12,2)"));
        assert!(!can_store("1234.567", "decimal(12,2)"));
        assert!(can_store("-42", "numeric(5,2)"));
        assert!(!can_store("1.5", "decimal"));
        assert!(can_store(&format!("{}.5", "9".repeat(40)), "decimal(65,30)"));
        assert!(!can_store("1.2.3", "decimal(12,2)"));
        assert!(!can_store(".", "decimal(12,2)"));
    }

    #[test]
    fn storability_of_text_and_members() {
        assert!(can_store("anything at all", "longtext"));
        assert!(can_store("x", "char"));
        assert!(!can_store("xy", "char"));
        assert!(can_store("hello", "varchar(5)"));
        assert!(!can_store("hello!", "varchar(5)"));
        assert!(can_store("Red", "enum('red','green')"));
        assert!(!can_store("blue", "enum('red','green')"));
        assert!(can_store("red,green", "set('red','green')"));
        assert!(!can_store("red,blue", "set('red','green')"));
    }

    #[test]
    fn storability_of_booleans_and_dates() {
        assert!(can_store("Nein", "bool"));
        assert!(can_store("1", "bit(1)"));
        assert!(!can_store("2", "bit"));
        assert!(can_store("255", "bit(8)"));
        assert!(can_store("0000-00-00", "date"));
        assert!(can_store("2024-01-31 12:00:00", "timestamp"));
        assert!(!can_store("tomorrow", "datetime"));
        assert!(can_store("12:30:00", "time"));
        assert!(!can_store("x", "nonsense"));
    }
}
