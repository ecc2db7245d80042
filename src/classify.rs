use std::fmt;

use log::warn;
use serde::Serialize;

use crate::{
    catalog::{DECIMAL_TIERS, MYSQL_VARCHAR_MAX_PROPOSED_LEN, TypeName, VARCHAR_BUCKETS},
    declaration::ColumnTypeSpec,
    value::{RawValue, is_zero_date_text},
};

/// Coarse type inferred for a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TypeTag {
    Bool,
    Integer,
    BigInt,
    Decimal,
    Double,
    Varchar,
    Text,
    Date,
    Datetime,
    Time,
}

impl TypeTag {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::Bool => "Bool",
            TypeTag::Integer => "Integer",
            TypeTag::BigInt => "BigInt",
            TypeTag::Decimal => "Decimal",
            TypeTag::Double => "Double",
            TypeTag::Varchar => "Varchar",
            TypeTag::Text => "Text",
            TypeTag::Date => "Date",
            TypeTag::Datetime => "Datetime",
            TypeTag::Time => "Time",
        }
    }

    pub fn type_name(self) -> TypeName {
        match self {
            TypeTag::Bool => TypeName::Bool,
            TypeTag::Integer => TypeName::Integer,
            TypeTag::BigInt => TypeName::Bigint,
            TypeTag::Decimal => TypeName::Decimal,
            TypeTag::Double => TypeName::Double,
            TypeTag::Varchar => TypeName::Varchar,
            TypeTag::Text => TypeName::Text,
            TypeTag::Date => TypeName::Date,
            TypeTag::Datetime => TypeName::Datetime,
            TypeTag::Time => TypeName::Time,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeHint {
    #[default]
    None,
    /// Bucketed column width for `Varchar`.
    Length(usize),
    /// Measured digits on each side of the decimal point.
    Digits { integer: u32, fractional: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub tag: TypeTag,
    pub hint: SizeHint,
    /// Set when a decimal value was too wide for every tier and fell back to `Double`.
    pub overflow: bool,
}

impl Classification {
    fn plain(tag: TypeTag) -> Self {
        Self {
            tag,
            hint: SizeHint::None,
            overflow: false,
        }
    }

    /// Declaration proposed for a column holding only this value.
    pub fn proposed_type(&self) -> ColumnTypeSpec {
        match (self.tag, self.hint) {
            (TypeTag::Varchar, SizeHint::Length(len)) => ColumnTypeSpec::varchar(len),
            (TypeTag::Decimal, SizeHint::Digits { integer, fractional }) => {
                match decimal_tier(integer, fractional) {
                    Some((precision, scale)) => ColumnTypeSpec::decimal(precision, scale),
                    None => ColumnTypeSpec::bare(TypeName::Double),
                }
            }
            (tag, _) => ColumnTypeSpec::bare(tag.type_name()),
        }
    }
}

/// Smallest varchar bucket holding `length` characters, `None` past the last bucket.
pub fn varchar_bucket(length: usize) -> Option<usize> {
    VARCHAR_BUCKETS.iter().copied().find(|bucket| length <= *bucket)
}

/// First decimal tier with room for the given digit counts.
pub fn decimal_tier(integer: u32, fractional: u32) -> Option<(u32, u32)> {
    DECIMAL_TIERS
        .iter()
        .copied()
        .find(|(max_integer, max_fractional)| integer <= *max_integer && fractional <= *max_fractional)
}

pub fn classify(value: &RawValue) -> Option<Classification> {
    let classification = match value {
        RawValue::Null => return None,
        RawValue::Text(text) => classify_text(text),
        RawValue::Guid(guid) => classify_text(&guid.to_string()),
        RawValue::Int8(_)
        | RawValue::UInt8(_)
        | RawValue::Int16(_)
        | RawValue::UInt16(_)
        | RawValue::Int32(_)
        | RawValue::UInt32(_) => Classification::plain(TypeTag::Integer),
        RawValue::Int64(_) | RawValue::UInt64(_) => Classification::plain(TypeTag::BigInt),
        RawValue::Float(_) | RawValue::Double(_) | RawValue::Decimal(_) => {
            classify_numeric_text(&value.as_display())
        }
        RawValue::Bool(_) => Classification::plain(TypeTag::Bool),
        RawValue::Date(_) | RawValue::DateTime(_) | RawValue::SqlDateTime(_) => {
            if value.as_display().contains(':') {
                Classification::plain(TypeTag::Datetime)
            } else {
                Classification::plain(TypeTag::Date)
            }
        }
        RawValue::Time(_) => Classification::plain(TypeTag::Time),
    };
    Some(classification)
}

fn classify_text(text: &str) -> Classification {
    if is_bool_synonym(text) {
        return Classification::plain(TypeTag::Bool);
    }
    if is_zero_date_text(text) {
        return Classification::plain(TypeTag::Datetime);
    }
    let length = text.chars().count();
    match varchar_bucket(length) {
        Some(bucket) => Classification {
            tag: TypeTag::Varchar,
            hint: SizeHint::Length(bucket),
            overflow: false,
        },
        None => Classification::plain(TypeTag::Text),
    }
}

fn is_bool_synonym(text: &str) -> bool {
    ["yes", "no", "ja", "nein"]
        .iter()
        .any(|synonym| text.eq_ignore_ascii_case(synonym))
}

fn classify_numeric_text(text: &str) -> Classification {
    if let Some((integer_part, fractional_part)) = text.split_once('.') {
        return classify_decimal_digits(text, integer_part, fractional_part);
    }
    if text.parse::<i32>().is_ok() {
        Classification::plain(TypeTag::Integer)
    } else if text.parse::<i64>().is_ok() {
        Classification::plain(TypeTag::BigInt)
    } else {
        Classification::plain(TypeTag::Double)
    }
}

fn classify_decimal_digits(text: &str, integer_part: &str, fractional_part: &str) -> Classification {
    let integer = count_digits(integer_part);
    let fractional = count_digits(fractional_part);
    if decimal_tier(integer, fractional).is_some() {
        return Classification {
            tag: TypeTag::Decimal,
            hint: SizeHint::Digits {
                integer,
                fractional,
            },
            overflow: false,
        };
    }
    warn!(
        "Value '{text}' has {integer} integer and {fractional} fractional digits; falling back to Double"
    );
    Classification {
        tag: TypeTag::Double,
        hint: SizeHint::None,
        overflow: true,
    }
}

fn count_digits(part: &str) -> u32 {
    let digits = part.bytes().filter(u8::is_ascii_digit).count();
    u32::try_from(digits).unwrap_or(u32::MAX)
}

/// The MySQL type a runtime value maps to when creating a column for it directly.
pub fn native_type_name(value: &RawValue) -> String {
    let name = match value {
        RawValue::Null => "",
        RawValue::Text(text) => {
            let length = text.chars().count();
            let rounded = length + (10 - length % 10);
            return if rounded > MYSQL_VARCHAR_MAX_PROPOSED_LEN {
                "text".to_string()
            } else {
                format!("varchar({rounded})")
            };
        }
        RawValue::Int8(_) | RawValue::UInt8(_) => "tinyint",
        RawValue::Int16(_) => "smallint",
        RawValue::UInt16(_) => "smallint unsigned",
        RawValue::Int32(_) => "int",
        RawValue::UInt32(_) => "int unsigned",
        RawValue::Int64(_) => "bigint",
        RawValue::UInt64(_) => "bigint unsigned",
        RawValue::Decimal(_) => "decimal",
        RawValue::Float(_) => "float",
        RawValue::Double(_) => "double",
        RawValue::Bool(_) => "bit",
        RawValue::Date(_) | RawValue::DateTime(_) | RawValue::SqlDateTime(_) => "datetime",
        RawValue::Time(_) => "time",
        RawValue::Guid(_) => "binary(16)",
    };
    name.to_string()
}
