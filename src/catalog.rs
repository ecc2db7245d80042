//! Catalog of the MySQL column types this crate understands.
//!
//! The catalog is a single static table mapping every [`TypeName`] to the
//! number of parameters its declaration accepts and the coarse family it
//! belongs to. It is never mutated, so concurrent readers need no
//! synchronization.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// chrono pattern equivalent to MySQL's `yyyy-MM-dd HH:mm:ss` literal form.
pub const MYSQL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The all-zero date MySQL uses for "no valid date", distinct from NULL.
pub const MYSQL_EMPTY_DATE: &str = "0000-00-00 00:00:00";

/// Largest varchar length proposed before falling back to `text`.
pub const MYSQL_VARCHAR_MAX_PROPOSED_LEN: usize = 4000;

/// Column widths proposed for text values, smallest first.
pub const VARCHAR_BUCKETS: [usize; 6] = [5, 12, 25, 45, 255, MYSQL_VARCHAR_MAX_PROPOSED_LEN];

/// `(integer digits, fractional digits)` tiers tried in order when sizing decimals.
pub const DECIMAL_TIERS: [(u32, u32); 2] = [(12, 2), (65, 30)];

/// Declarations offered to users picking a column type by hand.
pub const PRESET_DECLARATIONS: &[(&str, &str)] = &[
    ("Integer", "Default for whole-number columns"),
    ("Varchar(5)", "Small string up to 5 characters"),
    ("Varchar(12)", "Small string up to 12 characters"),
    ("Varchar(25)", "Small string up to 25 characters"),
    ("Varchar(45)", "Standard string up to 45 characters"),
    ("Varchar(255)", "Standard string up to 255 characters"),
    ("Varchar(4000)", "Large string up to 4k characters"),
    ("Varchar(65535)", "Maximum string up to 65k characters"),
    ("Datetime", "For columns that store both, date and time"),
    ("Date", "For columns that only store a date"),
    ("Time", "For columns that only store a time"),
    ("Bool", "Holds values like (0, 1), (True, False) or (Yes, No)"),
    ("BigInt", "For columns containing large whole-number integers with up to 19 digits"),
    ("Decimal(12, 2)", "Exact decimal numbers with 12 digits with 2 of them after decimal point"),
    ("Decimal(65, 30)", "Biggest exact decimal numbers with 65 digits with 30 of them after decimal point"),
    ("Double", "Biggest float pointing number with approximately 15 decimal places"),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Unknown MySQL data type '{0}'")]
    UnknownType(String),
    #[error("Unhandled type encountered: '{0}' has no runtime mapping")]
    UnhandledType(String),
}

/// Number of parenthesized parameters a declaration of the type accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Arity {
    None,
    One,
    Two,
    /// Variable-length member list, used by `enum` and `set`.
    Members,
}

impl Arity {
    /// Fixed parameter count, or `None` for member lists.
    pub fn count(self) -> Option<usize> {
        match self {
            Arity::None => Some(0),
            Arity::One => Some(1),
            Arity::Two => Some(2),
            Arity::Members => None,
        }
    }

    /// The legacy numeric encoding: 0, 1, 2, or -1 for member lists.
    pub fn as_i8(self) -> i8 {
        match self {
            Arity::None => 0,
            Arity::One => 1,
            Arity::Two => 2,
            Arity::Members => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFamily {
    Numeric,
    Boolean,
    Date,
    Time,
    Text,
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeName {
    Bit,
    Tinyint,
    Smallint,
    Mediumint,
    Int,
    Integer,
    Bigint,
    Float,
    Double,
    Decimal,
    Numeric,
    Real,
    Bool,
    Boolean,
    Date,
    Datetime,
    Timestamp,
    Time,
    Year,
    Char,
    Varchar,
    Binary,
    Varbinary,
    Tinyblob,
    Tinytext,
    Blob,
    Text,
    Mediumblob,
    Mediumtext,
    Longblob,
    Longtext,
    Enum,
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: TypeName,
    pub arity: Arity,
    pub family: TypeFamily,
}

const fn entry(name: TypeName, arity: Arity, family: TypeFamily) -> CatalogEntry {
    CatalogEntry {
        name,
        arity,
        family,
    }
}

// Entries are laid out in `TypeName` discriminant order; `TypeName::entry` relies on it.
static CATALOG: [CatalogEntry; 33] = [
    entry(TypeName::Bit, Arity::One, TypeFamily::Numeric),
    entry(TypeName::Tinyint, Arity::One, TypeFamily::Numeric),
    entry(TypeName::Smallint, Arity::One, TypeFamily::Numeric),
    entry(TypeName::Mediumint, Arity::One, TypeFamily::Numeric),
    entry(TypeName::Int, Arity::One, TypeFamily::Numeric),
    entry(TypeName::Integer, Arity::One, TypeFamily::Numeric),
    entry(TypeName::Bigint, Arity::One, TypeFamily::Numeric),
    entry(TypeName::Float, Arity::Two, TypeFamily::Numeric),
    entry(TypeName::Double, Arity::Two, TypeFamily::Numeric),
    entry(TypeName::Decimal, Arity::Two, TypeFamily::Numeric),
    entry(TypeName::Numeric, Arity::Two, TypeFamily::Numeric),
    entry(TypeName::Real, Arity::Two, TypeFamily::Numeric),
    entry(TypeName::Bool, Arity::None, TypeFamily::Boolean),
    entry(TypeName::Boolean, Arity::None, TypeFamily::Boolean),
    entry(TypeName::Date, Arity::None, TypeFamily::Date),
    entry(TypeName::Datetime, Arity::None, TypeFamily::Date),
    entry(TypeName::Timestamp, Arity::None, TypeFamily::Date),
    entry(TypeName::Time, Arity::None, TypeFamily::Time),
    entry(TypeName::Year, Arity::One, TypeFamily::Numeric),
    entry(TypeName::Char, Arity::One, TypeFamily::Text),
    entry(TypeName::Varchar, Arity::One, TypeFamily::Text),
    entry(TypeName::Binary, Arity::One, TypeFamily::Binary),
    entry(TypeName::Varbinary, Arity::One, TypeFamily::Binary),
    entry(TypeName::Tinyblob, Arity::None, TypeFamily::Binary),
    entry(TypeName::Tinytext, Arity::None, TypeFamily::Text),
    entry(TypeName::Blob, Arity::None, TypeFamily::Binary),
    entry(TypeName::Text, Arity::None, TypeFamily::Text),
    entry(TypeName::Mediumblob, Arity::None, TypeFamily::Binary),
    entry(TypeName::Mediumtext, Arity::None, TypeFamily::Text),
    entry(TypeName::Longblob, Arity::None, TypeFamily::Binary),
    entry(TypeName::Longtext, Arity::None, TypeFamily::Text),
    entry(TypeName::Enum, Arity::Members, TypeFamily::Text),
    entry(TypeName::Set, Arity::Members, TypeFamily::Text),
];

/// All supported column types in catalog order.
pub fn list_types() -> &'static [CatalogEntry] {
    &CATALOG
}

impl TypeName {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeName::Bit => "bit",
            TypeName::Tinyint => "tinyint",
            TypeName::Smallint => "smallint",
            TypeName::Mediumint => "mediumint",
            TypeName::Int => "int",
            TypeName::Integer => "integer",
            TypeName::Bigint => "bigint",
            TypeName::Float => "float",
            TypeName::Double => "double",
            TypeName::Decimal => "decimal",
            TypeName::Numeric => "numeric",
            TypeName::Real => "real",
            TypeName::Bool => "bool",
            TypeName::Boolean => "boolean",
            TypeName::Date => "date",
            TypeName::Datetime => "datetime",
            TypeName::Timestamp => "timestamp",
            TypeName::Time => "time",
            TypeName::Year => "year",
            TypeName::Char => "char",
            TypeName::Varchar => "varchar",
            TypeName::Binary => "binary",
            TypeName::Varbinary => "varbinary",
            TypeName::Tinyblob => "tinyblob",
            TypeName::Tinytext => "tinytext",
            TypeName::Blob => "blob",
            TypeName::Text => "text",
            TypeName::Mediumblob => "mediumblob",
            TypeName::Mediumtext => "mediumtext",
            TypeName::Longblob => "longblob",
            TypeName::Longtext => "longtext",
            TypeName::Enum => "enum",
            TypeName::Set => "set",
        }
    }

    pub fn entry(self) -> &'static CatalogEntry {
        &CATALOG[self as usize]
    }

    pub fn arity(self) -> Arity {
        self.entry().arity
    }

    pub fn family(self) -> TypeFamily {
        self.entry().family
    }

    pub fn is_member_list(self) -> bool {
        matches!(self, TypeName::Enum | TypeName::Set)
    }

    pub fn is_integer_like(self) -> bool {
        self.as_str().contains("int")
    }

    pub fn is_decimal_like(self) -> bool {
        matches!(
            self,
            TypeName::Float
                | TypeName::Double
                | TypeName::Decimal
                | TypeName::Numeric
                | TypeName::Real
        )
    }

    pub fn is_boolean_like(self) -> bool {
        matches!(
            self,
            TypeName::Bool | TypeName::Boolean | TypeName::Tinyint | TypeName::Bit
        )
    }

    pub fn is_date_like(self) -> bool {
        self.as_str().contains("date") || self == TypeName::Timestamp
    }

    /// Character, text, enum and set types accept the text form of any value.
    pub fn is_text_sink(self) -> bool {
        let name = self.as_str();
        name.contains("char") || name.contains("text") || self.is_member_list()
    }

    pub fn is_blob(self) -> bool {
        self.as_str().contains("blob")
    }

    pub fn is_binary(self) -> bool {
        self.as_str().contains("binary")
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeName {
    type Err = CatalogError;

    /// Case-insensitive lookup of a bare type name (no parameters).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        CATALOG
            .iter()
            .find(|entry| entry.name.as_str().eq_ignore_ascii_case(value))
            .map(|entry| entry.name)
            .ok_or_else(|| CatalogError::UnknownType(value.to_string()))
    }
}
