//! Mapping from MySQL type names to in-memory value representations and to
//! driver parameter types.

use std::fmt;

use log::warn;
use serde::Serialize;

use crate::catalog::{CatalogError, TypeName};

/// The [`RawValue`](crate::value::RawValue) representation a column's values take in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RuntimeType {
    Text,
    Decimal,
    Int32,
    UInt32,
    UInt8,
    Int16,
    UInt16,
    Int64,
    UInt64,
    Bool,
    Float,
    Double,
    DateTime,
    SqlDateTime,
    Time,
    Bytes,
}

/// Parameter types understood by the MySQL client protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DriverType {
    String,
    VarChar,
    Date,
    DateTime,
    Decimal,
    Year,
    Time,
    Timestamp,
    Set,
    Enum,
    Bit,
    Byte,
    UByte,
    Int16,
    UInt16,
    Int24,
    UInt24,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    Text,
    TinyText,
    MediumText,
    LongText,
    Blob,
    TinyBlob,
    MediumBlob,
    LongBlob,
    Binary,
    VarBinary,
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for DriverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Names accepted by the mappings beyond the catalog itself.
enum Alias {
    Catalog(TypeName),
    FixedPoint,
    Serial,
    SingleBit,
}

fn resolve(name: &str) -> Result<Alias, CatalogError> {
    let upper = name.trim().to_ascii_uppercase();
    let alias = match upper.as_str() {
        "DEC" | "FIXED" => Alias::FixedPoint,
        "SERIAL" => Alias::Serial,
        "BIT(1)" => Alias::SingleBit,
        _ => match upper.parse::<TypeName>() {
            Ok(type_name) => Alias::Catalog(type_name),
            Err(_) => {
                warn!("No runtime mapping exists for MySQL type '{name}'");
                return Err(CatalogError::UnhandledType(name.to_string()));
            }
        },
    };
    Ok(alias)
}

/// In-memory representation for a type name, including the `dec`, `fixed`,
/// `serial` and `bit(1)` aliases.
pub fn runtime_type(
    name: &str,
    unsigned: bool,
    dates_as_sql_dates: bool,
) -> Result<RuntimeType, CatalogError> {
    Ok(match resolve(name)? {
        Alias::Catalog(type_name) => runtime_type_of(type_name, unsigned, dates_as_sql_dates),
        Alias::FixedPoint => RuntimeType::Decimal,
        Alias::Serial => RuntimeType::UInt64,
        Alias::SingleBit => RuntimeType::Bool,
    })
}

pub fn runtime_type_of(name: TypeName, unsigned: bool, dates_as_sql_dates: bool) -> RuntimeType {
    use TypeName as T;
    match name {
        T::Char
        | T::Varchar
        | T::Set
        | T::Enum
        | T::Text
        | T::Tinytext
        | T::Mediumtext
        | T::Longtext => RuntimeType::Text,
        T::Decimal | T::Numeric => RuntimeType::Decimal,
        T::Year => RuntimeType::Int32,
        T::Int | T::Integer | T::Mediumint => {
            if unsigned {
                RuntimeType::UInt32
            } else {
                RuntimeType::Int32
            }
        }
        T::Tinyint => RuntimeType::UInt8,
        T::Smallint => {
            if unsigned {
                RuntimeType::UInt16
            } else {
                RuntimeType::Int16
            }
        }
        T::Bigint => {
            if unsigned {
                RuntimeType::UInt64
            } else {
                RuntimeType::Int64
            }
        }
        T::Bool | T::Boolean => RuntimeType::Bool,
        T::Bit => RuntimeType::UInt64,
        T::Float => RuntimeType::Float,
        T::Double | T::Real => RuntimeType::Double,
        T::Date | T::Datetime | T::Timestamp => {
            if dates_as_sql_dates {
                RuntimeType::SqlDateTime
            } else {
                RuntimeType::DateTime
            }
        }
        T::Time => RuntimeType::Time,
        T::Blob | T::Tinyblob | T::Mediumblob | T::Longblob | T::Binary | T::Varbinary => {
            RuntimeType::Bytes
        }
    }
}

/// Driver parameter type for a type name, including the `dec`, `fixed` and
/// `serial` aliases.
pub fn driver_type(name: &str, unsigned: bool, real_as_float: bool) -> Result<DriverType, CatalogError> {
    Ok(match resolve(name)? {
        Alias::Catalog(type_name) => driver_type_of(type_name, unsigned, real_as_float),
        Alias::FixedPoint => DriverType::Decimal,
        Alias::Serial => DriverType::UInt64,
        Alias::SingleBit => DriverType::Bit,
    })
}

pub fn driver_type_of(name: TypeName, unsigned: bool, real_as_float: bool) -> DriverType {
    use TypeName as T;
    let pick = |unsigned_type, signed_type| if unsigned { unsigned_type } else { signed_type };
    match name {
        T::Char => DriverType::String,
        T::Varchar => DriverType::VarChar,
        T::Date => DriverType::Date,
        T::Datetime => DriverType::DateTime,
        T::Numeric | T::Decimal => DriverType::Decimal,
        T::Year => DriverType::Year,
        T::Time => DriverType::Time,
        T::Timestamp => DriverType::Timestamp,
        T::Set => DriverType::Set,
        T::Enum => DriverType::Enum,
        T::Bit => DriverType::Bit,
        T::Tinyint => pick(DriverType::UByte, DriverType::Byte),
        T::Bool | T::Boolean => DriverType::Byte,
        T::Smallint => pick(DriverType::UInt16, DriverType::Int16),
        T::Mediumint => pick(DriverType::UInt24, DriverType::Int24),
        T::Int | T::Integer => pick(DriverType::UInt32, DriverType::Int32),
        T::Bigint => pick(DriverType::UInt64, DriverType::Int64),
        T::Float => DriverType::Float,
        T::Double => DriverType::Double,
        T::Real => {
            if real_as_float {
                DriverType::Float
            } else {
                DriverType::Double
            }
        }
        T::Text => DriverType::Text,
        T::Blob => DriverType::Blob,
        T::Longblob => DriverType::LongBlob,
        T::Longtext => DriverType::LongText,
        T::Mediumblob => DriverType::MediumBlob,
        T::Mediumtext => DriverType::MediumText,
        T::Tinyblob => DriverType::TinyBlob,
        T::Tinytext => DriverType::TinyText,
        T::Binary => DriverType::Binary,
        T::Varbinary => DriverType::VarBinary,
    }
}
