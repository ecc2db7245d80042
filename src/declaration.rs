//! Parsing and validation of column type declarations such as `varchar(255)`,
//! `decimal(12,2)` or `enum('a','b')`.

use std::{fmt, str::FromStr};

use log::debug;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::catalog::{Arity, TypeName};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    #[error("type declaration is empty")]
    Empty,
    #[error("misplaced parenthesis in '{0}'")]
    MisplacedParenthesis(String),
    #[error("unknown type name '{0}'")]
    UnknownType(String),
    #[error("type '{name}' does not take parameters")]
    UnexpectedParameters { name: TypeName },
    #[error("type '{name}' requires a member list")]
    MissingMembers { name: TypeName },
    #[error("type '{name}' has empty parentheses")]
    EmptyParameters { name: TypeName },
    #[error("type '{name}' expects {expected} parameter(s) but {found} were given")]
    ParameterCount {
        name: TypeName,
        expected: usize,
        found: usize,
    },
    #[error("parameter '{value}' of type '{name}' is not an integer")]
    InvalidParameter { name: TypeName, value: String },
    #[error("parameter {value} of type '{name}' must not be negative")]
    NegativeParameter { name: TypeName, value: i32 },
    #[error("year width must be 2 or 4, got {0}")]
    YearWidth(i32),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeParams {
    None,
    Length(u32),
    PrecisionScale(u32, u32),
    Members(Vec<String>),
}

/// A validated column type: catalog name plus its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnTypeSpec {
    name: TypeName,
    params: TypeParams,
}

impl ColumnTypeSpec {
    pub fn bare(name: TypeName) -> Self {
        Self {
            name,
            params: TypeParams::None,
        }
    }

    pub fn varchar(length: usize) -> Self {
        Self {
            name: TypeName::Varchar,
            params: TypeParams::Length(u32::try_from(length).unwrap_or(u32::MAX)),
        }
    }

    pub fn decimal(precision: u32, scale: u32) -> Self {
        Self {
            name: TypeName::Decimal,
            params: TypeParams::PrecisionScale(precision, scale),
        }
    }

    pub fn name(&self) -> TypeName {
        self.name
    }

    pub fn params(&self) -> &TypeParams {
        &self.params
    }

    pub fn length(&self) -> Option<u32> {
        match self.params {
            TypeParams::Length(len) => Some(len),
            _ => None,
        }
    }

    pub fn precision_scale(&self) -> Option<(u32, u32)> {
        match self.params {
            TypeParams::PrecisionScale(p, s) => Some((p, s)),
            _ => None,
        }
    }

    pub fn members(&self) -> Option<&[String]> {
        match &self.params {
            TypeParams::Members(members) => Some(members),
            _ => None,
        }
    }

    /// Parses a declaration into typed parameters. Besides the syntax checks of
    /// [`validate`], widths and precisions must be non-negative here.
    pub fn parse(declaration: &str) -> Result<Self, DeclarationError> {
        let (name, parsed) = parse_syntax(declaration)?;
        let unsigned = |value: i32| {
            u32::try_from(value).map_err(|_| DeclarationError::NegativeParameter { name, value })
        };
        let params = match parsed {
            ParsedParams::None => TypeParams::None,
            ParsedParams::Members(members) => TypeParams::Members(members),
            ParsedParams::Numbers(numbers) => match numbers.as_slice() {
                [length] => TypeParams::Length(unsigned(*length)?),
                [precision, scale] => {
                    TypeParams::PrecisionScale(unsigned(*precision)?, unsigned(*scale)?)
                }
                _ => {
                    return Err(DeclarationError::ParameterCount {
                        name,
                        expected: name.arity().count().unwrap_or_default(),
                        found: numbers.len(),
                    });
                }
            },
        };
        Ok(Self { name, params })
    }
}

/// Parameters as written, before sign checks.
enum ParsedParams {
    None,
    Numbers(Vec<i32>),
    Members(Vec<String>),
}

fn parse_syntax(declaration: &str) -> Result<(TypeName, ParsedParams), DeclarationError> {
    if declaration.is_empty() {
        return Err(DeclarationError::Empty);
    }
    let (name_text, params_text) = split_declaration(declaration)?;
    let name = name_text
        .parse::<TypeName>()
        .map_err(|_| DeclarationError::UnknownType(name_text.to_string()))?;
    let arity = name.arity();

    let Some(params_text) = params_text else {
        if arity == Arity::Members {
            return Err(DeclarationError::MissingMembers { name });
        }
        return Ok((name, ParsedParams::None));
    };
    if arity == Arity::None {
        return Err(DeclarationError::UnexpectedParameters { name });
    }
    if params_text.is_empty() {
        return Err(DeclarationError::EmptyParameters { name });
    }

    let parts = params_text.split(',').map(str::trim).collect::<Vec<_>>();
    if arity == Arity::Members {
        let members = parts
            .iter()
            .map(|part| part.trim_matches(['\'', '"']).to_string())
            .collect();
        return Ok((name, ParsedParams::Members(members)));
    }

    let expected = arity.count().unwrap_or_default();
    if parts.len() != expected {
        return Err(DeclarationError::ParameterCount {
            name,
            expected,
            found: parts.len(),
        });
    }
    let numbers = parts
        .iter()
        .map(|part| {
            part.parse::<i32>()
                .map_err(|_| DeclarationError::InvalidParameter {
                    name,
                    value: part.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if name == TypeName::Year
        && let [width] = numbers.as_slice()
        && !matches!(width, 2 | 4)
    {
        return Err(DeclarationError::YearWidth(*width));
    }
    Ok((name, ParsedParams::Numbers(numbers)))
}

/// Splits `name(params)` into its name and the trimmed text inside the parentheses.
fn split_declaration(declaration: &str) -> Result<(&str, Option<&str>), DeclarationError> {
    let misplaced = || DeclarationError::MisplacedParenthesis(declaration.to_string());
    match (declaration.find('('), declaration.find(')')) {
        (None, None) => Ok((declaration, None)),
        (Some(open), Some(close)) if open < close => {
            if close + 1 != declaration.len() {
                return Err(misplaced());
            }
            Ok((
                &declaration[..open],
                Some(declaration[open + 1..close].trim()),
            ))
        }
        _ => Err(misplaced()),
    }
}

/// Whether a user-entered declaration is acceptable. The empty string means
/// "unspecified" and is accepted.
pub fn validate(declaration: &str) -> bool {
    if declaration.is_empty() {
        return true;
    }
    match parse_syntax(declaration) {
        Ok(_) => true,
        Err(err) => {
            debug!("Rejected declaration '{declaration}': {err}");
            false
        }
    }
}

impl fmt::Display for ColumnTypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_str())?;
        match &self.params {
            TypeParams::None => Ok(()),
            TypeParams::Length(len) => write!(f, "({len})"),
            TypeParams::PrecisionScale(p, s) => write!(f, "({p},{s})"),
            TypeParams::Members(members) => {
                let quoted = members
                    .iter()
                    .map(|member| format!("'{member}'"))
                    .collect::<Vec<_>>();
                write!(f, "({})", quoted.join(","))
            }
        }
    }
}

impl FromStr for ColumnTypeSpec {
    type Err = DeclarationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ColumnTypeSpec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ColumnTypeSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(value.trim()).map_err(serde::de::Error::custom)
    }
}
