use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Infer MySQL column types for spreadsheet data and render import-ready values",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Infer a table plan (column names, types, keys) from a sheet exported as CSV
    Infer(InferArgs),
    /// Render sheet rows as storage literals using a saved plan
    Render(RenderArgs),
    /// Validate one or more column type declarations
    CheckType(CheckTypeArgs),
    /// Report whether data of one column type fits into another
    Fits(FitsArgs),
    /// List the supported MySQL column types
    Types(TypesArgs),
}

#[derive(Debug, Args)]
pub struct InferArgs {
    /// Input sheet (CSV/TSV, or '-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Destination plan file (.yml/.yaml or .json)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Table name (defaults to the input file name unless it starts with "sheet")
    #[arg(long)]
    pub table: Option<String>,
    /// YAML file with export settings
    #[arg(long)]
    pub settings: Option<PathBuf>,
    /// Treat the first row as data rather than column names
    #[arg(long = "no-header")]
    pub no_header: bool,
    /// Do not add or select a primary key column
    #[arg(long = "no-primary-key")]
    pub no_primary_key: bool,
    /// Treat every column as text instead of detecting types
    #[arg(long = "no-detect")]
    pub no_detect: bool,
    /// Unbox cells into typed values (numbers, booleans, dates) instead of keeping their text
    #[arg(long)]
    pub unformatted: bool,
    /// Explicit column types such as `price=decimal(12,2)` (repeatable)
    #[arg(long = "type", value_parser = parse_type_override, action = clap::ArgAction::Append)]
    pub type_overrides: Vec<(String, String)>,
    /// Number of rows to read, header included (0 means the whole sheet)
    #[arg(long, default_value_t = 0)]
    pub sample_rows: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Input sheet (CSV/TSV, or '-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Plan file produced by `infer`
    #[arg(short = 'p', long = "plan")]
    pub plan: PathBuf,
    /// Output file (stdout when omitted or '-')
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Unbox cells into typed values instead of keeping their text
    #[arg(long)]
    pub unformatted: bool,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Character encoding for the output (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct CheckTypeArgs {
    /// Declarations such as `varchar(255)` or `enum('a','b')`
    #[arg(required = true)]
    pub declarations: Vec<String>,
}

#[derive(Debug, Args)]
pub struct FitsArgs {
    /// Type of the data being stored
    pub source: String,
    /// Type of the destination column
    pub target: String,
}

#[derive(Debug, Args)]
pub struct TypesArgs {
    /// Show the preset declarations offered when picking a type by hand
    #[arg(long)]
    pub presets: bool,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "pipe" | "|" => Ok(b'|'),
        "semicolon" | ";" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (None, _) => Err("Delimiter cannot be empty".to_string()),
                (Some(_), Some(_)) => Err("Delimiter must be a single character".to_string()),
                (Some(ch), None) if !ch.is_ascii() => Err("Delimiter must be ASCII".to_string()),
                (Some(ch), None) => Ok(ch as u8),
            }
        }
    }
}

pub fn parse_type_override(value: &str) -> Result<(String, String), String> {
    let (column, declaration) = value
        .split_once('=')
        .ok_or_else(|| format!("Expected COLUMN=TYPE, got '{value}'"))?;
    let column = column.trim();
    let declaration = declaration.trim();
    if column.is_empty() || declaration.is_empty() {
        return Err(format!("Expected COLUMN=TYPE, got '{value}'"));
    }
    Ok((column.to_string(), declaration.to_string()))
}
