use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Options controlling how a sheet is turned into an export plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ExportSettings {
    /// Infer column types from the data; otherwise every column is text.
    pub detect_datatype: bool,
    pub first_row_headers: bool,
    pub add_primary_key: bool,
    /// Defaults to `<table>_id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key_name: Option<String>,
    pub auto_index_int_columns: bool,
    pub auto_allow_empty_non_index_columns: bool,
    /// Keep cell text as displayed instead of unboxing typed values.
    pub use_formatted_values: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            detect_datatype: true,
            first_row_headers: true,
            add_primary_key: true,
            primary_key_name: None,
            auto_index_int_columns: false,
            auto_allow_empty_non_index_columns: false,
            use_formatted_values: true,
        }
    }
}

impl ExportSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening settings file {path:?}"))?;
        let settings = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing settings YAML {path:?}"))?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Creating settings file {path:?}"))?;
        serde_yaml::to_writer(BufWriter::new(file), self).context("Writing settings YAML")
    }

    pub fn primary_key_name_for(&self, table_name: &str) -> String {
        self.primary_key_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("{table_name}_id"))
    }
}
