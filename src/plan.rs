//! Export plans: the table a sheet becomes, with one declared column per
//! sheet column plus an optional surrogate primary key.

use std::{
    fmt,
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use heck::ToSnakeCase;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    catalog::TypeName,
    coerce::{ColumnTarget, StorageLiteral, format_for_storage},
    compare::can_store,
    compat::fits,
    declaration::ColumnTypeSpec,
    reconcile::{ColumnObservations, text_declaration},
    settings::ExportSettings,
    sheet::grid_width,
    value::RawValue,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPlan {
    pub name: String,
    /// `None` when the column held no values to infer from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<ColumnTypeSpec>,
    /// Sheet column feeding this table column; `None` for a generated key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_index: Option<usize>,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub allow_null: bool,
    #[serde(default)]
    pub create_index: bool,
    #[serde(default)]
    pub unsigned: bool,
}

impl ColumnPlan {
    fn from_source(name: String, datatype: Option<ColumnTypeSpec>, source_index: usize) -> Self {
        Self {
            name,
            datatype,
            source_index: Some(source_index),
            primary_key: false,
            auto_increment: false,
            allow_null: false,
            create_index: false,
            unsigned: false,
        }
    }

    fn surrogate_key(name: String) -> Self {
        Self {
            name,
            datatype: Some(ColumnTypeSpec::bare(TypeName::Integer)),
            source_index: None,
            primary_key: true,
            auto_increment: true,
            allow_null: false,
            create_index: false,
            unsigned: false,
        }
    }

    /// Declared type, with an unsized `varchar` standing in for an empty column.
    pub fn effective_type(&self) -> ColumnTypeSpec {
        self.datatype
            .clone()
            .unwrap_or_else(|| ColumnTypeSpec::bare(TypeName::Varchar))
    }

    pub fn target(&self) -> ColumnTarget {
        ColumnTarget::for_spec(&self.effective_type(), self.allow_null, self.unsigned, true)
    }

    fn is_integer_like(&self) -> bool {
        self.datatype
            .as_ref()
            .is_some_and(|spec| spec.name().is_integer_like())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanWarning {
    TableNameNotClean { name: String, suggestion: String },
    DuplicateColumnName { name: String, renamed: String },
    PrimaryKeyNameTaken(String),
}

impl fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanWarning::TableNameNotClean { name, suggestion } => write!(
                f,
                "table name '{name}' contains spaces or upper case characters; using '{suggestion}'"
            ),
            PlanWarning::DuplicateColumnName { name, renamed } => {
                write!(f, "column name '{name}' is repeated; renamed to '{renamed}'")
            }
            PlanWarning::PrimaryKeyNameTaken(name) => write!(
                f,
                "primary key column '{name}' has the same name as a sheet column"
            ),
        }
    }
}

/// A cell whose text the planned column type cannot hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellIssue {
    pub row: usize,
    pub column: String,
    pub value: String,
    pub declaration: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPlan {
    pub table_name: String,
    #[serde(default = "default_true")]
    pub first_row_headers: bool,
    pub columns: Vec<ColumnPlan>,
    #[serde(skip)]
    pub warnings: Vec<PlanWarning>,
}

fn default_true() -> bool {
    true
}

/// The sheet name as a table name, unless it is a generic `Sheet…` name.
pub fn default_table_name(sheet_name: &str) -> Option<String> {
    let trimmed = sheet_name.trim();
    if trimmed.is_empty() || trimmed.to_lowercase().starts_with("sheet") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn clean_identifier(name: &str) -> String {
    name.trim().to_snake_case()
}

impl ExportPlan {
    pub fn build(table_name: &str, grid: &[Vec<RawValue>], settings: &ExportSettings) -> Self {
        let mut warnings = Vec::new();
        let clean_table = clean_identifier(table_name);
        if table_name.contains(' ') || table_name.chars().any(char::is_uppercase) {
            warnings.push(PlanWarning::TableNameNotClean {
                name: table_name.to_string(),
                suggestion: clean_table.clone(),
            });
        }

        let mut columns = (0..grid_width(grid))
            .map(|index| plan_column(grid, index, settings))
            .collect::<Vec<_>>();
        dedupe_names(&mut columns, &mut warnings);

        if settings.add_primary_key {
            let first_is_integer = settings.detect_datatype
                && columns.first().is_some_and(ColumnPlan::is_integer_like);
            if first_is_integer {
                if let Some(first) = columns.first_mut() {
                    debug!("Using first column '{}' as primary key", first.name);
                    first.primary_key = true;
                }
            } else {
                let key_name = settings.primary_key_name_for(&clean_table);
                if columns
                    .iter()
                    .any(|column| column.name.eq_ignore_ascii_case(&key_name))
                {
                    warnings.push(PlanWarning::PrimaryKeyNameTaken(key_name.clone()));
                }
                columns.insert(0, ColumnPlan::surrogate_key(key_name));
            }
        }

        for column in columns.iter_mut().filter(|column| !column.primary_key) {
            column.create_index = settings.auto_index_int_columns && column.is_integer_like();
            column.allow_null = settings.auto_allow_empty_non_index_columns && !column.create_index;
        }

        for warning in &warnings {
            warn!("{warning}");
        }
        Self {
            table_name: clean_table,
            first_row_headers: settings.first_row_headers,
            columns,
            warnings,
        }
    }

    /// Rows holding data, i.e. the grid without its header row.
    pub fn data_rows<'a>(&self, grid: &'a [Vec<RawValue>]) -> &'a [Vec<RawValue>] {
        if self.first_row_headers {
            grid.get(1..).unwrap_or_default()
        } else {
            grid
        }
    }

    /// Names of the columns fed from the sheet, in render order.
    pub fn rendered_column_names(&self) -> Vec<&str> {
        self.sourced_columns()
            .map(|(column, _)| column.name.as_str())
            .collect()
    }

    /// Storage literals for one data row; generated key columns are skipped.
    pub fn render_row(&self, row: &[RawValue]) -> Vec<StorageLiteral> {
        self.sourced_columns()
            .map(|(column, index)| {
                let value = row.get(index).unwrap_or(&RawValue::Null);
                format_for_storage(value, &column.target(), true)
            })
            .collect()
    }

    /// Cells the declared column types cannot store.
    pub fn unstorable_cells(&self, grid: &[Vec<RawValue>]) -> Vec<CellIssue> {
        let first_data_row = if self.first_row_headers { 2 } else { 1 };
        let mut issues = Vec::new();
        for (offset, row) in self.data_rows(grid).iter().enumerate() {
            for (column, index) in self.sourced_columns() {
                let Some(declaration) = column.datatype.as_ref() else {
                    continue;
                };
                let Some(value) = row.get(index).filter(|value| !value.is_null()) else {
                    continue;
                };
                let text = value.as_display();
                let declaration = declaration.to_string();
                if !can_store(&text, &declaration) {
                    issues.push(CellIssue {
                        row: offset + first_data_row,
                        column: column.name.clone(),
                        value: text,
                        declaration,
                    });
                }
            }
        }
        issues
    }

    /// Replaces a column's inferred type with an explicit declaration.
    pub fn override_type(&mut self, column_name: &str, declaration: &str) -> Result<()> {
        let spec = ColumnTypeSpec::parse(declaration)
            .with_context(|| format!("Invalid type '{declaration}' for column '{column_name}'"))?;
        let column = self
            .columns
            .iter_mut()
            .find(|column| column.name.eq_ignore_ascii_case(column_name))
            .ok_or_else(|| anyhow!("Column '{column_name}' not found in plan"))?;
        if let Some(inferred) = &column.datatype
            && !fits(&inferred.to_string(), declaration)
        {
            warn!(
                "Column '{}' was inferred as {inferred}; values may not fit {spec}",
                column.name
            );
        }
        column.datatype = Some(spec);
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening plan file {path:?}"))?;
        let reader = BufReader::new(file);
        if is_json(path) {
            serde_json::from_reader(reader).with_context(|| format!("Parsing plan JSON {path:?}"))
        } else {
            serde_yaml::from_reader(reader).with_context(|| format!("Parsing plan YAML {path:?}"))
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating plan file {path:?}"))?;
        let writer = BufWriter::new(file);
        if is_json(path) {
            serde_json::to_writer_pretty(writer, self).context("Writing plan JSON")
        } else {
            serde_yaml::to_writer(writer, self).context("Writing plan YAML")
        }
    }

    fn sourced_columns(&self) -> impl Iterator<Item = (&ColumnPlan, usize)> {
        self.columns
            .iter()
            .filter_map(|column| column.source_index.map(|index| (column, index)))
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn plan_column(grid: &[Vec<RawValue>], index: usize, settings: &ExportSettings) -> ColumnPlan {
    let header = grid
        .first()
        .and_then(|row| row.get(index))
        .unwrap_or(&RawValue::Null);
    let mut header_observations = ColumnObservations::new();
    header_observations.observe(header);
    let mut data_observations = ColumnObservations::new();
    let mut all_observations = header_observations.clone();
    for value in grid.iter().skip(1).filter_map(|row| row.get(index)) {
        data_observations.observe(value);
        all_observations.observe(value);
    }
    let widest_text = all_observations.bounds().text_length;

    let datatype = if !settings.detect_datatype {
        if settings.first_row_headers {
            (!data_observations.is_empty())
                .then(|| text_declaration(data_observations.bounds().text_length))
        } else {
            (!data_observations.is_empty() || !header_observations.is_empty())
                .then(|| text_declaration(widest_text))
        }
    } else if settings.first_row_headers {
        data_observations.decide()
    } else {
        match (header_observations.decide(), data_observations.decide()) {
            (header_guess, None) => header_guess,
            (None, data_guess) => data_guess,
            // Same type family: size it over every row, the first one included.
            (Some(header_guess), Some(data_guess))
                if header_guess.name() == data_guess.name() =>
            {
                all_observations.decide()
            }
            (Some(header_guess), Some(data_guess)) => {
                debug!(
                    "Column {} first row looks like {header_guess} but data looks like {data_guess}",
                    index + 1
                );
                Some(text_declaration(widest_text))
            }
        }
    };

    let header_text = header.as_display();
    let name = if settings.first_row_headers && !header_text.trim().is_empty() {
        header_text.trim().to_string()
    } else {
        format!("Column{}", index + 1)
    };
    ColumnPlan::from_source(name, datatype, index)
}

fn dedupe_names(columns: &mut [ColumnPlan], warnings: &mut Vec<PlanWarning>) {
    let mut seen: Vec<String> = Vec::with_capacity(columns.len());
    for column in columns.iter_mut() {
        let original = column.name.clone();
        let mut candidate = original.clone();
        let mut suffix = 2;
        while seen.iter().any(|name| name.eq_ignore_ascii_case(&candidate)) {
            candidate = format!("{original}_{suffix}");
            suffix += 1;
        }
        if candidate != original {
            warnings.push(PlanWarning::DuplicateColumnName {
                name: original,
                renamed: candidate.clone(),
            });
            column.name = candidate.clone();
        }
        seen.push(candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> RawValue {
        if value.is_empty() {
            RawValue::Null
        } else {
            RawValue::Text(value.to_string())
        }
    }

    fn grid(rows: &[&[&str]]) -> Vec<Vec<RawValue>> {
        rows.iter()
            .map(|row| row.iter().map(|cell| text(cell)).collect())
            .collect()
    }

    #[test]
    fn generic_sheet_names_are_not_table_names() {
        assert_eq!(default_table_name("Sheet1"), None);
        assert_eq!(default_table_name("  "), None);
        assert_eq!(default_table_name("Orders"), Some("Orders".to_string()));
    }

    #[test]
    fn table_names_are_cleaned_with_a_warning() {
        let plan = ExportPlan::build("Order Items", &[], &ExportSettings::default());
        assert_eq!(plan.table_name, "order_items");
        assert!(matches!(
            plan.warnings.first(),
            Some(PlanWarning::TableNameNotClean { .. })
        ));
        assert_eq!(plan.columns.len(), 1);
        assert_eq!(plan.columns[0].name, "order_items_id");
    }

    #[test]
    fn repeated_headers_are_renamed() {
        let settings = ExportSettings {
            add_primary_key: false,
            ..ExportSettings::default()
        };
        let plan = ExportPlan::build("t", &grid(&[&["a", "A"], &["x", "y"]]), &settings);
        assert_eq!(plan.columns[1].name, "A_2");
        assert_eq!(plan.warnings.len(), 1);
    }

    #[test]
    fn data_rows_skip_the_header() {
        let rows = grid(&[&["h"], &["v"]]);
        let plan = ExportPlan::build("t", &rows, &ExportSettings::default());
        assert_eq!(plan.data_rows(&rows).len(), 1);
        assert_eq!(plan.data_rows(&rows[..1]).len(), 0);
    }
}
