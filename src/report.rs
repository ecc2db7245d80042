//! Plain-text tables for terminal output.

use std::fmt::Write as _;

use itertools::Itertools;

use crate::{
    catalog::{PRESET_DECLARATIONS, list_types},
    plan::ExportPlan,
};

pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|header| header.chars().count())
        .collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let header_cells = headers.iter().map(|h| h.to_string()).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&header_cells, &widths));
    let rule = widths.iter().map(|w| "-".repeat((*w).max(3))).join("  ");
    let _ = writeln!(output, "{rule}");
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let cell = cell.replace(['\n', '\r', '\t'], " ");
            let padding = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(padding))
        })
        .join("  ");
    line.trim_end().to_string()
}

fn flag(value: bool) -> String {
    if value { "yes".into() } else { String::new() }
}

pub fn plan_table(plan: &ExportPlan) -> String {
    let rows = plan
        .columns
        .iter()
        .map(|column| {
            vec![
                column
                    .source_index
                    .map(|index| (index + 1).to_string())
                    .unwrap_or_else(|| "-".into()),
                column.name.clone(),
                column
                    .datatype
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                flag(column.primary_key),
                flag(column.auto_increment),
                flag(column.allow_null),
                flag(column.create_index),
            ]
        })
        .collect::<Vec<_>>();
    render_table(
        &["#", "column", "type", "pk", "auto_inc", "nullable", "index"],
        &rows,
    )
}

pub fn catalog_table() -> String {
    let rows = list_types()
        .iter()
        .map(|entry| {
            let arity = match entry.arity.count() {
                Some(count) => count.to_string(),
                None => "members".into(),
            };
            vec![
                entry.name.to_string(),
                arity,
                format!("{:?}", entry.family).to_lowercase(),
            ]
        })
        .collect::<Vec<_>>();
    render_table(&["type", "parameters", "family"], &rows)
}

pub fn presets_table() -> String {
    let rows = PRESET_DECLARATIONS
        .iter()
        .map(|(declaration, description)| vec![declaration.to_string(), description.to_string()])
        .collect::<Vec<_>>();
    render_table(&["declaration", "description"], &rows)
}
