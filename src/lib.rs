pub mod catalog;
pub mod classify;
pub mod cli;
pub mod coerce;
pub mod compare;
pub mod compat;
pub mod declaration;
pub mod io_utils;
pub mod mapping;
pub mod plan;
pub mod reconcile;
pub mod report;
pub mod settings;
pub mod sheet;
pub mod value;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::{CheckTypeArgs, Cli, Commands, FitsArgs, InferArgs, RenderArgs, TypesArgs},
    declaration::{ColumnTypeSpec, validate},
    plan::{ExportPlan, default_table_name},
    settings::ExportSettings,
    sheet::CellMode,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sheet_import", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Infer(args) => handle_infer(&args),
        Commands::Render(args) => handle_render(&args),
        Commands::CheckType(args) => handle_check_type(&args),
        Commands::Fits(args) => handle_fits(&args),
        Commands::Types(args) => handle_types(&args),
    }
}

fn handle_infer(args: &InferArgs) -> Result<()> {
    let mut settings = match &args.settings {
        Some(path) => ExportSettings::load(path)
            .with_context(|| format!("Loading export settings from {path:?}"))?,
        None => ExportSettings::default(),
    };
    if args.no_header {
        settings.first_row_headers = false;
    }
    if args.no_primary_key {
        settings.add_primary_key = false;
    }
    if args.no_detect {
        settings.detect_datatype = false;
    }
    if args.unformatted {
        settings.use_formatted_values = false;
    }

    let table_name = match &args.table {
        Some(name) => name.clone(),
        None => sheet_name(&args.input)
            .and_then(default_table_name)
            .ok_or_else(|| {
                anyhow!(
                    "Cannot derive a table name from {:?}; pass --table",
                    args.input
                )
            })?,
    };
    let delimiter = io_utils::resolve_delimiter(Some(&args.input), args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Inferring column types for '{}' with delimiter '{}'",
        args.input.display(),
        printable_delimiter(delimiter)
    );

    let limit = (args.sample_rows > 0).then_some(args.sample_rows);
    let grid = sheet::read_grid(
        &args.input,
        delimiter,
        encoding,
        CellMode::from_formatted_flag(settings.use_formatted_values),
        limit,
    )
    .with_context(|| format!("Reading sheet {:?}", args.input))?;

    let mut plan = ExportPlan::build(&table_name, &grid, &settings);
    for (column, declaration) in &args.type_overrides {
        plan.override_type(column, declaration)?;
    }
    for issue in plan.unstorable_cells(&grid) {
        warn!(
            "Row {} column '{}': '{}' cannot be stored as {}",
            issue.row, issue.column, issue.value, issue.declaration
        );
    }

    print!("{}", report::plan_table(&plan));
    if let Some(output) = &args.output {
        plan.save(output)
            .with_context(|| format!("Writing plan to {output:?}"))?;
        info!(
            "Plan for table '{}' with {} column(s) written to {:?}",
            plan.table_name,
            plan.columns.len(),
            output
        );
    }
    Ok(())
}

fn handle_render(args: &RenderArgs) -> Result<()> {
    let plan = ExportPlan::load(&args.plan)
        .with_context(|| format!("Loading plan from {:?}", args.plan))?;
    for column in &plan.columns {
        let name = column.effective_type().name();
        let runtime = mapping::runtime_type(name.as_str(), column.unsigned, true)?;
        let driver = mapping::driver_type(name.as_str(), column.unsigned, false)?;
        debug!(
            "Column '{}' holds {runtime} values bound as {driver}",
            column.name
        );
    }

    let delimiter = io_utils::resolve_delimiter(Some(&args.input), args.delimiter);
    let input_encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let output_encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;
    let grid = sheet::read_grid(
        &args.input,
        delimiter,
        input_encoding,
        CellMode::from_formatted_flag(!args.unformatted),
        None,
    )
    .with_context(|| format!("Reading sheet {:?}", args.input))?;

    let issues = plan.unstorable_cells(&grid);
    for issue in &issues {
        warn!(
            "Row {} column '{}': '{}' cannot be stored as {}",
            issue.row, issue.column, issue.value, issue.declaration
        );
    }

    let data_rows = plan.data_rows(&grid);
    let header = plan
        .rendered_column_names()
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let rows = std::iter::once(header).chain(data_rows.iter().map(|row| {
        plan.render_row(row)
            .into_iter()
            .map(|literal| literal.text)
            .collect::<Vec<_>>()
    }));
    let output_delimiter = io_utils::resolve_delimiter(args.output.as_deref(), args.delimiter);
    io_utils::write_records(args.output.as_deref(), output_delimiter, output_encoding, rows)
        .context("Writing rendered rows")?;
    info!(
        "Rendered {} row(s) for table '{}' ({} value(s) flagged)",
        data_rows.len(),
        plan.table_name,
        issues.len()
    );
    Ok(())
}

fn handle_check_type(args: &CheckTypeArgs) -> Result<()> {
    let mut failures = 0usize;
    for declaration in &args.declarations {
        if declaration.is_empty() {
            println!("valid    (empty): unspecified");
        } else if validate(declaration) {
            let normalized = ColumnTypeSpec::parse(declaration)
                .map(|spec| spec.to_string())
                .unwrap_or_else(|_| declaration.clone());
            println!("valid    {declaration}: {normalized}");
        } else {
            let reason = ColumnTypeSpec::parse(declaration)
                .err()
                .map(|err| err.to_string())
                .unwrap_or_default();
            println!("invalid  {declaration}: {reason}");
            failures += 1;
        }
    }
    if failures > 0 {
        bail!("{failures} declaration(s) failed validation");
    }
    Ok(())
}

fn handle_fits(args: &FitsArgs) -> Result<()> {
    println!("{}", compat::fits(&args.source, &args.target));
    Ok(())
}

fn handle_types(args: &TypesArgs) -> Result<()> {
    if args.presets {
        print!("{}", report::presets_table());
    } else {
        print!("{}", report::catalog_table());
    }
    Ok(())
}

fn sheet_name(path: &Path) -> Option<&str> {
    if io_utils::is_dash(path) {
        return None;
    }
    path.file_stem().and_then(|stem| stem.to_str())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
