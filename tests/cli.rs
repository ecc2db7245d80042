mod common;

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use common::{TestWorkspace, fixture_path};
use predicates::str::contains;
use sheet_import::plan::ExportPlan;

fn fixture(name: &str) -> String {
    fixture_path(name).to_str().unwrap().to_string()
}

#[test]
fn infer_prints_and_saves_a_plan() {
    let workspace = TestWorkspace::new();
    let plan_path = workspace.path().join("orders-plan.yml");
    cargo_bin_cmd!("sheet-import")
        .args([
            "infer",
            "-i",
            &fixture("orders.csv"),
            "-o",
            plan_path.to_str().unwrap(),
            "--unformatted",
        ])
        .assert()
        .success()
        .stdout(contains("decimal(12,2)"))
        .stdout(contains("ordered_at"));

    let plan = ExportPlan::load(&plan_path).expect("load plan");
    assert_eq!(plan.table_name, "orders");
    assert_eq!(plan.columns.len(), 6);
    assert!(plan.columns[0].primary_key);
    assert_eq!(
        plan.columns[4].datatype.as_ref().map(ToString::to_string),
        Some("datetime".to_string())
    );
}

#[test]
fn infer_applies_type_overrides_and_settings_file() {
    let workspace = TestWorkspace::new();
    let settings = workspace.write(
        "settings.yml",
        "add_primary_key: false\nauto_allow_empty_non_index_columns: true\n",
    );
    let plan_path = workspace.path().join("plan.json");
    cargo_bin_cmd!("sheet-import")
        .args([
            "infer",
            "-i",
            &fixture("Sheet1.csv"),
            "--table",
            "Product Items",
            "--settings",
            settings.to_str().unwrap(),
            "--unformatted",
            "--type",
            "label=text",
            "-o",
            plan_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    let plan = ExportPlan::load(&plan_path).expect("load plan");
    assert_eq!(plan.table_name, "product_items");
    let declared = plan
        .columns
        .iter()
        .map(|column| column.effective_type().to_string())
        .collect::<Vec<_>>();
    assert_eq!(declared, vec!["varchar(5)", "text", "decimal(12,2)"]);
    assert!(plan.columns.iter().all(|column| column.allow_null));
}

#[test]
fn infer_requires_a_table_name_for_generic_sheets() {
    cargo_bin_cmd!("sheet-import")
        .args(["infer", "-i", &fixture("Sheet1.csv")])
        .assert()
        .failure()
        .stderr(contains("pass --table"));
}

#[test]
fn infer_rejects_overrides_for_unknown_columns() {
    cargo_bin_cmd!("sheet-import")
        .args([
            "infer",
            "-i",
            &fixture("orders.csv"),
            "--type",
            "missing=int",
        ])
        .assert()
        .failure()
        .stderr(contains("Column 'missing' not found"));
}

#[test]
fn render_writes_storage_literals() {
    let workspace = TestWorkspace::new();
    let plan_path = workspace.path().join("plan.yaml");
    cargo_bin_cmd!("sheet-import")
        .args([
            "infer",
            "-i",
            &fixture("orders.csv"),
            "--unformatted",
            "-o",
            plan_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    cargo_bin_cmd!("sheet-import")
        .args([
            "render",
            "-i",
            &fixture("orders.csv"),
            "-p",
            plan_path.to_str().unwrap(),
            "--unformatted",
        ])
        .assert()
        .success()
        .stdout(contains("order_no,customer,amount,paid,ordered_at,note"))
        .stdout(contains("Bob O\\'Neil"))
        .stdout(contains("0000-00-00 00:00:00"))
        .stdout(contains("multi\\nline"));
}

#[test]
fn render_uses_null_literals_for_nullable_columns() {
    let workspace = TestWorkspace::new();
    let plan_path = workspace.write(
        "plan.yml",
        "table_name: orders\ncolumns:\n  - name: note\n    datatype: varchar(25)\n    source_index: 5\n    allow_null: true\n",
    );
    let output = workspace.path().join("rendered.tsv");
    cargo_bin_cmd!("sheet-import")
        .args([
            "render",
            "-i",
            &fixture("orders.csv"),
            "-p",
            plan_path.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let contents = fs::read_to_string(&output).expect("read rendered output");
    let lines = contents.lines().collect::<Vec<_>>();
    assert_eq!(lines[0], "note");
    assert_eq!(lines[1], "first order");
    assert_eq!(lines[2], "null");
}

#[test]
fn check_type_reports_each_declaration() {
    cargo_bin_cmd!("sheet-import")
        .args(["check-type", "varchar(255)", "enum('a','b')"])
        .assert()
        .success()
        .stdout(contains("valid    varchar(255): varchar(255)"));

    cargo_bin_cmd!("sheet-import")
        .args(["check-type", "varchar(255)", "year(3)", "nonsense"])
        .assert()
        .failure()
        .stdout(contains("invalid  year(3)"))
        .stderr(contains("2 declaration(s) failed validation"));
}

#[test]
fn fits_prints_compatibility() {
    cargo_bin_cmd!("sheet-import")
        .args(["fits", "int", "decimal(12,2)"])
        .assert()
        .success()
        .stdout("true\n");
    cargo_bin_cmd!("sheet-import")
        .args(["fits", "date", "int"])
        .assert()
        .success()
        .stdout("false\n");
}

#[test]
fn types_lists_catalog_and_presets() {
    cargo_bin_cmd!("sheet-import")
        .arg("types")
        .assert()
        .success()
        .stdout(contains("mediumtext"))
        .stdout(contains("members"));
    cargo_bin_cmd!("sheet-import")
        .args(["types", "--presets"])
        .assert()
        .success()
        .stdout(contains("Decimal(65, 30)"));
}
