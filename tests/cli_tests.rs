//! CLI binary tests
//!
//! Runs the `inventory-etl` binary with assert_cmd against scratch workbooks.

#![allow(deprecated)] // Command::cargo_bin deprecation - no stable replacement yet

use assert_cmd::Command;
use predicates::prelude::*;
use rust_xlsxwriter::Workbook;
use std::path::Path;
use tempfile::TempDir;

fn write_stock_workbook(path: &Path) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Stock").unwrap();
    sheet.write_string(0, 0, "Inventario General").unwrap();
    sheet.write_string(2, 0, "Código Producto").unwrap();
    sheet.write_string(2, 1, "Descripción").unwrap();
    sheet.write_string(2, 2, "Marca").unwrap();
    sheet.write_string(3, 0, "C-10").unwrap();
    sheet.write_string(3, 1, "Martillo").unwrap();
    sheet.write_string(3, 2, "-").unwrap();
    sheet.write_string(4, 1, "Sin codigo").unwrap();
    workbook.save(path).unwrap();
}

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("inventory-etl").unwrap();
    cmd.env_remove("INVENTORY_ETL_RULES")
        .env_remove("INVENTORY_ETL_OUTPUT")
        .env_remove("RUST_LOG");
    cmd
}

// ═══════════════════════════════════════════════════════════════════════════
// HELP AND VERSION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_cli_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("inventory-etl"))
        .stdout(predicate::str::contains("COMMANDS"));
}

#[test]
fn test_cli_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("inventory-etl"));
}

#[test]
fn test_normalize_help() {
    cmd()
        .args(["normalize", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--scan-rows"))
        .stdout(predicate::str::contains("--min-matches"));
}

// ═══════════════════════════════════════════════════════════════════════════
// NORMALIZE COMMAND TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_normalize_single_file_default_output() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("inventario.xlsx");
    write_stock_workbook(&source);

    cmd()
        .arg("normalize")
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed workbook created"))
        .stdout(predicate::str::contains("KB"));

    assert!(dir.path().join("inventario_procesado.xlsx").exists());
}

#[test]
fn test_normalize_with_sql_and_json() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("inventario.xlsx");
    let output = dir.path().join("limpio.xlsx");
    write_stock_workbook(&source);

    cmd()
        .arg("normalize")
        .arg(&source)
        .arg("-o")
        .arg(&output)
        .args(["--sql", "--json"])
        .assert()
        .success();

    assert!(output.exists());

    let sql = std::fs::read_to_string(dir.path().join("limpio.sql")).unwrap();
    assert!(sql.contains("INSERT INTO products"));
    assert!(sql.contains("'C-10', 'Martillo'"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("limpio.json")).unwrap())
            .unwrap();
    assert_eq!(json["Stock"].as_array().unwrap().len(), 1);
    assert_eq!(json["Stock"][0]["codigo"], "C-10");
}

#[test]
fn test_normalize_directory_into_output_dir() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("entrada");
    let output = dir.path().join("salida");
    std::fs::create_dir(&input).unwrap();
    write_stock_workbook(&input.join("a.xlsx"));
    write_stock_workbook(&input.join("b.xlsx"));

    cmd()
        .arg("normalize")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    assert!(output.join("a_procesado.xlsx").exists());
    assert!(output.join("b_procesado.xlsx").exists());
}

#[test]
fn test_normalize_directory_mirrors_subfolders() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("entrada");
    let output = dir.path().join("salida");
    std::fs::create_dir_all(input.join("2024")).unwrap();
    std::fs::create_dir_all(input.join("2025")).unwrap();
    write_stock_workbook(&input.join("2024").join("inventario.xlsx"));
    write_stock_workbook(&input.join("2025").join("inventario.xlsx"));

    cmd()
        .arg("normalize")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    assert!(output.join("2024").join("inventario_procesado.xlsx").exists());
    assert!(output.join("2025").join("inventario_procesado.xlsx").exists());
    assert!(!output.join("inventario_procesado.xlsx").exists());
}

#[test]
fn test_normalize_refuses_shared_output_file() {
    let dir = TempDir::new().unwrap();
    write_stock_workbook(&dir.path().join("inv.xls"));
    write_stock_workbook(&dir.path().join("inv.xlsx"));

    cmd()
        .arg("normalize")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("would both be written to"));

    assert!(!dir.path().join("inv_procesado.xlsx").exists());
}

#[test]
fn test_normalize_missing_target_fails() {
    let dir = TempDir::new().unwrap();
    cmd()
        .arg("normalize")
        .arg(dir.path().join("missing.xlsx"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Path not found"));
}

#[test]
fn test_normalize_empty_directory_fails() {
    let dir = TempDir::new().unwrap();
    cmd()
        .arg("normalize")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No Excel files found"));
}

// ═══════════════════════════════════════════════════════════════════════════
// SQL AND RULES COMMAND TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_sql_command_default_output() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("inventario.xlsx");
    write_stock_workbook(&source);

    cmd().arg("normalize").arg(&source).assert().success();

    let processed = dir.path().join("inventario_procesado.xlsx");
    cmd()
        .arg("sql")
        .arg(&processed)
        .assert()
        .success()
        .stdout(predicate::str::contains("products"))
        .stdout(predicate::str::contains("SQL script generated"));

    let sql = std::fs::read_to_string(dir.path().join("inventario_procesado.sql")).unwrap();
    assert!(sql.starts_with("-- ============================================"));
    assert!(sql.contains("'C-10'"));
}

#[test]
fn test_rules_prints_builtin_json() {
    let output = cmd().arg("rules").assert().success().get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let kinds: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["stock", "entradas", "salidas"]);
}

#[test]
fn test_rules_rejects_invalid_file() {
    let dir = TempDir::new().unwrap();
    let rules = dir.path().join("reglas.json");
    std::fs::write(&rules, "{ not json").unwrap();

    cmd()
        .arg("rules")
        .arg("--rules")
        .arg(&rules)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load rules"));
}
