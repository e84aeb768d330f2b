//! Integration tests for the tabroll CLI

use std::fs;
use std::path::Path;
use std::process::Command;

fn run_tabroll(args: &[&str]) -> (String, String, bool) {
    let mut cmd_args = vec!["run", "-p", "tabroll", "--quiet", "--"];
    cmd_args.extend(args);

    let output = Command::new("cargo")
        .args(&cmd_args)
        .current_dir(env!("CARGO_MANIFEST_DIR").to_string() + "/..")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();

    (stdout, stderr, success)
}

fn write_fixtures(dir: &Path) -> (String, String) {
    let definition = dir.join("report.json");
    fs::write(
        &definition,
        r#"{
            "title": "Sales by client",
            "columns": [
                {"name": "client", "heading": "Client"},
                {"name": "amount", "heading": "Amount", "align": "right",
                 "format": "number", "decimal_places": 2,
                 "totals_levels": ["client", "report"]}
            ],
            "levels": [
                {"name": "report", "group_by": [],
                 "totals_caption": "Grand total", "caption_column": "client"},
                {"name": "client", "group_by": ["client"],
                 "totals_caption": "Client total", "caption_column": "client"}
            ]
        }"#,
    )
    .unwrap();

    let data = dir.join("data.csv");
    fs::write(
        &data,
        "client,amount\nAcme,10.50\nAcme,2.00\nZenith,7.25\n",
    )
    .unwrap();

    (
        definition.to_string_lossy().to_string(),
        data.to_string_lossy().to_string(),
    )
}

#[test]
fn test_cli_help() {
    let (stdout, _, success) = run_tabroll(&["--help"]);

    assert!(success);
    assert!(stdout.contains("tabroll"));
    assert!(stdout.contains("--format"));
    assert!(stdout.contains("--output"));
    assert!(stdout.contains("--totals"));
}

#[test]
fn test_cli_version() {
    let (stdout, _, success) = run_tabroll(&["--version"]);

    assert!(success);
    assert!(stdout.contains("tabroll"));
}

#[test]
fn test_html_output() {
    let dir = tempfile::tempdir().unwrap();
    let (definition, data) = write_fixtures(dir.path());
    let (stdout, _, success) = run_tabroll(&[&definition, &data]);

    assert!(success);
    assert!(stdout.contains("<title>Sales by client</title>"));
    assert!(stdout.contains("Client total:"));
    assert!(stdout.contains("Grand total:"));
    assert!(stdout.contains("12.50"));
    assert!(stdout.contains("19.75"));
}

#[test]
fn test_csv_output_with_totals() {
    let dir = tempfile::tempdir().unwrap();
    let (definition, data) = write_fixtures(dir.path());
    let (stdout, _, success) =
        run_tabroll(&[&definition, &data, "--format", "csv", "--totals"]);

    assert!(success);
    assert!(stdout.contains("\"Client\",\"Amount\""));
    // Group keys stay visible in delimited output by default.
    assert!(stdout.lines().filter(|l| l.contains("\"Acme\"")).count() >= 2);
    assert!(stdout.contains("\"Client total:\""));
}

#[test]
fn test_csv_output_without_totals() {
    let dir = tempfile::tempdir().unwrap();
    let (definition, data) = write_fixtures(dir.path());
    let (stdout, _, success) = run_tabroll(&[&definition, &data, "--format", "csv"]);

    assert!(success);
    assert!(!stdout.contains("Client total:"));
}

#[test]
fn test_text_output_paginates() {
    let dir = tempfile::tempdir().unwrap();
    let (definition, data) = write_fixtures(dir.path());
    let (stdout, _, success) = run_tabroll(&[
        &definition,
        &data,
        "--format",
        "text",
        "--page-width",
        "60",
    ]);

    assert!(success);
    assert!(stdout.contains("Sales by client"));
    assert!(stdout.contains("Page 1"));
    assert!(stdout.contains("Client total:"));
}

#[test]
fn test_xlsx_requires_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let (definition, data) = write_fixtures(dir.path());
    let (_, stderr, success) = run_tabroll(&[&definition, &data, "--format", "xlsx"]);

    assert!(!success);
    assert!(stderr.contains("Error:"));
}

#[test]
fn test_xlsx_writes_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let (definition, data) = write_fixtures(dir.path());
    let out = dir.path().join("report.xlsx");
    let (_, _, success) = run_tabroll(&[
        &definition,
        &data,
        "--format",
        "xlsx",
        "--output",
        &out.to_string_lossy(),
    ]);

    assert!(success);
    let bytes = fs::read(&out).unwrap();
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn test_missing_definition_fails() {
    let (_, stderr, success) = run_tabroll(&["/nonexistent/report.json", "/nonexistent/data.csv"]);

    assert!(!success);
    assert!(stderr.contains("Error:"));
}
