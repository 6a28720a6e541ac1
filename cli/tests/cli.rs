//! End-to-end tests for the docrender binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const REPORT: &str = r#"{
  "title": "Stock",
  "metadata": {"owner": "ops"},
  "contents": [
    {"type": "text", "text": "Warehouse", "heading_level": 1},
    {"type": "table", "id": "stock", "schema": ["item", "qty"],
     "rows": [["bolt", 40], ["nut", 12], ["washer", 75]]},
    {"type": "section", "title": "Notes", "children": [
      {"type": "text", "text": "Counted on Monday."}
    ]}
  ]
}"#;

fn docrender(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_docrender"))
        .args(args)
        .output()
        .expect("failed to run docrender")
}

fn write_input(dir: &Path) -> PathBuf {
    let path = dir.join("report.json");
    fs::write(&path, REPORT).unwrap();
    path
}

// ==================== Render Tests ====================

#[test]
fn test_render_all_formats() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path());
    let out_dir = dir.path().join("out");

    let result = docrender(&[
        "render",
        input.to_str().unwrap(),
        "-o",
        out_dir.to_str().unwrap(),
    ]);
    assert!(result.status.success(), "{:?}", result);

    let markdown = fs::read_to_string(out_dir.join("output.md")).unwrap();
    assert!(markdown.contains("| bolt | 40 |"));
    assert!(out_dir.join("output.txt").exists());
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out_dir.join("output.json")).unwrap()).unwrap();
    assert_eq!(json["title"], "Stock");
}

#[test]
fn test_render_with_table_ops_to_stdout() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path());

    let result = docrender(&[
        "render",
        input.to_str().unwrap(),
        "--stdout",
        "--format",
        "markdown",
        "--sort",
        "qty:desc",
        "--limit",
        "1",
    ]);
    assert!(result.status.success(), "{:?}", result);

    let stdout = String::from_utf8(result.stdout).unwrap();
    assert!(stdout.contains("| washer | 75 |"));
    assert!(!stdout.contains("| bolt |"));
}

#[test]
fn test_render_sort_descending_prefix() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path());

    let result = docrender(&[
        "render",
        input.to_str().unwrap(),
        "--stdout",
        "--format",
        "text",
        "--sort",
        "-qty",
    ]);
    assert!(result.status.success(), "{:?}", result);

    let stdout = String::from_utf8(result.stdout).unwrap();
    let washer = stdout.find("washer\t75").unwrap();
    let nut = stdout.find("nut\t12").unwrap();
    assert!(washer < nut);
}

#[test]
fn test_render_failure_counts_outputs() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path());
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "x").unwrap();

    let result = docrender(&[
        "render",
        input.to_str().unwrap(),
        "-o",
        blocker.to_str().unwrap(),
        "--format",
        "json",
        "--format",
        "text",
    ]);
    assert!(!result.status.success());
    let stderr = String::from_utf8(result.stderr).unwrap();
    assert!(stderr.contains("2 of 2 outputs failed"), "{}", stderr);
}

#[test]
fn test_render_huge_timeout() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path());

    let result = docrender(&[
        "render",
        input.to_str().unwrap(),
        "--stdout",
        "--format",
        "text",
        "--timeout",
        "18446744073709551615",
    ]);
    assert!(result.status.success(), "{:?}", result);
}

#[test]
fn test_render_gzip_extension() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path());
    let out_dir = dir.path().join("gz");

    let result = docrender(&[
        "render",
        input.to_str().unwrap(),
        "-o",
        out_dir.to_str().unwrap(),
        "--format",
        "json",
        "--gzip",
    ]);
    assert!(result.status.success(), "{:?}", result);

    let bytes = fs::read(out_dir.join("output.json.gz")).unwrap();
    assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
}

#[test]
fn test_render_missing_column_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path());

    let result = docrender(&[
        "render",
        input.to_str().unwrap(),
        "--stdout",
        "--format",
        "text",
        "--sort",
        "price",
    ]);
    assert!(!result.status.success());
    let stderr = String::from_utf8(result.stderr).unwrap();
    assert!(stderr.contains("price"));
}

#[test]
fn test_render_missing_input() {
    let result = docrender(&["render", "/definitely/not/here.json", "--stdout"]);
    assert!(!result.status.success());
}

// ==================== Info / Version Tests ====================

#[test]
fn test_info() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path());

    let result = docrender(&["info", input.to_str().unwrap()]);
    assert!(result.status.success());

    let stdout = String::from_utf8(result.stdout).unwrap();
    assert!(stdout.contains("Stock"));
    assert!(stdout.contains("owner"));
    assert!(stdout.contains("table: 1"));
    assert!(stdout.contains("Table rows"));
}

#[test]
fn test_version() {
    let result = docrender(&["version"]);
    assert!(result.status.success());
    let stdout = String::from_utf8(result.stdout).unwrap();
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}
