use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::tempdir;

const SQL: &str = "WITH a AS (SELECT 1),\nb AS (SELECT * FROM a)\nSELECT * FROM b;\n";

/// Byte offset inside `b`'s body.
const CURSOR_IN_B: &str = "30";

fn write_sql(dir: &tempfile::TempDir, sql: &str) -> String {
    let path = dir.path().join("query.sql");
    std::fs::write(&path, sql).expect("write sql");
    path.to_str().expect("sql path").to_string()
}

#[test]
fn test_sql_format_prints_runnable_query() {
    let dir = tempdir().expect("temp dir");
    let sql_path = write_sql(&dir, SQL);

    let output = Command::new(env!("CARGO_BIN_EXE_ctescope"))
        .args(["--cursor", CURSOR_IN_B, "-f", "sql", &sql_path])
        .output()
        .expect("run CLI");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "Expected exit 0, got: {stdout}");
    assert_eq!(
        stdout,
        "WITH a AS (SELECT 1),\nb AS (SELECT * FROM a)\nSELECT * FROM b;\n"
    );
}

#[test]
fn test_line_column_cursor_with_inner_mode() {
    let dir = tempdir().expect("temp dir");
    let sql_path = write_sql(&dir, SQL);

    let output = Command::new(env!("CARGO_BIN_EXE_ctescope"))
        .args([
            "--line", "2", "--column", "10", "-m", "inner", "-f", "sql", &sql_path,
        ])
        .output()
        .expect("run CLI");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "Expected exit 0, got: {stdout}");
    assert_eq!(stdout.trim_end(), "SELECT * FROM a;");
}

#[test]
fn test_json_output_to_file() {
    let dir = tempdir().expect("temp dir");
    let sql_path = write_sql(&dir, SQL);
    let out_path = dir.path().join("result.json");

    let output = Command::new(env!("CARGO_BIN_EXE_ctescope"))
        .args([
            "--cursor",
            CURSOR_IN_B,
            "-f",
            "json",
            "--compact",
            "-o",
            out_path.to_str().expect("out path"),
            &sql_path,
        ])
        .output()
        .expect("run CLI");

    assert!(output.status.success());
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out_path).expect("read json"))
            .expect("valid json");
    assert_eq!(json["status"], "ready");
    assert_eq!(json["requiredCtes"], serde_json::json!(["a"]));
    assert_eq!(json["target"]["cteName"], "b");
}

#[test]
fn test_reads_stdin() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_ctescope"))
        .args(["--cursor", CURSOR_IN_B])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn CLI");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(SQL.as_bytes())
        .expect("write stdin");
    let output = child.wait_with_output().expect("wait CLI");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "Expected exit 0, got: {stdout}");
    assert!(stdout.contains("Source: <stdin>"), "{stdout}");
    assert!(stdout.contains("Target: CTE b"), "{stdout}");
}

#[test]
fn test_cursor_outside_scope_exits_with_failure() {
    let dir = tempdir().expect("temp dir");
    let sql_path = write_sql(&dir, "SELECT 1;\n");

    let output = Command::new(env!("CARGO_BIN_EXE_ctescope"))
        .args(["--cursor", "3", "-f", "json", &sql_path])
        .output()
        .expect("run CLI");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1), "stdout: {stdout}");
    assert!(stdout.contains("\"notApplicable\""), "{stdout}");
    assert!(stderr.contains("not inside a WITH clause"), "{stderr}");
}

#[test]
fn test_missing_file_is_config_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_ctescope"))
        .args(["--cursor", "0", "/nonexistent/query.sql"])
        .output()
        .expect("run CLI");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(66));
    assert!(stderr.contains("ctescope: error: Failed to read file"), "{stderr}");
}

#[test]
fn test_line_past_end_is_config_error() {
    let dir = tempdir().expect("temp dir");
    let sql_path = write_sql(&dir, SQL);

    let output = Command::new(env!("CARGO_BIN_EXE_ctescope"))
        .args(["--line", "40", "--column", "1", &sql_path])
        .output()
        .expect("run CLI");

    assert_eq!(output.status.code(), Some(66));
}
