use std::path::{Path, PathBuf};
use std::process::Command;

/// Get the workspace root (two levels up from CARGO_MANIFEST_DIR of dcl-cli)
fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent() // crates/
        .unwrap()
        .parent() // workspace root
        .unwrap()
        .to_path_buf()
}

fn dcl_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dcl"));
    cmd.current_dir(workspace_root());
    cmd
}

fn run_ok(args: &[&str]) -> String {
    let output = dcl_bin().args(args).output().expect("failed to run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn cli_help() {
    let stdout = run_ok(&["--help"]);
    assert!(stdout.contains("DCL resolver"));
}

#[test]
fn cli_version() {
    let stdout = run_ok(&["--version"]);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

// ── Parse ────────────────────────────────────────────────────

#[test]
fn cli_parse_single_file() {
    let stdout = run_ok(&["parse", "samples/project/build.dcl"]);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("invalid JSON output");
    let files = parsed.as_array().expect("array of files");
    assert_eq!(files.len(), 1);
    assert!(files[0]["tree"]["topLevelBlock"].is_object());
    assert_eq!(files[0]["diagnostics"].as_array().unwrap().len(), 0);
}

#[test]
fn cli_parse_directory() {
    let stdout = run_ok(&["parse", "samples/"]);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("invalid JSON output");
    // project/build.dcl + broken/broken.dcl + lint/style.dcl
    assert_eq!(parsed.as_array().unwrap().len(), 3);
}

#[test]
fn cli_parse_nonexistent() {
    let output = dcl_bin()
        .args(["parse", "nonexistent/path"])
        .output()
        .expect("failed to run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"));
}

#[test]
fn cli_parse_output_file() {
    let tmp = std::env::temp_dir().join("dcl-cli-test-parse.json");
    run_ok(&[
        "parse",
        "samples/project/build.dcl",
        "-o",
        tmp.to_str().unwrap(),
    ]);

    let content = std::fs::read_to_string(&tmp).expect("output file should exist");
    let parsed: serde_json::Value = serde_json::from_str(&content).expect("invalid JSON in file");
    assert!(parsed.is_array());

    std::fs::remove_file(&tmp).ok();
}

// ── Resolve / document ───────────────────────────────────────

#[test]
fn cli_resolve_uses_project_config() {
    let stdout = run_ok(&["resolve", "samples/project/"]);
    let resolved: serde_json::Value = serde_json::from_str(&stdout).expect("invalid JSON output");
    let result = &resolved[0]["result"];
    assert_eq!(result["errors"].as_array().unwrap().len(), 0);
    let names: Vec<&str> = result["assignments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["lhs"]["property"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["name", "description", "release", "enabled"]);
    assert_eq!(result["additions"].as_array().unwrap().len(), 2);
}

#[test]
fn cli_resolve_without_schema_fails() {
    let output = dcl_bin()
        .args(["resolve", "crates/dcl-cli/Cargo.toml"])
        .output()
        .expect("failed to run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No schema given"), "stderr: {stderr}");
}

#[test]
fn cli_document_resolution() {
    let stdout = run_ok(&["document", "samples/project/build.dcl"]);
    let documents: serde_json::Value = serde_json::from_str(&stdout).expect("invalid JSON output");
    assert_eq!(documents[0]["successful"], true);
    assert_eq!(documents[0]["document"]["content"].as_array().unwrap().len(), 5);
}

// ── Check ────────────────────────────────────────────────────

#[test]
fn cli_check_clean() {
    let stdout = run_ok(&["check", "samples/project/"]);
    assert!(stdout.contains("0 errors, 0 warnings in 1 file."), "stdout: {stdout}");
}

#[test]
fn cli_check_with_errors() {
    let output = dcl_bin()
        .args(["check", "samples/broken/"])
        .output()
        .expect("failed to run");
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("error[DCL-E004]"), "stdout: {stdout}");
    assert!(stdout.contains("broken.dcl:2:1"), "stdout: {stdout}");
}

#[test]
fn cli_check_json_format() {
    let output = dcl_bin()
        .args(["check", "samples/broken/broken.dcl", "--format", "json"])
        .output()
        .expect("failed to run");
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let result: serde_json::Value = serde_json::from_str(&stdout).expect("invalid JSON");
    let codes: Vec<&str> = result["diagnostics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["code"].as_str().unwrap())
        .collect();
    assert!(codes.contains(&"DCL-E004"), "codes: {codes:?}");
    assert!(codes.contains(&"DCL-E011"), "codes: {codes:?}");
    assert_eq!(result["summary"]["files"], 1);
}

// ── Schema ───────────────────────────────────────────────────

#[test]
fn cli_schema_roundtrips_through_check() {
    let tmp = std::env::temp_dir().join("dcl-cli-test-schema.json");
    run_ok(&[
        "schema",
        "samples/project/host-types.json",
        "--root",
        "app.Project",
        "-o",
        tmp.to_str().unwrap(),
    ]);

    let content = std::fs::read_to_string(&tmp).expect("schema file should exist");
    let schema: serde_json::Value = serde_json::from_str(&content).expect("invalid JSON");
    assert_eq!(schema["topLevelReceiverType"], "app.Project");
    assert!(schema["dataClasses"]["app.Library"].is_object());

    let stdout = run_ok(&[
        "check",
        "samples/project/build.dcl",
        "--schema",
        tmp.to_str().unwrap(),
    ]);
    assert!(stdout.contains("0 errors"), "stdout: {stdout}");

    std::fs::remove_file(&tmp).ok();
}

#[test]
fn cli_schema_unknown_root() {
    let output = dcl_bin()
        .args([
            "schema",
            "samples/project/host-types.json",
            "--root",
            "app.Missing",
        ])
        .output()
        .expect("failed to run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("app.Missing"), "stderr: {stderr}");
}

// ── Lint ─────────────────────────────────────────────────────

#[test]
fn cli_lint_human() {
    let stdout = run_ok(&["lint", "samples/lint/"]);
    assert!(stdout.contains("warning[duplicate-assignment]"), "stdout: {stdout}");
    // dcl.config.yaml raises empty-block to an error
    assert!(stdout.contains("error[empty-block]"), "stdout: {stdout}");
    assert!(stdout.contains("2 lint issues in 1 file."), "stdout: {stdout}");
}

#[test]
fn cli_lint_json() {
    let stdout = run_ok(&["lint", "samples/project/", "--format", "json"]);
    let result: serde_json::Value = serde_json::from_str(&stdout).expect("invalid JSON");
    assert!(result["diagnostics"].is_array());
    assert_eq!(result["summary"]["count"], 0);
}

#[test]
fn cli_lint_sarif() {
    let stdout = run_ok(&["lint", "samples/lint/", "--format", "sarif"]);
    let sarif: serde_json::Value = serde_json::from_str(&stdout).expect("invalid SARIF JSON");
    assert_eq!(sarif["version"], "2.1.0");
    assert_eq!(sarif["runs"][0]["tool"]["driver"]["rules"].as_array().unwrap().len(), 3);
    assert_eq!(sarif["runs"][0]["results"].as_array().unwrap().len(), 2);
}
