use std::path::Path;

use anyhow::{Context, Result};
use dcl_core::{check_source, Diagnostic, DiagnosticSeverity};

use crate::read_inputs_with_schema;

/// Check every input; returns the report and the error count.
pub fn run_check(input_path: &Path, schema: Option<&Path>, format: &str) -> Result<(String, usize)> {
    let (files, schema) = read_inputs_with_schema(input_path, schema)?;

    let diagnostics: Vec<Diagnostic> = files
        .iter()
        .flat_map(|f| check_source(&schema, &f.content, &f.path))
        .collect();

    let error_count = diagnostics
        .iter()
        .filter(|d| d.severity == DiagnosticSeverity::Error)
        .count();
    let warning_count = diagnostics.len() - error_count;
    let file_count = files.len();
    log::debug!("{error_count} errors, {warning_count} warnings in {file_count} files");

    if format == "json" {
        let output = serde_json::json!({
            "diagnostics": diagnostics,
            "summary": {
                "errors": error_count,
                "warnings": warning_count,
                "files": file_count,
            }
        });
        let json = serde_json::to_string_pretty(&output).context("JSON serialization error")?;
        return Ok((json, error_count));
    }

    // Human-readable format
    let mut lines: Vec<String> = Vec::new();

    for d in &diagnostics {
        let severity = match d.severity {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
        };
        lines.push(format!(
            "{}:{}:{} {}[{}]: {}",
            d.file, d.line, d.col, severity, d.code, d.message
        ));
    }

    let error_word = if error_count == 1 { "error" } else { "errors" };
    let warning_word = if warning_count == 1 {
        "warning"
    } else {
        "warnings"
    };
    let file_word = if file_count == 1 { "file" } else { "files" };
    lines.push(format!(
        "{error_count} {error_word}, {warning_count} {warning_word} in {file_count} {file_word}."
    ));

    Ok((lines.join("\n"), error_count))
}
