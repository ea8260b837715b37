use std::path::Path;

use anyhow::{Context, Result};
use dcl_lint::{LintDiagnostic, LintSeverity, Linter};

use crate::read_inputs_with_schema;
use crate::reader::read_project_config;

pub fn run_lint(input_path: &Path, schema: Option<&Path>, format: &str) -> Result<String> {
    let (files, schema) = read_inputs_with_schema(input_path, schema)?;

    let config = read_project_config(input_path)?
        .map(|c| c.lint)
        .unwrap_or_default();
    let linter = Linter::new(config);
    let results: Vec<LintDiagnostic> = files
        .iter()
        .flat_map(|f| linter.lint_source(&schema, &f.content, &f.path))
        .collect();
    let file_count = files.len();

    match format {
        "json" => serde_json::to_string_pretty(&serde_json::json!({
            "diagnostics": results,
            "summary": {
                "count": results.len(),
                "files": file_count,
            }
        }))
        .context("JSON serialization error"),
        "sarif" => {
            let sarif = build_sarif(&results, &linter);
            serde_json::to_string_pretty(&sarif).context("SARIF serialization error")
        }
        _ => {
            // Human-readable format
            let mut lines: Vec<String> = Vec::new();

            for d in &results {
                let severity = match d.severity {
                    LintSeverity::Error => "error",
                    LintSeverity::Warning => "warning",
                    LintSeverity::Info => "info",
                };
                lines.push(format!(
                    "{}:{}:{} {}[{}]: {}",
                    d.file, d.line, d.col, severity, d.rule, d.message
                ));
            }

            let count = results.len();
            let issue_word = if count == 1 { "issue" } else { "issues" };
            let file_word = if file_count == 1 { "file" } else { "files" };
            lines.push(format!(
                "{count} lint {issue_word} in {file_count} {file_word}."
            ));

            Ok(lines.join("\n"))
        }
    }
}

fn sarif_level(severity: &LintSeverity) -> &'static str {
    match severity {
        LintSeverity::Error => "error",
        LintSeverity::Warning => "warning",
        LintSeverity::Info => "note",
    }
}

fn build_sarif(results: &[LintDiagnostic], linter: &Linter) -> serde_json::Value {
    let rule_descriptors: Vec<serde_json::Value> = linter
        .rules()
        .iter()
        .map(|r| {
            serde_json::json!({
                "id": r.id(),
                "shortDescription": { "text": r.description() },
                "defaultConfiguration": {
                    "level": sarif_level(&r.default_severity())
                }
            })
        })
        .collect();

    let sarif_results: Vec<serde_json::Value> = results
        .iter()
        .map(|d| {
            serde_json::json!({
                "ruleId": d.rule,
                "level": sarif_level(&d.severity),
                "message": { "text": d.message },
                "locations": [{
                    "physicalLocation": {
                        "artifactLocation": { "uri": d.file },
                        "region": {
                            "startLine": d.line,
                            "startColumn": d.col
                        }
                    }
                }]
            })
        })
        .collect();

    serde_json::json!({
        "$schema": "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/main/sarif-2.1/schema/sarif-schema-2.1.0.json",
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": "dcl-lint",
                    "version": env!("CARGO_PKG_VERSION"),
                    "rules": rule_descriptors
                }
            },
            "results": sarif_results
        }]
    })
}
