use std::path::Path;

use anyhow::{Context, Result};

use crate::reader::build_schema;

pub fn run_schema(types_path: &Path, root: &str, include: &[String]) -> Result<String> {
    let schema = build_schema(types_path, root, include)?;
    serde_json::to_string_pretty(&schema).context("JSON serialization error")
}
