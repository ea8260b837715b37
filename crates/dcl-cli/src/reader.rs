use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use dcl_core::schema::FqName;
use dcl_core::schema_builder::{schema_from_types, HostTypeRepository, SchemaBuilderConfig};
use dcl_core::AnalysisSchema;
use dcl_lint::LintConfig;
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "dcl.config.yaml";

/// A file with its path and content.
pub struct DclFile {
    pub path: String,
    pub content: String,
}

/// Project configuration from dcl.config.yaml.
#[derive(Debug, Default, Deserialize)]
pub struct DclConfig {
    /// Prebuilt analysis schema (JSON or YAML).
    pub schema: Option<String>,
    /// Host type metadata to build the schema from.
    pub types: Option<String>,
    /// Top-level receiver type when building from `types`.
    pub root: Option<String>,
    pub sources: Option<Vec<String>>,
    #[serde(default)]
    pub lint: LintConfig,
}

/// Read DCL files from a path (file or directory).
pub fn read_dcl_files(input_path: &Path) -> Result<Vec<DclFile>> {
    if !input_path.exists() {
        bail!("Path does not exist: {}", input_path.display());
    }

    if input_path.is_file() {
        let content = fs::read_to_string(input_path)
            .with_context(|| format!("Failed to read {}", input_path.display()))?;
        return Ok(vec![DclFile {
            path: input_path.to_string_lossy().to_string(),
            content,
        }]);
    }

    if input_path.is_dir() {
        return match read_project_config(input_path)?.and_then(|c| c.sources) {
            Some(patterns) if !patterns.is_empty() => read_patterns(input_path, &patterns),
            _ => read_patterns(input_path, &["**/*.dcl".to_string()]),
        };
    }

    bail!(
        "Path is neither a file nor a directory: {}",
        input_path.display()
    )
}

/// Directory holding the project config for `input_path`.
pub fn project_dir(input_path: &Path) -> PathBuf {
    if input_path.is_dir() {
        input_path.to_path_buf()
    } else {
        input_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Read the project config next to `input_path`, if there is one.
pub fn read_project_config(input_path: &Path) -> Result<Option<DclConfig>> {
    let config_path = project_dir(input_path).join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let config = serde_yaml::from_str(&content)
        .with_context(|| format!("Invalid YAML config {}", config_path.display()))?;
    Ok(Some(config))
}

/// Load the analysis schema for `input_path`.
///
/// An explicit `--schema` file wins; otherwise the project config names either
/// a prebuilt schema or host types plus a root type.
pub fn load_schema(input_path: &Path, schema_flag: Option<&Path>) -> Result<AnalysisSchema> {
    if let Some(path) = schema_flag {
        return read_data_file(path);
    }

    let dir = project_dir(input_path);
    let Some(config) = read_project_config(input_path)? else {
        bail!(
            "No schema given: pass --schema or add {} to {}",
            CONFIG_FILE,
            dir.display()
        );
    };

    match (config.schema, config.types) {
        (Some(schema), _) => read_data_file(&dir.join(schema)),
        (None, Some(types)) => {
            let Some(root) = config.root else {
                bail!("{} names host types but no root type", CONFIG_FILE);
            };
            build_schema(&dir.join(types), &root, &[])
        }
        (None, None) => bail!("{} names neither a schema nor host types", CONFIG_FILE),
    }
}

/// Build a schema from a host type repository file.
pub fn build_schema(types_path: &Path, root: &str, include: &[String]) -> Result<AnalysisSchema> {
    let repository: HostTypeRepository = read_data_file(types_path)?;
    let extra: Vec<FqName> = include.iter().map(|name| FqName::parse(name)).collect();
    let schema = schema_from_types(
        &repository,
        &FqName::parse(root),
        &extra,
        &SchemaBuilderConfig::default(),
    )
    .with_context(|| format!("Failed to build schema from {}", types_path.display()))?;
    log::info!(
        "built schema with {} classes from {}",
        schema.data_classes.len(),
        types_path.display()
    );
    Ok(schema)
}

/// Read a JSON or YAML file, chosen by extension.
pub fn read_data_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file = path.display();
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => {
            serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {file}"))
        }
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&content).with_context(|| format!("Invalid YAML in {file}"))
        }
        _ => bail!("Unsupported data file `{file}`. Must be json or yaml."),
    }
}

fn read_patterns(base_dir: &Path, patterns: &[String]) -> Result<Vec<DclFile>> {
    let mut files: Vec<DclFile> = Vec::new();
    let mut seen: std::collections::HashSet<PathBuf> = std::collections::HashSet::new();

    for pattern in patterns {
        let full_pattern = base_dir.join(pattern);
        let pattern_str = full_pattern.to_string_lossy().replace('\\', "/");
        let entries = glob::glob(&pattern_str)
            .with_context(|| format!("Invalid glob pattern '{pattern}'"))?;

        let mut matched: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let path = entry.context("Glob error")?;
            if path.is_file() && seen.insert(path.clone()) {
                matched.push(path);
            }
        }
        matched.sort();

        for path in matched {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            files.push(DclFile {
                path: path.to_string_lossy().to_string(),
                content,
            });
        }
    }

    log::debug!("{} files under {}", files.len(), base_dir.display());
    Ok(files)
}
