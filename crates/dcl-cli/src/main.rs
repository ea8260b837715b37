mod commands;
mod reader;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use dcl_core::{parse_string, resolve_document_source, resolve_source, AnalysisSchema};
use reader::{load_schema, read_dcl_files, DclFile};

#[derive(Parser)]
#[command(
    name = "dcl",
    version,
    about = "DCL resolver: resolve declarative configuration documents against a schema"
)]
struct Cli {
    /// Log pass boundaries and counts to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse DCL files and output the language tree as JSON
    Parse {
        /// Input path (file or directory, defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Write output to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve DCL files and output the resolution results as JSON
    Resolve {
        /// Input path (file or directory, defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Analysis schema file (JSON or YAML); defaults to dcl.config.yaml
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Write output to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve DCL files and report diagnostics
    Check {
        /// Input path (file or directory, defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Analysis schema file (JSON or YAML); defaults to dcl.config.yaml
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Output format: human (default) or json
        #[arg(long, default_value = "human")]
        format: String,
    },

    /// Resolve DCL files as declarative documents and output the node resolutions
    Document {
        /// Input path (file or directory, defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Analysis schema file (JSON or YAML); defaults to dcl.config.yaml
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },

    /// Lint DCL files for style and quality issues
    Lint {
        /// Input path (file or directory, defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Analysis schema file (JSON or YAML); defaults to dcl.config.yaml
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Output format: human (default), json or sarif
        #[arg(long, default_value = "human")]
        format: String,
    },

    /// Build an analysis schema from host type metadata
    Schema {
        /// Host type repository file (JSON or YAML)
        types: PathBuf,

        /// Qualified name of the top-level receiver type
        #[arg(long)]
        root: String,

        /// Additional types to include, by qualified name
        #[arg(long)]
        include: Vec<String>,

        /// Write output to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok((output, failed)) => {
            if !output.is_empty() {
                println!("{output}");
            }
            if failed {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// Run a command; returns its output and whether the process should fail.
fn run(command: Commands) -> Result<(String, bool)> {
    match command {
        Commands::Parse { path, output } => {
            let json = run_parse(&path)?;
            Ok((write_output(json, output.as_deref())?, false))
        }
        Commands::Resolve {
            path,
            schema,
            output,
        } => {
            let json = run_resolve(&path, schema.as_deref())?;
            Ok((write_output(json, output.as_deref())?, false))
        }
        Commands::Check {
            path,
            schema,
            format,
        } => {
            let (output, error_count) = commands::check::run_check(&path, schema.as_deref(), &format)?;
            Ok((output, error_count > 0))
        }
        Commands::Document { path, schema } => Ok((run_document(&path, schema.as_deref())?, false)),
        Commands::Lint {
            path,
            schema,
            format,
        } => Ok((
            commands::lint::run_lint(&path, schema.as_deref(), &format)?,
            false,
        )),
        Commands::Schema {
            types,
            root,
            include,
            output,
        } => {
            let json = commands::schema::run_schema(&types, &root, &include)?;
            Ok((write_output(json, output.as_deref())?, false))
        }
    }
}

/// Read the inputs, refusing an empty set.
pub fn read_inputs(input_path: &Path) -> Result<Vec<DclFile>> {
    let files = read_dcl_files(input_path)?;
    if files.is_empty() {
        bail!("No DCL files (.dcl) found at: {}", input_path.display());
    }
    Ok(files)
}

/// Read the inputs and the schema they resolve against.
pub fn read_inputs_with_schema(
    input_path: &Path,
    schema: Option<&Path>,
) -> Result<(Vec<DclFile>, AnalysisSchema)> {
    let files = read_inputs(input_path)?;
    let schema = load_schema(input_path, schema)?;
    Ok((files, schema))
}

fn write_output(json: String, output_file: Option<&Path>) -> Result<String> {
    if let Some(out_path) = output_file {
        std::fs::write(out_path, &json)
            .with_context(|| format!("Failed to write {}", out_path.display()))?;
        log::info!("written to {}", out_path.display());
        return Ok(String::new());
    }
    Ok(json)
}

fn run_parse(input_path: &Path) -> Result<String> {
    let files = read_inputs(input_path)?;
    let parsed: Vec<serde_json::Value> = files
        .iter()
        .map(|f| {
            let tree = parse_string(&f.content, &f.path);
            serde_json::json!({
                "file": f.path,
                "diagnostics": tree.diagnostics(),
                "tree": tree,
            })
        })
        .collect();
    serde_json::to_string_pretty(&parsed).context("JSON serialization error")
}

fn run_resolve(input_path: &Path, schema: Option<&Path>) -> Result<String> {
    let (files, schema) = read_inputs_with_schema(input_path, schema)?;
    let resolved: Vec<serde_json::Value> = files
        .iter()
        .map(|f| {
            let (_, result) = resolve_source(&schema, &f.content, &f.path);
            serde_json::json!({
                "file": f.path,
                "result": result,
            })
        })
        .collect();
    serde_json::to_string_pretty(&resolved).context("JSON serialization error")
}

fn run_document(input_path: &Path, schema: Option<&Path>) -> Result<String> {
    let (files, schema) = read_inputs_with_schema(input_path, schema)?;
    let documents: Vec<serde_json::Value> = files
        .iter()
        .map(|f| {
            let (_, resolved) = resolve_document_source(&schema, &f.content, &f.path);
            serde_json::json!({
                "file": f.path,
                "successful": resolved.is_successful(),
                "document": resolved,
            })
        })
        .collect();
    serde_json::to_string_pretty(&documents).context("JSON serialization error")
}
