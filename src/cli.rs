//! Command-line interface for typeslice.

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::extract::{ExtractError, ExtractOptions, Extraction, RenderOptions};
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Template written by `typeslice init`.
pub const CONFIG_TEMPLATE: &str = include_str!("templates/default.yaml");

/// Slice one declaration and everything it references out of a TypeScript
/// source into a standalone declaration file.
///
/// Typeslice starts at an entry point (an interface, enum, type alias or
/// namespace), follows property types, array elements, union branches,
/// type arguments and `extends` clauses, and writes every declaration it
/// reaches. Classes and function types collapse to `any`.
#[derive(Parser)]
#[command(name = "typeslice")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub verbose: Verbosity<WarnLevel>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract an entry point and its dependencies into a declaration file
    #[command(visible_alias = "x")]
    Extract(ExtractArgs),
    /// Create a typeslice config file from the default template
    Init(InitArgs),
}

/// Arguments for the extract command.
#[derive(Parser)]
pub struct ExtractArgs {
    /// TypeScript source file to read
    #[arg(short, long)]
    pub file: PathBuf,

    /// Name of the interface, enum, type alias or namespace to start from
    #[arg(short, long)]
    pub entry: String,

    /// Directory the declaration file is written to
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Fail if the entry point is not found
    #[arg(long)]
    pub strict: bool,

    /// Print the declarations to stdout instead of writing a file
    #[arg(long)]
    pub stdout: bool,

    /// Summary format: pretty or json
    #[arg(long, default_value = "pretty")]
    pub format: String,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "typeslice.yaml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Install the stderr tracing subscriber for the requested verbosity.
pub fn init_logging(verbose: &Verbosity<WarnLevel>) {
    let level = verbose.tracing_level_filter();
    let filter = EnvFilter::new(format!("warn,{}={}", env!("CARGO_CRATE_NAME"), level));
    // Ignore the error if a subscriber is already installed (tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Read, extract and render one source file.
#[cfg(feature = "tree-sitter")]
fn extract_file(
    file: &Path,
    entry_point: &str,
    extract_options: &ExtractOptions,
    render_options: &RenderOptions,
) -> Result<Extraction, ExtractError> {
    let source = std::fs::read_to_string(file)?;
    crate::extract::extract_source(
        &file.to_string_lossy(),
        source,
        entry_point,
        extract_options,
        render_options,
    )
}

#[cfg(not(feature = "tree-sitter"))]
fn extract_file(
    file: &Path,
    _entry_point: &str,
    _extract_options: &ExtractOptions,
    _render_options: &RenderOptions,
) -> Result<Extraction, ExtractError> {
    Err(ExtractError::Parse {
        path: file.to_string_lossy().to_string(),
        message: "typeslice was built without the tree-sitter feature".to_string(),
    })
}

/// Run the extract command.
pub fn run_extract(args: &ExtractArgs) -> anyhow::Result<i32> {
    // Validate format
    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }
    if args.stdout && args.format == "json" {
        eprintln!("Error: --stdout cannot be combined with --format json");
        return Ok(EXIT_ERROR);
    }

    // Load config (explicit, discovered, or defaults)
    let (config, config_path) = match Config::load(args.config.as_deref(), Path::new(".")) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    match &config_path {
        Some(path) => debug!(config = %path.display(), "loaded config"),
        None => debug!("no config file, using defaults"),
    }

    let mut extract_options = config.extract_options()?;
    extract_options.strict |= args.strict;
    let render_options = config.render_options();

    let extraction = match extract_file(&args.file, &args.entry, &extract_options, &render_options)
    {
        Ok(extraction) => extraction,
        Err(ExtractError::EntryPointNotFound(name)) => {
            eprintln!(
                "Error: entry point {:?} not found in {}",
                name,
                args.file.display()
            );
            return Ok(EXIT_FAILED);
        }
        Err(ExtractError::Io(e)) => {
            eprintln!("Error: cannot read {}: {}", args.file.display(), e);
            return Ok(EXIT_ERROR);
        }
        Err(e) => return Err(e.into()),
    };

    // Write declarations
    let written = if args.stdout {
        print!("{}", extraction.output);
        None
    } else {
        let path = config.output_path(&args.output, &args.entry);
        if let Err(e) = std::fs::create_dir_all(&args.output) {
            eprintln!("Error: failed to create directory: {}", e);
            return Ok(EXIT_ERROR);
        }
        if let Err(e) = std::fs::write(&path, &extraction.output) {
            eprintln!("Error: failed to write {}: {}", path.display(), e);
            return Ok(EXIT_ERROR);
        }
        info!(path = %path.display(), "wrote declarations");
        Some(path.to_string_lossy().to_string())
    };

    // Output summary
    let source = args.file.to_string_lossy().to_string();
    match args.format.as_str() {
        "json" => report::write_json(&source, &args.entry, written.as_deref(), &extraction.forest)?,
        _ => report::write_pretty(&source, &args.entry, written.as_deref(), &extraction.forest),
    }

    Ok(EXIT_SUCCESS)
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // Check if output already exists
    if args.output.exists() && !args.force {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --force to overwrite");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    // Write config file
    if let Err(e) = std::fs::write(&args.output, CONFIG_TEMPLATE) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to customize the output", args.output.display());
    println!(
        "  2. Run: typeslice extract --file <source.ts> --entry <Name> --config {}",
        args.output.display()
    );

    Ok(EXIT_SUCCESS)
}
