//! Command-line interface for gemscan.

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::catalog::ModelCatalog;
use crate::config::ScanConfig;
use crate::detect::Runner;
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 2;

/// Config file names searched for in the working directory.
const DEFAULT_CONFIG_NAMES: &[&str] = &["gemscan.yaml", ".gemscan.yaml"];

/// Catalog file names searched for in the working directory.
const DEFAULT_CATALOG_NAMES: &[&str] = &["gemini_models_config.json", "models.yaml"];

const FORMATS: &[&str] = &["pretty", "json", "markdown"];

/// Bundled starter catalog.
const STARTER_CATALOG: &str = include_str!("templates/models.json");

/// Find Gemini API call sites in a source tree and work out which model
/// each one should use.
///
/// gemscan reads TypeScript/JavaScript and Python sources, classifies each
/// function that calls the API by the capabilities it uses, matches it to a
/// model from a catalog and prints an example request for every call site.
#[derive(Parser)]
#[command(name = "gemscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a directory or file for API call sites
    #[command(visible_alias = "analyze")]
    Scan(ScanArgs),
    /// List the models in the catalog
    Models(ModelsArgs),
    /// Write the bundled starter catalog to disk
    Init(InitArgs),
}

/// Arguments for the scan command.
#[derive(Parser)]
pub struct ScanArgs {
    /// Path to scan (file or directory)
    pub path: PathBuf,

    /// Model catalog, JSON or YAML (default: auto-discover)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Scan configuration YAML (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty, json, or markdown
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Arguments for the models command.
#[derive(Parser)]
pub struct ModelsArgs {
    /// Model catalog, JSON or YAML (default: auto-discover)
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "gemini_models_config.json")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .try_init();
}

/// Find a scan configuration file in `dir`.
pub fn discover_config(dir: &Path) -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

/// Find a catalog in `dir`, then in the user config directory.
pub fn discover_catalog(dir: &Path) -> Option<PathBuf> {
    DEFAULT_CATALOG_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
        .or_else(|| user_catalog_path().filter(|p| p.is_file()))
}

/// `<user config dir>/gemscan/models.json`
fn user_catalog_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "gemscan").map(|dirs| dirs.config_dir().join("models.json"))
}

fn load_catalog(explicit: Option<&PathBuf>) -> anyhow::Result<Option<ModelCatalog>> {
    let cwd = std::env::current_dir()?;
    let path = match explicit {
        Some(p) => Some(p.clone()),
        None => discover_catalog(&cwd),
    };
    Ok(path.map(ModelCatalog::load_or_empty))
}

fn load_config(explicit: Option<&PathBuf>) -> anyhow::Result<ScanConfig> {
    let path = match explicit {
        Some(p) => Some(p.clone()),
        None => discover_config(&std::env::current_dir()?),
    };
    match path {
        Some(p) => {
            let config = ScanConfig::parse_file(&p)
                .map_err(|e| anyhow::anyhow!("parsing config {}: {}", p.display(), e))?;
            tracing::info!(path = %p.display(), "loaded scan config");
            Ok(config)
        }
        None => Ok(ScanConfig::default()),
    }
}

/// Run the scan command.
pub fn run_scan(args: &ScanArgs) -> anyhow::Result<i32> {
    init_logging(args.verbose);

    if !FORMATS.contains(&args.format.as_str()) {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty', 'json', or 'markdown'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let config = match load_config(args.config.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let catalog = match load_catalog(args.catalog.as_ref())? {
        Some(c) => c,
        None => {
            tracing::warn!("no model catalog found, matches will have no definitions");
            ModelCatalog::empty()
        }
    };

    if !args.path.exists() {
        eprintln!("Error: cannot access path {:?}", args.path);
        return Ok(EXIT_ERROR);
    }

    let result = Runner::new(&args.path).with_config(config).run(&catalog)?;
    let path_str = args.path.to_string_lossy().to_string();

    match &args.output {
        Some(file) => {
            colored::control::set_override(false);
            let mut out = std::fs::File::create(file)
                .map_err(|e| anyhow::anyhow!("creating {}: {}", file.display(), e))?;
            write_report(&mut out, &args.format, &path_str, &result)?;
            eprintln!("Report written to {}", file.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            write_report(&mut out, &args.format, &path_str, &result)?;
        }
    }

    Ok(EXIT_SUCCESS)
}

fn write_report<W: Write>(
    out: &mut W,
    format: &str,
    path: &str,
    result: &crate::detect::ScanResult,
) -> anyhow::Result<()> {
    match format {
        "json" => writeln!(out, "{}", report::render_json(path, result)?)?,
        "markdown" => write!(out, "{}", report::render_markdown(path, result))?,
        _ => report::write_pretty(out, path, result)?,
    }
    Ok(())
}

/// Run the models command.
pub fn run_models(args: &ModelsArgs) -> anyhow::Result<i32> {
    init_logging(false);

    let path = match args.catalog.clone() {
        Some(p) => p,
        None => match discover_catalog(&std::env::current_dir()?) {
            Some(p) => p,
            None => {
                eprintln!("Error: no model catalog found");
                eprintln!("Run 'gemscan init' to create one, or pass --catalog");
                return Ok(EXIT_ERROR);
            }
        },
    };

    let catalog = match ModelCatalog::load(&path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    if catalog.is_empty() {
        println!("Catalog is empty.");
        return Ok(EXIT_SUCCESS);
    }

    println!("Models ({}):", catalog.len());
    println!();
    for def in catalog.iter() {
        println!("  {:<32} {:<18} {}", def.id, def.category, def.name);
    }

    Ok(EXIT_SUCCESS)
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.output.exists() && !args.force {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Use --force to overwrite it or --output to pick another path");
        return Ok(EXIT_ERROR);
    }

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, STARTER_CATALOG) {
        eprintln!("Error: failed to write catalog: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to describe the models you use", args.output.display());
    println!(
        "  2. Run: gemscan scan . --catalog {}",
        args.output.display()
    );

    Ok(EXIT_SUCCESS)
}
