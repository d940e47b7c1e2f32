use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mixture_cli::commands::{self, Encoding, ReportFormat};
use mixture_cli::document::{CompositionDocument, LoadedDocument};
use mixture_core::EngineConfig;

#[derive(Parser)]
#[command(name = "mixture")]
#[command(about = "Resolve, validate and encode mixin configurations", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Engine config file (TOML)
    #[arg(short, long, env = "MIXTURE_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective configuration of types, inheritance included
    Resolve {
        /// Composition document (JSON)
        input: PathBuf,

        /// Full type name to resolve; every type in the document when omitted
        #[arg(long = "type")]
        types: Vec<String>,
    },

    /// Run the rule catalogue over the document's definitions
    Validate {
        /// Composition document (JSON)
        input: PathBuf,

        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },

    /// Serialize the document's configurations
    Encode {
        /// Composition document (JSON)
        input: PathBuf,

        #[arg(short, long, value_enum, default_value_t = Encoding::Flat)]
        encoding: Encoding,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.debug)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Resolve { input, types } => {
            let doc = load_document(&input)?;
            print!("{}", commands::resolve(&doc, &config, &types)?);
        }
        Commands::Validate { input, format } => {
            let doc = load_document(&input)?;
            let outcome = commands::validate(&doc, &config, format)?;
            println!("{}", outcome.report);
            if !outcome.passed {
                bail!("Validation failed for {}", input.display());
            }
        }
        Commands::Encode { input, encoding } => {
            let doc = load_document(&input)?;
            println!("{}", commands::encode(&doc, encoding)?);
        }
    }

    Ok(())
}

fn load_document(path: &Path) -> Result<LoadedDocument> {
    info!("Loading composition document {}", path.display());
    CompositionDocument::load(path)?
        .resolve()
        .with_context(|| format!("Invalid composition document {}", path.display()))
}
