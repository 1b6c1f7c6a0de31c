use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pdf2epub::pipeline::default_destination;
use pdf2epub::{ConvertConfig, ConvertRequest, Converter};

#[derive(Debug, Parser)]
#[command(author, version, about = "Convert PDF books to EPUB with chapter detection")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert one document to EPUB
    Convert(ConvertArgs),
    /// Detect chapters and print the section titles without packaging
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
struct ConvertArgs {
    /// Source document (.pdf or .txt)
    input: PathBuf,

    /// Output EPUB path (defaults to the input name with .epub)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Book title (defaults to the input file name)
    #[arg(long)]
    title: Option<String>,

    /// Book author
    #[arg(long)]
    author: Option<String>,

    /// Cover image file
    #[arg(long)]
    cover: Option<PathBuf>,

    /// Path to configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write the assembled document as JSON
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct InspectArgs {
    /// Source document (.pdf or .txt)
    input: PathBuf,

    /// Path to configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Convert(args) => convert_command(args),
        Commands::Inspect(args) => inspect_command(args),
    }
}

fn load_config(path: Option<&Path>) -> Result<ConvertConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from: {:?}", path);
            ConvertConfig::from_file(path)
                .with_context(|| format!("Failed to load config file: {:?}", path))
        }
        None => Ok(ConvertConfig::default()),
    }
}

fn convert_command(args: ConvertArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let converter = Converter::new(config).context("Invalid configuration")?;

    let destination = args
        .output
        .unwrap_or_else(|| default_destination(&args.input, None));

    let request = ConvertRequest {
        source: args.input,
        destination,
        title: args.title,
        author: args.author,
        cover: args.cover,
        json_dump: args.json,
    };

    info!("Converting {:?} -> {:?}", request.source, request.destination);
    let report = converter
        .convert(&request)
        .with_context(|| format!("Failed to convert {:?}", request.source))?;

    info!("Conversion complete!");
    info!("Summary:");
    info!("  - Title: {}", report.title);
    info!("  - Author: {}", report.author);
    info!("  - Pages: {}", report.page_count);
    info!("  - Sections: {}", report.sections.len());
    info!("  - Output: {:?}", report.destination);

    Ok(())
}

fn inspect_command(args: InspectArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let converter = Converter::new(config).context("Invalid configuration")?;

    let extracted = converter
        .extract(&args.input)
        .with_context(|| format!("Failed to read {:?}", args.input))?;
    let document = converter.engine().reconstruct(&extracted.lines);

    info!(
        "{} pages, {} lines, {} sections",
        extracted.page_count,
        extracted.lines.len(),
        document.len()
    );
    for (idx, title) in document.titles().enumerate() {
        println!("{:>3}. {}", idx + 1, title);
    }

    Ok(())
}
