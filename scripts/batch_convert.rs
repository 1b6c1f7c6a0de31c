use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pdf2epub::pipeline::find_sources;
use pdf2epub::{ConvertConfig, Converter};

#[derive(Debug, Parser)]
#[command(author, version, about = "Convert a directory of PDF/text books to EPUB")]
struct Args {
    /// Input directory containing PDF/TXT files
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for EPUB files
    #[arg(short, long)]
    output: PathBuf,

    /// Author recorded for every book
    #[arg(long)]
    author: Option<String>,

    /// Path to configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting batch conversion");
    info!("Input directory: {:?}", args.input);
    info!("Output directory: {:?}", args.output);

    let config = match &args.config {
        Some(path) => ConvertConfig::from_file(path)
            .with_context(|| format!("Failed to load config file: {:?}", path))?,
        None => ConvertConfig::default(),
    };

    if find_sources(&args.input).is_empty() {
        anyhow::bail!("No book files found in {:?}", args.input);
    }

    let converter = Converter::new(config).context("Invalid configuration")?;
    let report = converter
        .convert_directory(&args.input, &args.output, args.author.as_deref())
        .with_context(|| format!("Failed to convert directory: {:?}", args.input))?;

    let report_path = args.output.join("report.json");
    fs::write(&report_path, serde_json::to_string_pretty(&report)?)
        .with_context(|| format!("Failed to write report: {:?}", report_path))?;
    info!("Report saved to: {:?}", report_path);

    info!("Summary:");
    info!("  - Documents: {}", report.total());
    info!("  - Converted: {}", report.converted.len());
    info!("  - Failed: {}", report.failed.len());

    if report.converted.is_empty() {
        anyhow::bail!("No documents could be converted");
    }

    Ok(())
}
