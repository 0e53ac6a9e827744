//! Process command - extract data from a single tax form.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use taxform_core::{DocumentProcessor, DocumentType, RawAnalysisResult, TaxFormService};

use super::output::{render, shape_record, OutputFormat};
use super::{load_config, read_analysis};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or image)
    #[arg(required_unless_present = "analysis")]
    input: Option<PathBuf>,

    /// Document type (w2, 1099-int, 1099-div, 1099-misc, 1099-nec, other)
    #[arg(short = 't', long = "type")]
    doc_type: DocumentType,

    /// Replay a saved provider result instead of calling the provider
    #[arg(short, long, conflicts_with = "input")]
    analysis: Option<PathBuf>,

    /// Save the provider result to this file
    #[arg(long)]
    save_analysis: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Print the extracted record without the typed form defaults
    #[arg(long)]
    raw: bool,

    /// Show extraction warnings and timing
    #[arg(long)]
    show_warnings: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let raw = match (&args.analysis, &args.input) {
        (Some(saved), _) => {
            info!("Replaying saved analysis: {}", saved.display());
            read_analysis(saved)?
        }
        (None, Some(input)) => analyze_file(input, args.doc_type, &config).await?,
        (None, None) => anyhow::bail!("Either an input file or --analysis is required"),
    };

    if let Some(path) = &args.save_analysis {
        fs::write(path, serde_json::to_string_pretty(&raw)?)?;
        debug!("Saved provider result to {}", path.display());
    }

    let result = DocumentProcessor::from_config(&config.extraction).process(&raw, args.doc_type);

    let value = shape_record(result.record, args.doc_type, args.raw)?;
    let output = render(&value, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_warnings {
        eprintln!();
        for warning in &result.warnings {
            eprintln!("{} {}", style("!").yellow(), warning);
        }
        eprintln!(
            "{} Extraction time: {}ms",
            style("ℹ").blue(),
            result.processing_time_ms
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

async fn analyze_file(
    input: &Path,
    doc_type: DocumentType,
    config: &taxform_core::TaxFormConfig,
) -> anyhow::Result<RawAnalysisResult> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let service = TaxFormService::from_config(config)?;
    let data = fs::read(input)?;
    info!("Processing file: {}", input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("Analyzing with {}...", doc_type.model_id()));

    let result = service.analyze(&data, doc_type).await;
    pb.finish_and_clear();

    Ok(result?)
}
