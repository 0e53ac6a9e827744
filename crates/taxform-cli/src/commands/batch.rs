//! Batch processing command for multiple tax form files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::{debug, error, warn};

use taxform_core::{DocumentProcessor, DocumentType, TaxFormService};

use super::output::{cell, render, shape_record, OutputFormat};
use super::{load_config, read_analysis};

const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "tiff", "tif", "bmp"];

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of input files. Saved analysis files (.json) are replayed.
    #[arg(required = true)]
    input: String,

    /// Document type of every matched file
    #[arg(short = 't', long = "type")]
    doc_type: DocumentType,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Print the extracted records without the typed form defaults
    #[arg(long)]
    raw: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    output: Option<Value>,
    warnings: usize,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_document(p) || is_saved_analysis(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    // Only documents need the provider.
    let service = if files.iter().any(|p| is_document(p)) {
        Some(TaxFormService::from_config(&config)?)
    } else {
        None
    };
    let processor = DocumentProcessor::from_config(&config.extraction);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let outcome = process_single_file(&path, &args, service.as_ref(), &processor).await;
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match outcome {
            Ok((output, warnings)) => results.push(ProcessResult {
                path,
                output: Some(output),
                warnings,
                error: None,
                processing_time_ms,
            }),
            Err(e) => {
                let error_msg = e.to_string();
                if !args.continue_on_error {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
                warn!("Failed to process {}: {}", path.display(), error_msg);
                results.push(ProcessResult {
                    path,
                    output: None,
                    warnings: 0,
                    error: Some(error_msg),
                    processing_time_ms,
                });
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    if let Some(output_dir) = &args.output_dir {
        for result in &results {
            let Some(output) = &result.output else {
                continue;
            };
            let stem = result
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("document");
            let output_path = output_dir.join(format!("{}.{}", stem, args.format.extension()));

            fs::write(&output_path, render(output, args.format)?)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, args.doc_type, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn is_document(path: &Path) -> bool {
    DOCUMENT_EXTENSIONS.contains(&extension(path).as_str())
}

fn is_saved_analysis(path: &Path) -> bool {
    extension(path) == "json"
}

async fn process_single_file(
    path: &Path,
    args: &BatchArgs,
    service: Option<&TaxFormService>,
    processor: &DocumentProcessor,
) -> anyhow::Result<(Value, usize)> {
    let raw = if is_saved_analysis(path) {
        read_analysis(path)?
    } else {
        let service = service.ok_or_else(|| anyhow::anyhow!("Provider is not configured"))?;
        let data = fs::read(path)?;
        service.analyze(&data, args.doc_type).await?
    };

    let result = processor.process(&raw, args.doc_type);
    let warnings = result.warnings.len();
    let output = shape_record(result.record, args.doc_type, args.raw)?;
    Ok((output, warnings))
}

/// Identity columns for the summary: the person the form is about.
fn summary_keys(doc_type: DocumentType) -> (&'static str, &'static str, &'static str) {
    match doc_type {
        DocumentType::W2 => ("employeeName", "employeeSSN", "wages"),
        DocumentType::Form1099Int => ("recipientName", "recipientTIN", "interestIncome"),
        DocumentType::Form1099Div => ("recipientName", "recipientTIN", "totalOrdinaryDividends"),
        DocumentType::Form1099Misc => ("recipientName", "recipientTIN", "otherIncome"),
        DocumentType::Form1099Nec => ("recipientName", "recipientTIN", "nonemployeeCompensation"),
        DocumentType::Other => ("", "", ""),
    }
}

fn write_summary(path: &Path, doc_type: DocumentType, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    let (name_key, id_key, amount_key) = summary_keys(doc_type);

    wtr.write_record([
        "filename",
        "status",
        "document_type",
        "name",
        "tax_id",
        "amount",
        "fields",
        "warnings",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result.path.file_name().and_then(|s| s.to_str()).unwrap_or("");
        let time = result.processing_time_ms.to_string();

        if let Some(output) = &result.output {
            let get = |key: &str| output.get(key).map(cell).unwrap_or_default();
            let field_count = output.as_object().map_or(0, |o| o.len());

            wtr.write_record([
                filename,
                "success",
                doc_type.as_str(),
                &get(name_key),
                &get(id_key),
                &get(amount_key),
                &field_count.to_string(),
                &result.warnings.to_string(),
                &time,
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                doc_type.as_str(),
                "",
                "",
                "",
                "",
                "",
                &time,
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
