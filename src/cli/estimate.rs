//! Estimate command implementation

use anyhow::{bail, Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;

use super::utils::{open_catalog, parse_csv};
use crate::config::Settings;
use crate::ingest::{collect_paths, Ingestor};
use crate::pipeline::{BatchSummary, Comparison, OutputPolicy};
use crate::render::{render, OutputFormat};
use crate::tokens::{ImageDetail, TokenCounter};

#[derive(Args)]
pub struct EstimateArgs {
    /// Files or directories to estimate
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Models to compare (comma-separated, `model` or `provider:model`)
    #[arg(short, long, value_name = "MODELS")]
    pub models: Option<String>,

    /// Model whose tokenizer counts the input
    #[arg(long, value_name = "MODEL")]
    pub tokenizer_model: Option<String>,

    /// Expected output as a fraction of input tokens
    #[arg(long, value_name = "RATIO", conflicts_with = "output_pages")]
    pub output_ratio: Option<f64>,

    /// Expected output as a number of pages (500 tokens each)
    #[arg(long, value_name = "PAGES")]
    pub output_pages: Option<u32>,

    /// Use long-context prices where a model defines them
    #[arg(long)]
    pub long_context: bool,

    /// Detail level for tile-billed images (high or low)
    #[arg(long, value_name = "LEVEL")]
    pub image_detail: Option<ImageDetail>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Write the output to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Reload the price catalog from its source, ignoring the cache
    #[arg(long)]
    pub refresh: bool,

    /// Omit generation timestamps from CSV and JSON output
    #[arg(long)]
    pub no_timestamp: bool,
}

pub fn run(args: EstimateArgs, settings: &Settings) -> Result<()> {
    let policy = output_policy(&args, settings)?;

    let files = collect_paths(&args.paths, settings.max_files_count)?;
    let processed = Ingestor::new(settings.max_file_size_bytes()).process_all(&files);

    let tokenizer_model = args.tokenizer_model.as_deref().unwrap_or(&settings.tokenizer_model);
    let counter = TokenCounter::new(tokenizer_model)
        .with_detail(args.image_detail.unwrap_or(settings.image_detail));
    tracing::debug!("Counting with {} ({})", counter.model_name(), counter.encoding());
    let summary = BatchSummary::collect(&counter, &processed, policy);

    let catalog = open_catalog(settings, args.refresh)?.catalog;
    let models = parse_csv(&args.models).unwrap_or_else(|| settings.default_models.clone());
    let (known, unknown): (Vec<String>, Vec<String>) =
        models.into_iter().partition(|key| catalog.lookup(key).is_some());
    for key in &unknown {
        tracing::warn!("Model '{}' is not in the price catalog; skipping", key);
    }
    if known.is_empty() {
        bail!(
            "None of the selected models are in the price catalog ({})",
            settings.catalog_source()
        );
    }

    let comparison = Comparison::run(&catalog, summary, &known, args.long_context);
    let rendered = render(&comparison, args.format, !args.no_timestamp, settings.exchange_rate)?;

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory {}", parent.display())
                    })?;
                }
            }
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{}", rendered),
    }

    let failed = comparison.summary.failed_files().count();
    if failed > 0 {
        tracing::warn!(
            "{} of {} files could not be counted",
            failed,
            comparison.summary.files.len()
        );
    }
    Ok(())
}

fn output_policy(args: &EstimateArgs, settings: &Settings) -> Result<OutputPolicy> {
    match (args.output_ratio, args.output_pages) {
        (Some(ratio), _) if !ratio.is_finite() || ratio < 0.0 => {
            bail!("--output-ratio must be a non-negative number, got {}", ratio)
        }
        (Some(ratio), _) => Ok(OutputPolicy::Ratio(ratio)),
        (None, Some(pages)) => Ok(OutputPolicy::Pages(pages)),
        (None, None) => Ok(settings.output_policy()),
    }
}
