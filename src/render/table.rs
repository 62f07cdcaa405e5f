//! Flat CSV exports: one row per model, or one row per file.

use super::csv::CsvWriter;
use crate::pipeline::{BatchSummary, Comparison};

const COST_HEADERS: &[&str] = &[
    "provider",
    "model_name",
    "model_id",
    "input_tokens",
    "output_tokens",
    "output_policy",
    "input_price_per_1k",
    "output_price_per_1k",
    "input_cost_usd",
    "output_cost_usd",
    "total_cost_usd",
    "context_window",
    "fits_context_window",
    "vision_capable",
    "online_search",
];

const FILE_HEADERS: &[&str] = &[
    "file_name",
    "file_type",
    "file_size_mb",
    "token_count",
    "character_count",
    "openai_image_tokens",
    "anthropic_image_tokens",
    "google_image_tokens",
    "error",
];

/// Per-model comparison, cheapest first.
pub fn render_cost_table(comparison: &Comparison) -> String {
    let mut csv = CsvWriter::new();
    csv.row(COST_HEADERS);

    let policy = comparison.summary.policy.to_string();
    for estimate in &comparison.estimates {
        let model = &estimate.model;
        csv.row([
            model.provider.to_uppercase(),
            model.display_name.clone(),
            model.model_id.clone(),
            estimate.input_tokens.to_string(),
            estimate.output_tokens.to_string(),
            policy.clone(),
            model.input_price_per_1k.to_string(),
            model.output_price_per_1k.to_string(),
            format!("{:.6}", estimate.input_cost),
            format!("{:.6}", estimate.output_cost),
            format!("{:.6}", estimate.total_cost()),
            model.context_window.to_string(),
            yes_no(estimate.fits_context_window()).to_string(),
            yes_no(model.vision_capable).to_string(),
            yes_no(model.online_search).to_string(),
        ]);
    }
    csv.finish()
}

/// Per-file token counts. Image columns are blank for non-image files.
pub fn render_file_tokens(summary: &BatchSummary) -> String {
    let mut csv = CsvWriter::new();
    csv.row(FILE_HEADERS);

    for file in &summary.files {
        let image_column = |key: &str| match file.tokens.metadata.get(key) {
            Some(value) => value.to_string(),
            None => String::new(),
        };
        csv.row([
            file.file_name.clone(),
            file.file_type.to_string(),
            format!("{:.2}", file.file_size_mb),
            file.tokens.count.to_string(),
            file.character_count.to_string(),
            image_column("openai_tokens"),
            image_column("anthropic_tokens"),
            image_column("google_tokens"),
            file.tokens.error.clone().unwrap_or_default(),
        ]);
    }
    csv.finish()
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}
