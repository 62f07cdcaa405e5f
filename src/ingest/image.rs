//! Image headers: dimensions and format, no pixel decoding.

use crate::domain::Metadata;
use crate::tokens::ImageEstimates;
use crate::utils::format_with_commas;
use anyhow::{Context, Result};
use image::ImageReader;
use serde_json::json;
use std::path::Path;

pub fn read_image(path: &Path) -> Result<(String, Metadata)> {
    let reader = ImageReader::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("Failed to sniff image format of {}", path.display()))?;
    let format = reader
        .format()
        .map(|f| format!("{:?}", f).to_uppercase())
        .unwrap_or_else(|| "UNKNOWN".to_string());
    let (width, height) = reader
        .into_dimensions()
        .with_context(|| format!("Failed to read image dimensions of {}", path.display()))?;

    Ok(describe(width, height, &format))
}

/// Metadata and a short text label for an image of the given size.
pub fn describe(width: u32, height: u32, format: &str) -> (String, Metadata) {
    let total_pixels = width as u64 * height as u64;
    let estimates = ImageEstimates::compute(width, height);

    let mut metadata = Metadata::new();
    metadata.insert("width".into(), json!(width));
    metadata.insert("height".into(), json!(height));
    metadata.insert("total_pixels".into(), json!(total_pixels));
    metadata.insert("format".into(), json!(format));
    metadata.insert("openai_tokens".into(), json!(estimates.openai));
    metadata.insert("anthropic_tokens".into(), json!(estimates.anthropic));
    metadata.insert("google_tokens".into(), json!(estimates.google));

    let label = format!(
        "Format: {}\nDimensions: {} x {} pixels\nTotal Pixels: {}",
        format,
        width,
        height,
        format_with_commas(total_pixels)
    );
    (label, metadata)
}
