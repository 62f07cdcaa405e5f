//! Count command implementation

use anyhow::{anyhow, Result};
use clap::Args;
use std::path::PathBuf;

use crate::config::Settings;
use crate::ingest::Ingestor;
use crate::tokens::{ImageDetail, TokenCounter};

#[derive(Args)]
pub struct CountArgs {
    /// File to count
    #[arg(value_name = "PATH", required_unless_present = "text", conflicts_with = "text")]
    pub path: Option<PathBuf>,

    /// Count this text instead of a file
    #[arg(long, value_name = "TEXT")]
    pub text: Option<String>,

    /// Model whose tokenizer and image convention apply
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Detail level for tile-billed images (high or low)
    #[arg(long, value_name = "LEVEL")]
    pub image_detail: Option<ImageDetail>,
}

/// Print one token count as JSON. A failed count is still printed, then
/// reported as an error.
pub fn run(args: CountArgs, settings: &Settings) -> Result<()> {
    let model = args.model.as_deref().unwrap_or(&settings.tokenizer_model);
    let counter = TokenCounter::new(model)
        .with_detail(args.image_detail.unwrap_or(settings.image_detail));

    let count = match (&args.text, &args.path) {
        (Some(text), _) => counter.count_text(text),
        (None, Some(path)) => {
            let file = Ingestor::new(settings.max_file_size_bytes()).process(path);
            counter.count_file(&file)
        }
        (None, None) => counter.count_optional_text(None),
    };

    println!("{}", serde_json::to_string_pretty(&count)?);
    match count.error {
        Some(error) => Err(anyhow!(error)),
        None => Ok(()),
    }
}
