//! Output rendering (terminal tables, CSV exports, JSON report)

pub mod combined;
mod csv;
pub mod report;
pub mod table;
pub mod terminal;

pub use combined::render_combined;
pub use report::{build_report, render_report};
pub use table::{render_cost_table, render_file_tokens};
pub use terminal::render_terminal;

use crate::pipeline::Comparison;
use anyhow::Result;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned tables for the terminal
    #[default]
    Table,
    /// One CSV row per model
    Csv,
    /// One CSV row per input file
    Files,
    /// File, total and cost rows in one CSV
    Combined,
    /// Structured JSON report
    Json,
}

pub fn render(
    comparison: &Comparison,
    format: OutputFormat,
    include_timestamp: bool,
    exchange_rate: Option<f64>,
) -> Result<String> {
    Ok(match format {
        OutputFormat::Table => render_terminal(comparison, exchange_rate),
        OutputFormat::Csv => render_cost_table(comparison),
        OutputFormat::Files => render_file_tokens(&comparison.summary),
        OutputFormat::Combined => render_combined(comparison, include_timestamp),
        OutputFormat::Json => render_report(comparison, include_timestamp)?,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::{FileType, Metadata, TokenCount};
    use crate::pipeline::{BatchSummary, Comparison, FileTokens, OutputPolicy};
    use crate::pricing::PriceCatalog;

    const CATALOG: &str = r#"
providers:
  openai:
    models:
      gpt-4: { name: GPT-4, input_price: 0.03, output_price: 0.06, context_window: 8192 }
  anthropic:
    models:
      claude-3-haiku:
        name: Claude 3 Haiku
        input_price: 0.00025
        output_price: 0.00125
        context_window: 200000
        vision_capable: true
"#;

    /// 1000 input tokens, 500 output tokens, priced for gpt-4 and
    /// claude-3-haiku. The second file failed ingestion.
    pub fn sample_comparison() -> Comparison {
        let catalog = PriceCatalog::from_yaml_str(CATALOG).expect("catalog");
        let ok = TokenCount::success(
            "Hello",
            1000,
            "gpt-4",
            Some("cl100k_base".to_string()),
            Metadata::new(),
        );
        let failed =
            TokenCount::failure("", "gpt-4", None, "file processing failed: encrypted PDF");
        let summary = BatchSummary {
            files: vec![
                FileTokens {
                    file_name: "a.txt".to_string(),
                    file_type: FileType::Text,
                    file_size_mb: 0.0,
                    character_count: 5,
                    tokens: ok,
                },
                FileTokens {
                    file_name: "b.pdf".to_string(),
                    file_type: FileType::Pdf,
                    file_size_mb: 0.0,
                    character_count: 0,
                    tokens: failed,
                },
            ],
            total_input_tokens: 1000,
            estimated_output_tokens: 500,
            policy: OutputPolicy::Pages(1),
        };
        Comparison::run(&catalog, summary, &["gpt-4", "claude-3-haiku"], false)
    }
}
