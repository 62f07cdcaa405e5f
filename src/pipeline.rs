//! Batch aggregation: per-file counts → input total → output projection →
//! ranked comparison.

use crate::domain::{FileType, ProcessedFile, TokenCount};
use crate::pricing::{CostEstimate, CostEstimator, PriceCatalog};
use crate::tokens::TokenCounter;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tokens produced per page of output under the page policy.
pub const TOKENS_PER_PAGE: u64 = 500;

/// How expected output tokens are derived from the input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode", content = "value")]
pub enum OutputPolicy {
    /// `floor(input * ratio)`
    Ratio(f64),
    /// A fixed page budget at [`TOKENS_PER_PAGE`] each.
    Pages(u32),
}

impl OutputPolicy {
    pub fn output_tokens(&self, input_tokens: u64) -> u64 {
        match *self {
            OutputPolicy::Ratio(ratio) => (input_tokens as f64 * ratio.max(0.0)).floor() as u64,
            OutputPolicy::Pages(pages) => pages as u64 * TOKENS_PER_PAGE,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OutputPolicy::Ratio(_) => "ratio",
            OutputPolicy::Pages(_) => "pages",
        }
    }
}

impl fmt::Display for OutputPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputPolicy::Ratio(ratio) => write!(f, "ratio {:.1}", ratio),
            OutputPolicy::Pages(1) => f.write_str("1 page"),
            OutputPolicy::Pages(pages) => write!(f, "{} pages", pages),
        }
    }
}

/// One file's contribution to a batch.
#[derive(Debug, Clone)]
pub struct FileTokens {
    pub file_name: String,
    pub file_type: FileType,
    pub file_size_mb: f64,
    pub character_count: usize,
    pub tokens: TokenCount,
}

#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub files: Vec<FileTokens>,
    pub total_input_tokens: u64,
    pub estimated_output_tokens: u64,
    pub policy: OutputPolicy,
}

impl BatchSummary {
    /// Count every file sequentially. Failed files contribute zero tokens and
    /// stay in the summary with their error.
    pub fn collect(counter: &TokenCounter, files: &[ProcessedFile], policy: OutputPolicy) -> Self {
        let mut rows = Vec::with_capacity(files.len());
        let mut total_input_tokens = 0u64;

        for file in files {
            let tokens = counter.count_file(file);
            if let Some(error) = &tokens.error {
                tracing::warn!("{}: {}", file.file_name(), error);
            }
            total_input_tokens += tokens.count;
            rows.push(FileTokens {
                file_name: file.file_name(),
                file_type: file.file_type,
                file_size_mb: file.file_size_mb(),
                character_count: file.content.chars().count(),
                tokens,
            });
        }

        Self {
            files: rows,
            total_input_tokens,
            estimated_output_tokens: policy.output_tokens(total_input_tokens),
            policy,
        }
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_input_tokens + self.estimated_output_tokens
    }

    pub fn failed_files(&self) -> impl Iterator<Item = &FileTokens> {
        self.files.iter().filter(|f| !f.tokens.is_success())
    }
}

/// A summary priced across a set of models, cheapest first.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub summary: BatchSummary,
    pub estimates: Vec<CostEstimate>,
}

impl Comparison {
    pub fn run<S: AsRef<str>>(
        catalog: &PriceCatalog,
        summary: BatchSummary,
        model_keys: &[S],
        use_long_pricing: bool,
    ) -> Self {
        let estimates = CostEstimator::new(catalog).compare_models_with(
            model_keys,
            summary.total_input_tokens,
            summary.estimated_output_tokens,
            use_long_pricing,
        );
        Self { summary, estimates }
    }

    pub fn cheapest(&self) -> Option<&CostEstimate> {
        crate::pricing::cheapest(&self.estimates)
    }
}
