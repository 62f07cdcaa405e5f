//! Combined CSV report: file rows, totals and cost rows in one sheet, told
//! apart by a leading section column.

use super::csv::CsvWriter;
use crate::pipeline::Comparison;
use crate::utils::format_with_commas;
use chrono::Utc;

pub const SECTION_FILE: &str = "file";
pub const SECTION_TOTAL: &str = "total";
pub const SECTION_COST: &str = "cost";
pub const SECTION_META: &str = "meta";

pub fn render_combined(comparison: &Comparison, include_timestamp: bool) -> String {
    let summary = &comparison.summary;
    let mut csv = CsvWriter::new();
    csv.row(["section", "item", "value", "detail"]);

    for file in &summary.files {
        let detail = match &file.tokens.error {
            Some(error) => format!("{} | {:.2} MB | {}", file.file_type, file.file_size_mb, error),
            None => format!("{} | {:.2} MB", file.file_type, file.file_size_mb),
        };
        csv.row([
            SECTION_FILE.to_string(),
            file.file_name.clone(),
            format!("{} tokens", format_with_commas(file.tokens.count)),
            detail,
        ]);
    }

    let input = format_with_commas(summary.total_input_tokens);
    let output = format_with_commas(summary.estimated_output_tokens);
    let total = format_with_commas(summary.total_tokens());
    let policy = summary.policy.to_string();
    csv.row([SECTION_TOTAL, "Total input tokens", input.as_str(), ""]);
    csv.row([SECTION_TOTAL, "Estimated output tokens", output.as_str(), policy.as_str()]);
    csv.row([SECTION_TOTAL, "Total tokens", total.as_str(), ""]);
    csv.row(["", "", "", ""]);

    for estimate in &comparison.estimates {
        csv.row([
            SECTION_COST.to_string(),
            estimate.model.display_name.clone(),
            format!("${:.6}", estimate.total_cost()),
            format!("input: ${:.6} | output: ${:.6}", estimate.input_cost, estimate.output_cost),
        ]);
    }

    csv.row(["", "", "", ""]);
    if include_timestamp {
        csv.row([
            SECTION_META.to_string(),
            "Generated at".to_string(),
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            String::new(),
        ]);
    }
    csv.row([SECTION_META, "Tool", "llm-cost", env!("CARGO_PKG_VERSION")]);
    csv.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::test_support::sample_comparison;

    #[test]
    fn sections_in_order() {
        let csv = render_combined(&sample_comparison(), false);
        let sections: Vec<&str> =
            csv.lines().skip(1).map(|line| line.split(',').next().unwrap_or("")).collect();
        assert_eq!(
            sections,
            vec!["file", "file", "total", "total", "total", "", "cost", "cost", "", "meta"]
        );
    }

    #[test]
    fn values_are_formatted() {
        let csv = render_combined(&sample_comparison(), false);
        assert!(csv.contains("file,a.txt,\"1,000 tokens\",text | 0.00 MB\n"));
        assert!(csv.contains("total,Total input tokens,\"1,000\",\n"));
        assert!(csv.contains("total,Estimated output tokens,500,1 page\n"));
        assert!(csv.contains("cost,GPT-4,$0.060000,input: $0.030000 | output: $0.030000\n"));
        assert!(!csv.contains("Generated at"));
    }

    #[test]
    fn timestamp_row_is_optional() {
        let csv = render_combined(&sample_comparison(), true);
        assert!(csv.contains("meta,Generated at,"));
    }
}
