//! Structured JSON cost report.

use crate::pipeline::Comparison;
use crate::utils::round_to;
use anyhow::Result;
use chrono::Utc;
use serde_json::{json, Map, Value};

pub const REPORT_SCHEMA_VERSION: &str = "1.0";

const MONEY_PLACES: u32 = 6;

pub fn build_report(comparison: &Comparison, include_timestamp: bool) -> Result<Value> {
    let summary = &comparison.summary;

    let mut metadata = Map::new();
    metadata.insert("schema_version".to_string(), json!(REPORT_SCHEMA_VERSION));
    if include_timestamp {
        metadata.insert(
            "generated_at".to_string(),
            Value::String(Utc::now().format("%Y-%m-%dT%H:%M:%S+00:00").to_string()),
        );
    }
    metadata.insert("tool".to_string(), json!("llm-cost"));
    metadata.insert("version".to_string(), json!(env!("CARGO_PKG_VERSION")));

    let items = summary
        .files
        .iter()
        .map(|file| {
            let mut item = Map::new();
            item.insert("file_name".to_string(), json!(file.file_name));
            item.insert("file_type".to_string(), json!(file.file_type));
            item.insert("file_size_mb".to_string(), json!(file.file_size_mb));
            item.insert("token_count".to_string(), json!(file.tokens.count));
            item.insert("character_count".to_string(), json!(file.character_count));
            if let Some(openai) = file.tokens.metadata.get("openai_tokens") {
                item.insert(
                    "image_tokens".to_string(),
                    json!({
                        "openai": openai,
                        "anthropic": file.tokens.metadata.get("anthropic_tokens"),
                        "google": file.tokens.metadata.get("google_tokens"),
                    }),
                );
            }
            if let Some(error) = &file.tokens.error {
                item.insert("error".to_string(), json!(error));
            }
            Value::Object(item)
        })
        .collect::<Vec<_>>();

    let all_models = comparison
        .estimates
        .iter()
        .map(|estimate| {
            let model = &estimate.model;
            json!({
                "provider": model.provider,
                "model_name": model.display_name,
                "model_id": model.model_id,
                "pricing": {
                    "input_price_per_1k": model.input_price_per_1k,
                    "output_price_per_1k": model.output_price_per_1k,
                    "long_context": estimate.long_context,
                },
                "tokens": {
                    "input": estimate.input_tokens,
                    "output": estimate.output_tokens,
                },
                "costs": {
                    "input": money(estimate.input_cost),
                    "output": money(estimate.output_cost),
                    "total": money(estimate.total_cost()),
                },
                "model_info": {
                    "context_window": model.context_window,
                    "fits_context_window": estimate.fits_context_window(),
                    "vision_capable": model.vision_capable,
                    "online_search": model.online_search,
                },
            })
        })
        .collect::<Vec<_>>();

    let cheapest_model = comparison.cheapest().map(|cheapest| {
        json!({
            "model_name": cheapest.model.display_name,
            "model_id": cheapest.model.model_id,
            "provider": cheapest.model.provider,
            "total_cost": money(cheapest.total_cost()),
        })
    });

    let mut report = Map::new();
    report.insert("metadata".to_string(), Value::Object(metadata));
    report.insert("files".to_string(), json!({ "count": items.len(), "items": items }));
    report.insert(
        "tokens".to_string(),
        json!({
            "total_input_tokens": summary.total_input_tokens,
            "estimated_output_tokens": summary.estimated_output_tokens,
            "output_policy": serde_json::to_value(summary.policy)?,
            "total_tokens": summary.total_tokens(),
        }),
    );
    report.insert(
        "costs".to_string(),
        json!({
            "models_compared": all_models.len(),
            "cheapest_model": cheapest_model,
            "all_models": all_models,
        }),
    );
    Ok(Value::Object(report))
}

pub fn render_report(comparison: &Comparison, include_timestamp: bool) -> Result<String> {
    Ok(serde_json::to_string_pretty(&build_report(comparison, include_timestamp)?)?)
}

fn money(value: f64) -> f64 {
    round_to(value, MONEY_PLACES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::test_support::sample_comparison;
    use similar_asserts::assert_eq;

    #[test]
    fn cheapest_is_first_ranked_model() {
        let report = build_report(&sample_comparison(), false).expect("report");
        let costs = &report["costs"];
        assert_eq!(costs["models_compared"], json!(2));
        assert_eq!(costs["cheapest_model"]["model_id"], costs["all_models"][0]["model_id"]);
        assert_eq!(costs["cheapest_model"]["model_id"], json!("claude-3-haiku"));
        assert_eq!(costs["cheapest_model"]["total_cost"], json!(0.000875));
    }

    #[test]
    fn tokens_and_files_groups() {
        let report = build_report(&sample_comparison(), false).expect("report");
        assert_eq!(
            report["tokens"],
            json!({
                "total_input_tokens": 1000,
                "estimated_output_tokens": 500,
                "output_policy": {"mode": "pages", "value": 1},
                "total_tokens": 1500,
            })
        );
        assert_eq!(report["files"]["count"], json!(2));
        assert_eq!(
            report["files"]["items"][1]["error"],
            json!("file processing failed: encrypted PDF")
        );
        assert!(report["metadata"].get("generated_at").is_none());
    }

    #[test]
    fn money_is_rounded_at_the_boundary() {
        let report = build_report(&sample_comparison(), true).expect("report");
        let gpt4 = &report["costs"]["all_models"][1];
        assert_eq!(gpt4["costs"], json!({"input": 0.03, "output": 0.03, "total": 0.06}));
        assert_eq!(gpt4["model_info"]["fits_context_window"], json!(true));
        assert!(report["metadata"]["generated_at"].is_string());
    }

    #[test]
    fn empty_comparison_has_null_cheapest() {
        let mut comparison = sample_comparison();
        comparison.estimates.clear();
        let report = build_report(&comparison, false).expect("report");
        assert!(report["costs"]["cheapest_model"].is_null());
        assert_eq!(report["costs"]["all_models"], json!([]));
    }
}
