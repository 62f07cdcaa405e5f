//! End-to-end library tests: ingestion → counting → pricing → rendering.

use llm_cost::config::DEFAULT_MODELS;
use llm_cost::ingest::{collect_paths, Ingestor};
use llm_cost::pipeline::{BatchSummary, Comparison, OutputPolicy};
use llm_cost::pricing::{CostEstimator, PriceCatalog};
use llm_cost::render::build_report;
use llm_cost::tokens::TokenCounter;
use serde_json::json;
use similar_asserts::assert_eq;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn bundled_catalog() -> PriceCatalog {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config").join("models.yaml");
    PriceCatalog::load(&path).expect("bundled catalog")
}

#[test]
fn three_texts_and_an_image() {
    let tmp = TempDir::new().expect("tmp");
    fs::write(tmp.path().join("a.txt"), "Hello, world!").expect("write");
    fs::write(tmp.path().join("b.txt"), "Hello, world! Hello, world!").expect("write");
    fs::write(tmp.path().join("c.md"), "Hello, world!\nHello, world!\nHello, world!")
        .expect("write");
    image::RgbImage::new(1920, 1080).save(tmp.path().join("d.png")).expect("png");

    let paths = collect_paths(&[tmp.path().to_path_buf()], 10).expect("paths");
    assert_eq!(paths.len(), 4);
    let files = Ingestor::new(50 * 1024 * 1024).process_all(&paths);
    assert!(files.iter().all(|f| f.is_success()));

    let counter = TokenCounter::new("gpt-4");
    let summary = BatchSummary::collect(&counter, &files, OutputPolicy::Ratio(0.3));

    let per_file: Vec<u64> = summary.files.iter().map(|f| f.tokens.count).collect();
    assert_eq!(per_file[0], 4);
    let expected_texts: Vec<u64> = [
        "Hello, world!",
        "Hello, world! Hello, world!",
        "Hello, world!\nHello, world!\nHello, world!",
    ]
    .iter()
    .map(|text| counter.count_text(text).count)
    .collect();
    assert_eq!(&per_file[..3], &expected_texts[..]);
    // 1920x1080 under the tile convention: 85 + 4 * 3 * 170.
    assert_eq!(per_file[3], 2125);
    assert_eq!(summary.files[3].tokens.metadata["anthropic_tokens"], json!(6000));

    let input: u64 = per_file.iter().sum();
    assert_eq!(summary.total_input_tokens, input);
    assert_eq!(summary.estimated_output_tokens, (input as f64 * 0.3).floor() as u64);

    let catalog = bundled_catalog();
    let output = summary.estimated_output_tokens;
    let comparison = Comparison::run(&catalog, summary, &["gpt-4", "claude-3-haiku"], false);
    let gpt4 = comparison
        .estimates
        .iter()
        .find(|e| e.model.model_id == "gpt-4")
        .expect("gpt-4 priced");
    let by_hand = input as f64 / 1000.0 * 0.03 + output as f64 / 1000.0 * 0.06;
    assert!((gpt4.total_cost() - by_hand).abs() < 1e-12);
    assert_eq!(comparison.cheapest().map(|e| e.model.model_id.as_str()), Some("claude-3-haiku"));

    let report = build_report(&comparison, false).expect("report");
    assert_eq!(report["tokens"]["total_input_tokens"], json!(input));
    assert_eq!(report["files"]["items"][3]["image_tokens"]["openai"], json!(2125));
}

#[test]
fn bundled_catalog_matches_published_prices() {
    let catalog = bundled_catalog();
    assert!(catalog.all_models().len() >= 20);

    let gpt4 = catalog.lookup("gpt-4").expect("gpt-4");
    assert_eq!(gpt4.provider, "openai");
    assert_eq!(gpt4.input_price_per_1k, 0.03);
    assert_eq!(gpt4.output_price_per_1k, 0.06);
    assert!(Arc::ptr_eq(gpt4, catalog.lookup("openai:gpt-4").expect("qualified")));

    for model in DEFAULT_MODELS {
        assert!(catalog.lookup(model).is_some(), "default model {model} missing");
    }
    for provider in ["openai", "anthropic", "google", "perplexity", "mistral", "cohere"] {
        assert!(!catalog.models_by_provider(provider).is_empty(), "{provider}");
    }
}

#[test]
fn bundled_catalog_costs() {
    let catalog = bundled_catalog();
    let estimator = CostEstimator::new(&catalog);

    let normal = estimator.estimate("gemini-1.5-pro", 1000, 0, false).expect("normal");
    let long = estimator.estimate("gemini-1.5-pro", 1000, 0, true).expect("long");
    assert!(long.input_cost > normal.input_cost);

    let ranked = estimator.compare_models(&["gpt-4", "gpt-4o-mini", "claude-3-haiku"], 1000, 500);
    assert_eq!(ranked.len(), 3);
    assert!(["gpt-4o-mini", "claude-3-haiku"].contains(&ranked[0].model.model_id.as_str()));
}
