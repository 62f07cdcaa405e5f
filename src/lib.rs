//! Token counting and cost comparison for LLM API workloads.
//!
//! The pipeline runs ingestion → [`tokens::TokenCounter`] per file → summed
//! input tokens → output projection → [`pricing::CostEstimator`] against a
//! [`pricing::PriceCatalog`] → ascending cost ranking.

pub mod cli;
pub mod config;
pub mod domain;
pub mod ingest;
pub mod pipeline;
pub mod pricing;
pub mod render;
pub mod tokens;
pub mod utils;
