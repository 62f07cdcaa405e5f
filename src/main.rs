//! llm-cost: estimate what a batch of documents costs across LLM APIs
//!
//! Counts tokens per file (BPE for text, resolution heuristics for images),
//! projects output volume and ranks models by total cost.

use anyhow::Result;

fn main() -> Result<()> {
    llm_cost::cli::run()
}
