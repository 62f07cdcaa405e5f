//! Models command implementation

use anyhow::{bail, Result};
use clap::Args;

use super::utils::open_catalog;
use crate::config::Settings;

#[derive(Args)]
pub struct ModelsArgs {
    /// Only list this provider's models
    #[arg(short, long, value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Print the listing as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ModelsArgs, settings: &Settings) -> Result<()> {
    let catalog = open_catalog(settings, false)?.catalog;

    let mut models = match &args.provider {
        Some(provider) => {
            if !catalog.providers().contains(&provider.as_str()) {
                bail!(
                    "Unknown provider '{}'. Known providers: {}",
                    provider,
                    catalog.providers().join(", ")
                );
            }
            catalog.models_by_provider(provider)
        }
        None => catalog.all_models(),
    };
    models.sort_by(|a, b| a.provider.cmp(&b.provider).then_with(|| a.model_id.cmp(&b.model_id)));

    if args.json {
        let listing: Vec<_> = models.iter().map(|m| m.as_ref()).collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!(
        "{:<12} {:<28} {:>12} {:>12} {:>10}  FLAGS",
        "PROVIDER", "MODEL", "IN $/1K", "OUT $/1K", "CONTEXT"
    );
    for model in &models {
        let mut flags = Vec::new();
        if model.vision_capable {
            flags.push("vision");
        }
        if model.online_search {
            flags.push("search");
        }
        if model.has_long_context_pricing() {
            flags.push("long-context");
        }
        println!(
            "{:<12} {:<28} {:>12} {:>12} {:>10}  {}",
            model.provider,
            model.model_id,
            model.input_price_per_1k,
            model.output_price_per_1k,
            model.context_window,
            flags.join(",")
        );
    }
    println!("{} models", models.len());
    Ok(())
}
