//! Cache command implementation

use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use super::utils::{format_age, open_catalog};
use crate::config::Settings;
use crate::pricing::CacheStatus;

#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    action: CacheAction,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show where the cache lives and whether it is still valid
    Info,
    /// Delete the cache file
    Clear,
    /// Reload the catalog from its source and rewrite the cache
    Refresh,
}

pub fn run(args: CacheArgs, settings: &Settings) -> Result<()> {
    let Some(cache) = settings.price_cache() else {
        bail!("The price cache is disabled (enable_price_cache = false)");
    };

    match args.action {
        CacheAction::Info => {
            let info = cache.info();
            println!("Path: {}", cache.path().display());
            println!("Validity: {}h", cache.validity().num_hours());
            println!("Exists: {}", info.exists);
            if info.exists {
                println!("Valid: {}", info.valid);
                println!("Size: {} bytes", info.size_bytes);
            }
            if let Some(timestamp) = info.timestamp {
                println!("Written: {}", timestamp.to_rfc3339());
            }
            if let Some(age) = info.age {
                println!("Age: {}", format_age(age));
            }
        }
        CacheAction::Clear => {
            if !cache.clear() {
                bail!("Failed to remove {}", cache.path().display());
            }
            println!("Cleared {}", cache.path().display());
        }
        CacheAction::Refresh => {
            let loaded = open_catalog(settings, true)?;
            if loaded.cache_status != CacheStatus::Written {
                bail!(
                    "Catalog loaded but the cache could not be written to {}",
                    cache.path().display()
                );
            }
            println!("Cached {} models at {}", loaded.catalog.len(), cache.path().display());
        }
    }
    Ok(())
}
