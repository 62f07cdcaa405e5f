//! Shared CLI utilities.

use crate::config::Settings;
use crate::pricing::{load_catalog, LoadedCatalog};
use anyhow::{Context, Result};
use chrono::Duration;

/// Parse a comma-separated string into a `Vec<String>`, trimming whitespace and
/// discarding empty segments.  Returns `None` when `value` is `None`.
pub fn parse_csv(value: &Option<String>) -> Option<Vec<String>> {
    value.as_ref().map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
    })
}

/// Load the configured catalog through the price cache when it is enabled.
pub fn open_catalog(settings: &Settings, refresh: bool) -> Result<LoadedCatalog> {
    let source = settings.catalog_source();
    let cache = settings.price_cache();
    load_catalog(source, cache.as_ref(), refresh)
        .with_context(|| format!("Failed to load price catalog {}", source))
}

/// `"3h 12m"`, `"45s"`.
pub fn format_age(age: Duration) -> String {
    let seconds = age.num_seconds().max(0);
    let (hours, minutes, secs) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}
