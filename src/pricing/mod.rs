//! Price catalog, cost estimation and the catalog cache.

pub mod cache;
pub mod catalog;
pub mod error;
pub mod estimator;

pub use cache::{CacheEntry, CacheInfo, PriceCache};
pub use catalog::{ModelPricing, PriceCatalog};
pub use error::PricingError;
pub use estimator::{cheapest, CostEstimate, CostEstimator};

use serde_json::{json, Value};
use std::fmt;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Where the catalog is read from.
#[derive(Debug, Clone, Copy)]
pub enum CatalogSource<'a> {
    File(&'a Path),
    /// The table compiled into the binary.
    Bundled,
}

impl CatalogSource<'_> {
    fn load(&self) -> Result<PriceCatalog, PricingError> {
        match self {
            CatalogSource::File(path) => PriceCatalog::load(path),
            CatalogSource::Bundled => PriceCatalog::bundled(),
        }
    }

    /// Identifies the source revision a cached copy was taken from.
    fn fingerprint(&self) -> Value {
        match self {
            CatalogSource::File(path) => {
                let modified = std::fs::metadata(path)
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map(|d| d.as_millis() as u64);
                json!({
                    "path": path.display().to_string(),
                    "modified_ms": modified,
                })
            }
            CatalogSource::Bundled => json!({ "bundled": env!("CARGO_PKG_VERSION") }),
        }
    }
}

impl fmt::Display for CatalogSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::File(path) => write!(f, "{}", path.display()),
            CatalogSource::Bundled => f.write_str("<built-in>"),
        }
    }
}

/// What happened to the price cache while loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Disabled,
    /// Served from a valid cached copy.
    Hit,
    /// Read from the source and written to the cache.
    Written,
    /// Read from the source, but the cache could not be updated.
    WriteFailed,
}

#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub catalog: PriceCatalog,
    pub cache_status: CacheStatus,
}

/// Load the catalog, preferring a valid cached copy of the same source.
///
/// The cached payload records a fingerprint of the source (path and
/// modification time for files); a cache written for another source or an
/// older revision is ignored. `refresh` skips the cache read but still
/// rewrites it.
pub fn load_catalog(
    source: CatalogSource<'_>,
    cache: Option<&PriceCache>,
    refresh: bool,
) -> Result<LoadedCatalog, PricingError> {
    let fingerprint = source.fingerprint();

    if let (Some(cache), false) = (cache, refresh) {
        if let Some(entry) = cache.load() {
            match cached_catalog(entry.data, &fingerprint) {
                Some(Ok(catalog)) => {
                    tracing::debug!("Using cached price catalog from {}", cache.path().display());
                    return Ok(LoadedCatalog { catalog, cache_status: CacheStatus::Hit });
                }
                Some(Err(e)) => tracing::warn!("Cached price catalog is unusable: {}", e),
                None => tracing::debug!("Price cache was written for a different source"),
            }
        }
    }

    let catalog = source.load()?;

    let cache_status = match cache {
        None => CacheStatus::Disabled,
        Some(cache) => match catalog.document() {
            Ok(document) => {
                if cache.save(&json!({ "source": fingerprint, "catalog": document })) {
                    CacheStatus::Written
                } else {
                    CacheStatus::WriteFailed
                }
            }
            Err(e) => {
                tracing::warn!("Could not serialize price catalog for caching: {}", e);
                CacheStatus::WriteFailed
            }
        },
    };

    Ok(LoadedCatalog { catalog, cache_status })
}

fn cached_catalog(
    mut data: Value,
    fingerprint: &Value,
) -> Option<Result<PriceCatalog, PricingError>> {
    if data.get("source") != Some(fingerprint) {
        return None;
    }
    let document = data.get_mut("catalog").map(Value::take)?;
    Some(PriceCatalog::from_value(document))
}
