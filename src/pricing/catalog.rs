//! Declarative model price table.
//!
//! The source is a nested mapping:
//!
//! ```yaml
//! providers:
//!   openai:
//!     name: OpenAI
//!     models:
//!       gpt-4:
//!         name: GPT-4
//!         input_price: 0.03      # USD per 1K tokens
//!         output_price: 0.06
//!         context_window: 8192
//!         vision_capable: false
//! ```
//!
//! Every model is reachable as `provider:model` and as the bare `model` id.
//! Providers register in sorted order, so when two providers publish the same
//! bare id the alphabetically later provider owns the bare key.

use super::error::PricingError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// `config/models.yaml` as of the build.
pub const BUNDLED_CATALOG: &str = include_str!("../../config/models.yaml");

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogDocument {
    providers: BTreeMap<String, ProviderEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProviderEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    models: BTreeMap<String, ModelEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    input_price: f64,
    output_price: f64,
    context_window: u64,
    #[serde(default)]
    vision_capable: bool,
    #[serde(default)]
    online_search: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    input_price_long: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output_price_long: Option<f64>,
}

/// Unit prices for one model, in USD per 1K tokens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelPricing {
    pub provider: String,
    pub model_id: String,
    pub display_name: String,
    pub input_price_per_1k: f64,
    pub output_price_per_1k: f64,
    pub context_window: u64,
    pub vision_capable: bool,
    pub online_search: bool,
    pub long_context_input_price: Option<f64>,
    pub long_context_output_price: Option<f64>,
}

impl ModelPricing {
    pub fn qualified_id(&self) -> String {
        format!("{}:{}", self.provider, self.model_id)
    }

    pub fn has_long_context_pricing(&self) -> bool {
        self.long_context_input_price.is_some()
    }
}

/// Loaded price table with a provider→model index and a bare-id index that
/// share the same entries.
#[derive(Debug, Clone)]
pub struct PriceCatalog {
    document: CatalogDocument,
    by_provider: BTreeMap<String, BTreeMap<String, Arc<ModelPricing>>>,
    by_model: BTreeMap<String, Arc<ModelPricing>>,
}

impl PriceCatalog {
    /// Load a catalog file. The format follows the extension: `.yaml`/`.yml`
    /// (default), `.json` or `.toml`.
    pub fn load(path: &Path) -> Result<Self, PricingError> {
        if !path.exists() {
            return Err(PricingError::MissingFile(path.to_path_buf()));
        }
        let source_name = path.display().to_string();
        let content = fs::read_to_string(path)
            .map_err(|e| PricingError::malformed(&source_name, format!("read failed: {}", e)))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
        let raw: Value = match ext.as_str() {
            "json" => serde_json::from_str(&content)
                .map_err(|e| PricingError::malformed(&source_name, e))?,
            "toml" => {
                toml::from_str(&content).map_err(|e| PricingError::malformed(&source_name, e))?
            }
            _ => serde_yaml::from_str(&content)
                .map_err(|e| PricingError::malformed(&source_name, e))?,
        };

        Self::build(raw, &source_name)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, PricingError> {
        Self::parse_yaml(content, "<inline>")
    }

    /// The price table compiled into the binary.
    pub fn bundled() -> Result<Self, PricingError> {
        Self::parse_yaml(BUNDLED_CATALOG, "<built-in>")
    }

    fn parse_yaml(content: &str, source_name: &str) -> Result<Self, PricingError> {
        let raw: Value =
            serde_yaml::from_str(content).map_err(|e| PricingError::malformed(source_name, e))?;
        Self::build(raw, source_name)
    }

    /// Build from an already-parsed document, e.g. a cached payload.
    pub fn from_value(value: Value) -> Result<Self, PricingError> {
        Self::build(value, "<value>")
    }

    fn build(raw: Value, source_name: &str) -> Result<Self, PricingError> {
        let document: CatalogDocument =
            serde_json::from_value(raw).map_err(|e| PricingError::malformed(source_name, e))?;

        let mut by_provider: BTreeMap<String, BTreeMap<String, Arc<ModelPricing>>> =
            BTreeMap::new();
        let mut by_model: BTreeMap<String, Arc<ModelPricing>> = BTreeMap::new();

        for (provider_id, provider) in &document.providers {
            let models = by_provider.entry(provider_id.clone()).or_default();
            for (model_id, entry) in &provider.models {
                validate_entry(provider_id, model_id, entry)
                    .map_err(|reason| PricingError::malformed(source_name, reason))?;

                let pricing = Arc::new(ModelPricing {
                    provider: provider_id.clone(),
                    model_id: model_id.clone(),
                    display_name: entry.name.clone().unwrap_or_else(|| model_id.clone()),
                    input_price_per_1k: entry.input_price,
                    output_price_per_1k: entry.output_price,
                    context_window: entry.context_window,
                    vision_capable: entry.vision_capable,
                    online_search: entry.online_search,
                    long_context_input_price: entry.input_price_long,
                    long_context_output_price: entry.output_price_long,
                });

                models.insert(model_id.clone(), Arc::clone(&pricing));
                if let Some(previous) = by_model.insert(model_id.clone(), pricing) {
                    tracing::warn!(
                        "Model id '{}' is published by '{}' and '{}'; bare key now resolves to '{}'",
                        model_id,
                        previous.provider,
                        provider_id,
                        provider_id
                    );
                }
            }
        }

        tracing::debug!(
            "Loaded price catalog from {}: {} providers, {} models",
            source_name,
            by_provider.len(),
            by_model.len()
        );

        Ok(Self { document, by_provider, by_model })
    }

    /// Resolve `provider:model` or a bare model id.
    pub fn lookup(&self, key: &str) -> Option<&Arc<ModelPricing>> {
        let key = key.trim();
        if let Some((provider, model_id)) = key.split_once(':') {
            if let Some(found) = self.by_provider.get(provider).and_then(|m| m.get(model_id)) {
                return Some(found);
            }
        }
        self.by_model.get(key)
    }

    /// Every model reachable by its bare id, ordered by id.
    pub fn all_models(&self) -> Vec<Arc<ModelPricing>> {
        self.by_model.values().cloned().collect()
    }

    pub fn models_by_provider(&self, provider: &str) -> Vec<Arc<ModelPricing>> {
        self.by_model.values().filter(|m| m.provider == provider).cloned().collect()
    }

    pub fn providers(&self) -> Vec<&str> {
        self.by_provider.keys().map(String::as_str).collect()
    }

    /// Display name declared for a provider, if any.
    pub fn provider_name(&self, provider: &str) -> Option<&str> {
        self.document.providers.get(provider).and_then(|p| p.name.as_deref())
    }

    pub fn len(&self) -> usize {
        self.by_model.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_model.is_empty()
    }

    /// The normalized source document, suitable for caching.
    pub fn document(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(&self.document)
    }
}

fn validate_entry(provider_id: &str, model_id: &str, entry: &ModelEntry) -> Result<(), String> {
    let prices = [
        ("input_price", Some(entry.input_price)),
        ("output_price", Some(entry.output_price)),
        ("input_price_long", entry.input_price_long),
        ("output_price_long", entry.output_price_long),
    ];
    for (field, value) in prices {
        if let Some(price) = value {
            if !price.is_finite() || price < 0.0 {
                return Err(format!(
                    "{}:{} has invalid {} {}",
                    provider_id, model_id, field, price
                ));
            }
        }
    }
    if entry.context_window == 0 {
        return Err(format!("{}:{} must declare a positive context_window", provider_id, model_id));
    }
    Ok(())
}
