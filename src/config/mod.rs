//! Application settings
//!
//! Layered with figment: built-in defaults, then an optional config file
//! (discovered in the working directory or passed with `--config`), then
//! `LLM_COST_*` environment variables.

pub mod loader;

pub use loader::{load_settings, ENV_PREFIX};

use crate::pipeline::OutputPolicy;
use crate::pricing::{CatalogSource, PriceCache};
use crate::tokens::ImageDetail;
use crate::utils::paths::default_price_cache_path;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Models preselected when `--models` is not given.
pub const DEFAULT_MODELS: &[&str] = &[
    "gpt-5",
    "gpt-5-mini",
    "gpt-5-nano",
    "claude-4.1-opus",
    "claude-4.1-sonnet",
    "claude-3.5-haiku",
    "gemini-2.5-pro",
    "gemini-2.5-flash",
    "gemini-2.5-flash-lite",
    "sonar-base",
    "sonar-pro",
    "perplexity-max",
];

/// `config/models.yaml`, relative to the working directory.
pub fn default_models_file() -> PathBuf {
    Path::new("config").join("models.yaml")
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Page,
    Ratio,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub models_file: PathBuf,
    pub cache_file: PathBuf,
    pub enable_price_cache: bool,
    pub price_cache_hours: u64,
    pub max_file_size_mb: u64,
    pub max_files_count: usize,
    pub tokenizer_model: String,
    pub image_detail: ImageDetail,
    pub default_models: Vec<String>,
    pub output_mode: OutputMode,
    pub output_ratio: f64,
    pub output_pages: u32,
    /// Local currency units per USD, shown next to USD totals when set.
    pub exchange_rate: Option<f64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            models_file: default_models_file(),
            cache_file: default_price_cache_path(),
            enable_price_cache: true,
            price_cache_hours: 24,
            max_file_size_mb: 50,
            max_files_count: 10,
            tokenizer_model: "gpt-4".to_string(),
            image_detail: ImageDetail::High,
            default_models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            output_mode: OutputMode::Page,
            output_ratio: 0.3,
            output_pages: 5,
            exchange_rate: None,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid { field, reason: reason.into() }
        }

        if self.max_file_size_mb == 0 {
            return Err(invalid("max_file_size_mb", "must be greater than zero"));
        }
        if self.max_files_count == 0 {
            return Err(invalid("max_files_count", "must be greater than zero"));
        }
        if self.price_cache_hours == 0 {
            return Err(invalid("price_cache_hours", "must be greater than zero"));
        }
        if !self.output_ratio.is_finite() || self.output_ratio < 0.0 {
            return Err(invalid("output_ratio", format!("{} is not a ratio", self.output_ratio)));
        }
        if self.tokenizer_model.trim().is_empty() {
            return Err(invalid("tokenizer_model", "must not be empty"));
        }
        if let Some(rate) = self.exchange_rate {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(invalid("exchange_rate", format!("{} is not a positive rate", rate)));
            }
        }
        Ok(())
    }

    /// Create the directories the settings point at. Nothing is created while
    /// settings are loaded.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        if !self.enable_price_cache {
            return Ok(());
        }
        match self.cache_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
                .map_err(|source| ConfigError::CreateDir { path: parent.to_path_buf(), source }),
            _ => Ok(()),
        }
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn output_policy(&self) -> OutputPolicy {
        match self.output_mode {
            OutputMode::Ratio => OutputPolicy::Ratio(self.output_ratio),
            OutputMode::Page => OutputPolicy::Pages(self.output_pages),
        }
    }

    /// The configured catalog file, or the built-in table when the default
    /// path is not present in the working directory.
    pub fn catalog_source(&self) -> CatalogSource<'_> {
        if self.models_file == default_models_file() && !self.models_file.exists() {
            tracing::debug!(
                "{} not found; using the built-in price catalog",
                self.models_file.display()
            );
            CatalogSource::Bundled
        } else {
            CatalogSource::File(&self.models_file)
        }
    }

    pub fn price_cache(&self) -> Option<PriceCache> {
        self.enable_price_cache
            .then(|| PriceCache::new(self.cache_file.clone(), self.price_cache_hours))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().expect("valid");
        assert_eq!(settings.default_models.len(), 12);
        assert_eq!(settings.output_policy(), OutputPolicy::Pages(5));
        assert_eq!(settings.max_file_size_bytes(), 50 * 1024 * 1024);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let cases: Vec<(&str, Settings)> = vec![
            ("max_file_size_mb", Settings { max_file_size_mb: 0, ..Settings::default() }),
            ("max_files_count", Settings { max_files_count: 0, ..Settings::default() }),
            ("price_cache_hours", Settings { price_cache_hours: 0, ..Settings::default() }),
            ("output_ratio", Settings { output_ratio: -0.1, ..Settings::default() }),
            ("output_ratio", Settings { output_ratio: f64::NAN, ..Settings::default() }),
            ("tokenizer_model", Settings { tokenizer_model: " ".into(), ..Settings::default() }),
            ("exchange_rate", Settings { exchange_rate: Some(0.0), ..Settings::default() }),
        ];
        for (expected, settings) in cases {
            match settings.validate() {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
                other => panic!("{expected}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn ratio_mode_uses_ratio() {
        let settings =
            Settings { output_mode: OutputMode::Ratio, output_ratio: 0.5, ..Settings::default() };
        assert_eq!(settings.output_policy(), OutputPolicy::Ratio(0.5));
    }

    #[test]
    fn ensure_directories_creates_cache_parent() {
        let tmp = TempDir::new().expect("tmp");
        let cache_file = tmp.path().join("a").join("b").join("price_cache.json");
        let settings = Settings { cache_file: cache_file.clone(), ..Settings::default() };
        settings.ensure_directories().expect("mkdir");
        assert!(cache_file.parent().expect("parent").is_dir());
        assert!(settings.price_cache().is_some());
    }

    #[test]
    fn disabled_cache_creates_nothing() {
        let tmp = TempDir::new().expect("tmp");
        let cache_file = tmp.path().join("never").join("price_cache.json");
        let settings = Settings {
            cache_file: cache_file.clone(),
            enable_price_cache: false,
            ..Settings::default()
        };
        settings.ensure_directories().expect("noop");
        assert!(!tmp.path().join("never").exists());
        assert!(settings.price_cache().is_none());
    }

    #[test]
    fn missing_custom_catalog_is_not_replaced() {
        let tmp = TempDir::new().expect("tmp");
        let models_file = tmp.path().join("prices.yaml");
        let settings = Settings { models_file: models_file.clone(), ..Settings::default() };
        match settings.catalog_source() {
            CatalogSource::File(path) => assert_eq!(path, models_file.as_path()),
            CatalogSource::Bundled => panic!("custom catalog path fell back to the built-in table"),
        }
    }
}
