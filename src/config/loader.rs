//! Config file discovery and layering

use super::Settings;
use anyhow::{anyhow, bail, Context, Result};
use figment::providers::{Env, Format, Serialized, Toml, Yaml};
use figment::Figment;
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "LLM_COST_";

const CANDIDATES: &[&str] = &["llm-cost.toml", ".llm-cost.toml", "llm-cost.yaml", "llm-cost.yml"];

/// Load and validate settings.
///
/// A file passed explicitly must exist and parse. A discovered file that
/// fails to parse is warned about and skipped, leaving defaults and
/// environment overrides in place.
pub fn load_settings(work_dir: &Path, config_path: Option<&Path>) -> Result<Settings> {
    let config_path_provided = config_path.is_some();

    let config_file = match config_path {
        Some(path) => {
            if !path.is_file() {
                bail!("Config file not found: {}", path.display());
            }
            Some(path.to_path_buf())
        }
        None => discover_config(work_dir),
    };

    let settings = match config_file {
        None => extract(base())?,
        Some(file) => match with_file(base(), &file).and_then(extract) {
            Ok(settings) => settings,
            Err(e) if config_path_provided => return Err(e),
            Err(e) => {
                tracing::warn!("Ignoring auto-discovered config {}: {:#}", file.display(), e);
                extract(base())?
            }
        },
    };

    settings.validate()?;
    tracing::debug!("Loaded settings: {:?}", settings);
    Ok(settings)
}

fn base() -> Figment {
    Figment::from(Serialized::defaults(Settings::default()))
}

fn with_file(figment: Figment, config_file: &Path) -> Result<Figment> {
    let ext = config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "toml" => Ok(figment.merge(Toml::file(config_file))),
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(config_file))),
        other => Err(anyhow!(
            "Unsupported config extension '.{}' for file {}",
            other,
            config_file.display()
        )),
    }
}

fn extract(figment: Figment) -> Result<Settings> {
    figment.merge(Env::prefixed(ENV_PREFIX)).extract().context("Invalid configuration")
}

fn discover_config(work_dir: &Path) -> Option<PathBuf> {
    CANDIDATES.iter().map(|candidate| work_dir.join(candidate)).find(|path| path.is_file())
}
