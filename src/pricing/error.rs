use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("pricing configuration not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("malformed pricing configuration ({source_name}): {reason}")]
    Malformed { source_name: String, reason: String },

    #[error("model not found: {0}")]
    ModelNotFound(String),
}

impl PricingError {
    pub(crate) fn malformed(source_name: impl Into<String>, reason: impl ToString) -> Self {
        PricingError::Malformed { source_name: source_name.into(), reason: reason.to_string() }
    }
}
