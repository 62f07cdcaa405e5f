//! Core data types shared by ingestion, token counting and cost estimation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Open metadata map attached to files and token counts.
pub type Metadata = BTreeMap<String, Value>;

/// Supported upload categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Text,
    Pdf,
    Excel,
    Word,
    Image,
}

impl FileType {
    /// Classify a path by extension. Unknown extensions are treated as text.
    pub fn from_path(path: &Path) -> Self {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => FileType::Pdf,
            "xlsx" | "xlsm" | "xls" | "csv" => FileType::Excel,
            "docx" | "docm" => FileType::Word,
            "png" | "jpg" | "jpeg" | "gif" | "webp" => FileType::Image,
            _ => FileType::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Text => "text",
            FileType::Pdf => "pdf",
            FileType::Excel => "excel",
            FileType::Word => "word",
            FileType::Image => "image",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file after ingestion: decoded text (or an image label) plus metadata.
///
/// When `error` is set the content is empty and the file contributes zero
/// tokens to a batch.
#[derive(Debug, Clone)]
pub struct ProcessedFile {
    pub file_path: PathBuf,
    pub file_type: FileType,
    pub content: String,
    pub metadata: Metadata,
    pub error: Option<String>,
}

impl ProcessedFile {
    pub fn new(
        file_path: PathBuf,
        file_type: FileType,
        content: String,
        metadata: Metadata,
    ) -> Self {
        Self { file_path, file_type, content, metadata, error: None }
    }

    pub fn failed(
        file_path: PathBuf,
        file_type: FileType,
        metadata: Metadata,
        error: impl Into<String>,
    ) -> Self {
        Self { file_path, file_type, content: String::new(), metadata, error: Some(error.into()) }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Display name: the `file_name` metadata entry, falling back to the path.
    pub fn file_name(&self) -> String {
        match self.metadata.get("file_name").and_then(Value::as_str) {
            Some(name) => name.to_string(),
            None => self
                .file_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("Unknown")
                .to_string(),
        }
    }

    pub fn file_size_mb(&self) -> f64 {
        self.metadata.get("file_size_mb").and_then(Value::as_f64).unwrap_or(0.0)
    }

    /// Read a non-negative integer metadata entry such as `width`.
    pub fn metadata_u32(&self, key: &str) -> Option<u32> {
        self.metadata.get(key).and_then(Value::as_u64).and_then(|v| u32::try_from(v).ok())
    }
}

/// Result of one tokenization call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenCount {
    pub source_text: String,
    pub count: u64,
    pub model_name: String,
    pub encoding_name: Option<String>,
    pub metadata: Metadata,
    pub error: Option<String>,
}

impl TokenCount {
    pub fn success(
        source_text: impl Into<String>,
        count: u64,
        model_name: impl Into<String>,
        encoding_name: Option<String>,
        metadata: Metadata,
    ) -> Self {
        Self {
            source_text: source_text.into(),
            count,
            model_name: model_name.into(),
            encoding_name,
            metadata,
            error: None,
        }
    }

    /// A failed count always carries zero tokens.
    pub fn failure(
        source_text: impl Into<String>,
        model_name: impl Into<String>,
        encoding_name: Option<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            source_text: source_text.into(),
            count: 0,
            model_name: model_name.into(),
            encoding_name,
            metadata: Metadata::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn chars_per_token(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.source_text.chars().count() as f64 / self.count as f64
    }

    pub fn metadata_u64(&self, key: &str) -> u64 {
        self.metadata.get(key).and_then(Value::as_u64).unwrap_or(0)
    }
}

/// One chat-style message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self { role: role.into(), content: content.into() }
    }
}
