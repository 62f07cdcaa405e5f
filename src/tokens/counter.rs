//! Per-file token counting.

use super::encoding::Encoding;
use super::image::{estimate_image_tokens, ImageDetail, ImageEstimates, VendorFamily};
use crate::domain::{ChatMessage, FileType, Metadata, ProcessedFile, TokenCount};
use serde_json::json;

/// Framing cost charged per chat message.
pub const MESSAGE_OVERHEAD_TOKENS: u64 = 4;

/// Counts tokens for one target model.
///
/// Text goes through the BPE encoding mapped from the model name; images go
/// through the resolution heuristics of the vendor family the model name
/// points at.
#[derive(Debug, Clone)]
pub struct TokenCounter {
    model_name: String,
    encoding: Encoding,
    detail: ImageDetail,
}

impl TokenCounter {
    pub fn new(model_name: impl Into<String>) -> Self {
        let model_name = model_name.into();
        let encoding = Encoding::for_model(&model_name);
        Self { model_name, encoding, detail: ImageDetail::High }
    }

    /// Override the encoding picked from the model name.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the detail level used for tile-based image estimates.
    pub fn with_detail(mut self, detail: ImageDetail) -> Self {
        self.detail = detail;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn detail(&self) -> ImageDetail {
        self.detail
    }

    pub fn count_text(&self, text: &str) -> TokenCount {
        let count = self.encoding.count(text);
        let character_count = text.chars().count();

        let mut metadata = Metadata::new();
        metadata.insert("character_count".into(), json!(character_count));
        metadata.insert("word_count".into(), json!(text.split_whitespace().count()));
        let chars_per_token =
            if count > 0 { character_count as f64 / count as f64 } else { 0.0 };
        metadata.insert("chars_per_token".into(), json!(chars_per_token));

        TokenCount::success(
            text,
            count,
            &self.model_name,
            Some(self.encoding.name().to_string()),
            metadata,
        )
    }

    /// Like [`count_text`](Self::count_text), but a missing text is reported
    /// as a failed count instead of a panic or an error.
    pub fn count_optional_text(&self, text: Option<&str>) -> TokenCount {
        match text {
            Some(text) => self.count_text(text),
            None => TokenCount::failure(
                "",
                &self.model_name,
                Some(self.encoding.name().to_string()),
                "text is missing",
            ),
        }
    }

    /// Estimate image tokens for `family`. All three vendor estimates are
    /// attached to the metadata regardless of which one is primary.
    pub fn count_image(
        &self,
        width: Option<u32>,
        height: Option<u32>,
        family: VendorFamily,
    ) -> TokenCount {
        let (width, height) = match (width, height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
            _ => {
                return TokenCount::failure(
                    "",
                    &self.model_name,
                    None,
                    "image dimensions are missing or zero",
                );
            }
        };

        let count = estimate_image_tokens(width, height, family, self.detail);
        let estimates = ImageEstimates::compute(width, height);

        let mut metadata = Metadata::new();
        metadata.insert("width".into(), json!(width));
        metadata.insert("height".into(), json!(height));
        metadata.insert("total_pixels".into(), json!(width as u64 * height as u64));
        metadata.insert("detail".into(), json!(self.detail.as_str()));
        metadata.insert("vendor_family".into(), json!(family.as_str()));
        metadata.insert("openai_tokens".into(), json!(estimates.openai));
        metadata.insert("anthropic_tokens".into(), json!(estimates.anthropic));
        metadata.insert("google_tokens".into(), json!(estimates.google));

        TokenCount::success(
            format!("Image: {}x{} pixels", width, height),
            count,
            &self.model_name,
            Some(format!("image-{}", self.detail)),
            metadata,
        )
    }

    /// Count a chat transcript: `"role: content\n"` per message plus a fixed
    /// per-message overhead.
    pub fn count_messages(&self, messages: &[ChatMessage]) -> TokenCount {
        let combined: String = messages
            .iter()
            .map(|m| format!("{}: {}\n", m.role, m.content))
            .collect();

        let mut result = self.count_text(&combined);
        let overhead = messages.len() as u64 * MESSAGE_OVERHEAD_TOKENS;
        result.count += overhead;
        result.metadata.insert("message_count".into(), json!(messages.len()));
        result.metadata.insert("overhead_tokens".into(), json!(overhead));
        result
    }

    /// Count one ingested file. Ingestion failures become zero-count failures
    /// so a batch can keep going.
    pub fn count_file(&self, file: &ProcessedFile) -> TokenCount {
        if let Some(error) = &file.error {
            let mut failed = TokenCount::failure(
                "",
                &self.model_name,
                None,
                format!("file processing failed: {}", error),
            );
            self.annotate_file(&mut failed, file);
            return failed;
        }

        let mut result = match file.file_type {
            FileType::Image => {
                let family = VendorFamily::from_model_name(&self.model_name);
                let mut counted = self.count_image(
                    file.metadata_u32("width"),
                    file.metadata_u32("height"),
                    family,
                );
                if counted.is_success() {
                    counted.source_text = format!("Image: {}", file.file_name());
                }
                counted
            }
            _ => self.count_text(&file.content),
        };
        self.annotate_file(&mut result, file);
        result
    }

    pub fn count_batch(&self, texts: &[&str]) -> Vec<TokenCount> {
        texts.iter().map(|text| self.count_text(text)).collect()
    }

    /// Split text into chunks of roughly `max_tokens`, cutting on sentence
    /// boundaries (`". "`). A single sentence longer than the budget becomes
    /// its own chunk.
    pub fn split_by_tokens(&self, text: &str, max_tokens: u64) -> Vec<String> {
        if self.encoding.count(text) <= max_tokens {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_tokens = 0u64;

        for sentence in text.split(". ") {
            let sentence_tokens = self.encoding.count(sentence);
            if current_tokens + sentence_tokens > max_tokens {
                if current.is_empty() {
                    chunks.push(sentence.to_string());
                    continue;
                }
                chunks.push(current.trim().to_string());
                current = format!("{}. ", sentence);
                current_tokens = sentence_tokens;
            } else {
                current.push_str(sentence);
                current.push_str(". ");
                current_tokens += sentence_tokens;
            }
        }

        if !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
        }
        chunks
    }

    fn annotate_file(&self, result: &mut TokenCount, file: &ProcessedFile) {
        result.metadata.insert("file_name".into(), json!(file.file_name()));
        result.metadata.insert("file_type".into(), json!(file.file_type.as_str()));
        result.metadata.insert("file_size_mb".into(), json!(file.file_size_mb()));
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new("gpt-4")
    }
}

/// Rough character-based estimate, at least one token for non-empty text.
pub fn estimate_tokens_from_chars(text: &str, chars_per_token: f64) -> u64 {
    if text.is_empty() {
        return 0;
    }
    let estimated = (text.chars().count() as f64 / chars_per_token) as u64;
    estimated.max(1)
}
