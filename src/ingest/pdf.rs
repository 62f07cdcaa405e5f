//! PDF text extraction.
//!
//! Pages are extracted one at a time and joined under `--- Page N ---`
//! markers. A page that cannot be decoded leaves a placeholder line instead of
//! failing the whole document.

use crate::domain::Metadata;
use crate::utils::round_to;
use anyhow::{bail, Context, Result};
use lopdf::{Dictionary, Document, Object};
use serde_json::json;
use std::fs;
use std::path::Path;

const INFO_FIELDS: [(&str, &[u8]); 5] = [
    ("title", b"Title"),
    ("author", b"Author"),
    ("subject", b"Subject"),
    ("creator", b"Creator"),
    ("producer", b"Producer"),
];

pub fn read_pdf(path: &Path) -> Result<(String, Metadata)> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    read_pdf_from(&bytes).with_context(|| format!("Failed to read PDF {}", path.display()))
}

pub fn read_pdf_from(bytes: &[u8]) -> Result<(String, Metadata)> {
    let document = Document::load_mem(bytes).context("Not a readable PDF document")?;
    let encrypted = document.is_encrypted();
    let pages = document.get_pages();

    let mut sections = Vec::with_capacity(pages.len());
    let mut failed_pages = 0usize;
    for &number in pages.keys() {
        let text = match document.extract_text(&[number]) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!("No text on PDF page {}: {}", number, e);
                failed_pages += 1;
                format!("[text extraction failed on this page: {}]", e)
            }
        };
        sections.push(format!("--- Page {} ---\n{}\n", number, text.trim_end()));
    }

    if encrypted && !pages.is_empty() && failed_pages == pages.len() {
        bail!("encrypted PDF; a password is required");
    }

    let content = sections.join("\n");
    let page_count = pages.len();

    let mut metadata = Metadata::new();
    metadata.insert("page_count".into(), json!(page_count));
    metadata.insert("is_encrypted".into(), json!(encrypted));
    if failed_pages > 0 {
        metadata.insert("failed_page_count".into(), json!(failed_pages));
    }
    let average = match page_count {
        0 => 0.0,
        n => round_to(content.chars().count() as f64 / n as f64, 2),
    };
    metadata.insert("average_chars_per_page".into(), json!(average));

    if let Some(info) = info_dictionary(&document) {
        for (key, field) in INFO_FIELDS {
            if let Some(value) = info.get(field).ok().and_then(text_string) {
                if !value.is_empty() {
                    metadata.insert(key.into(), json!(value));
                }
            }
        }
    }

    Ok((content, metadata))
}

fn info_dictionary(document: &Document) -> Option<&Dictionary> {
    match document.trailer.get(b"Info").ok()? {
        Object::Reference(id) => document.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// PDF text strings are UTF-16BE with a BOM, or PDFDocEncoding, which agrees
/// with Latin-1 for printable text.
fn text_string(object: &Object) -> Option<String> {
    let Object::String(bytes, _) = object else {
        return None;
    };
    let decoded = match bytes.strip_prefix(&[0xFE, 0xFF]) {
        Some(utf16) => encoding_rs::UTF_16BE.decode_without_bom_handling(utf16).0.into_owned(),
        None => bytes.iter().map(|&b| b as char).collect(),
    };
    Some(decoded.trim().to_string())
}


#[cfg(test)]
mod tests {
    use super::test_support::sample_pdf;
    use super::*;

    #[test]
    fn pages_are_marked_and_counted() {
        let bytes = sample_pdf(&["Hello from page one", "Goodbye from page two"], "Quarterly");
        let (content, metadata) = read_pdf_from(&bytes).expect("pdf");

        assert!(content.starts_with("--- Page 1 ---\n"));
        assert!(content.contains("--- Page 2 ---\n"));
        assert!(content.contains("page one"));
        assert!(content.contains("page two"));
        let first = content.find("page one").expect("page one");
        let second = content.find("--- Page 2 ---").expect("marker");
        assert!(first < second);

        assert_eq!(metadata["page_count"], json!(2));
        assert_eq!(metadata["is_encrypted"], json!(false));
        assert_eq!(metadata["title"], json!("Quarterly"));
        assert!(!metadata.contains_key("failed_page_count"));
        assert!(metadata["average_chars_per_page"].as_f64().expect("average") > 0.0);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(read_pdf_from(b"%PDF-1.4 not really").is_err());
        assert!(read_pdf_from(b"").is_err());
    }

    #[test]
    fn utf16_info_strings() {
        let object =
            Object::String(vec![0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69], lopdf::StringFormat::Literal);
        assert_eq!(text_string(&object).as_deref(), Some("Hi"));
        let latin = Object::String(b"Caf\xe9".to_vec(), lopdf::StringFormat::Literal);
        assert_eq!(text_string(&latin).as_deref(), Some("Café"));
        assert_eq!(text_string(&Object::Integer(3)), None);
    }
}
