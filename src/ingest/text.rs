//! Text decoding with an ordered fallback chain.
//!
//! 1. BOM (UTF-8, UTF-16 LE/BE)
//! 2. strict UTF-8
//! 3. chardetng guess decoded through encoding_rs
//! 4. UTF-8 with replacement characters

use crate::domain::Metadata;
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use serde_json::json;

const DETECTION_SAMPLE_SIZE: usize = 64 * 1024;

/// Decode raw bytes, returning the text and the label of the encoding used.
pub fn decode_bytes(bytes: &[u8]) -> (String, String) {
    if bytes.is_empty() {
        return (String::new(), "utf-8".to_string());
    }

    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let label = match encoding {
            e if e == UTF_8 => "utf-8-sig",
            e if e == UTF_16LE => "utf-16-le",
            e if e == UTF_16BE => "utf-16-be",
            e => e.name(),
        };
        let (decoded, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return (decoded.into_owned(), label.to_string());
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return (text.to_string(), "utf-8".to_string());
    }

    let detected = detect_encoding(bytes);
    if detected != UTF_8 {
        let (decoded, had_errors) = detected.decode_without_bom_handling(bytes);
        if !had_errors {
            return (decoded.into_owned(), detected.name().to_lowercase());
        }
        tracing::debug!("Detected {} but decoding had errors", detected.name());
    }

    let (decoded, _, _) = UTF_8.decode(bytes);
    (decoded.into_owned(), "utf-8".to_string())
}

fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    let sample = &bytes[..bytes.len().min(DETECTION_SAMPLE_SIZE)];
    let mut detector = EncodingDetector::new();
    detector.feed(sample, sample.len() == bytes.len());
    detector.guess(None, true)
}

/// Line, character and word counts of decoded text.
pub fn text_metadata(content: &str, metadata: &mut Metadata) {
    metadata.insert("line_count".into(), json!(content.lines().count()));
    metadata.insert("character_count".into(), json!(content.chars().count()));
    metadata.insert("word_count".into(), json!(content.split_whitespace().count()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_passes_through() {
        let (content, encoding) = decode_bytes("Test content 🚀".as_bytes());
        assert_eq!(content, "Test content 🚀");
        assert_eq!(encoding, "utf-8");
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let mut bytes = vec![0xef, 0xbb, 0xbf];
        bytes.extend_from_slice(b"Hello");
        assert_eq!(decode_bytes(&bytes), ("Hello".to_string(), "utf-8-sig".to_string()));
    }

    #[test]
    fn utf16_le_bom() {
        let mut bytes = vec![0xff, 0xfe];
        for unit in "Hi".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_bytes(&bytes), ("Hi".to_string(), "utf-16-le".to_string()));
    }

    #[test]
    fn legacy_single_byte_text_is_decoded() {
        // "café" in windows-1252
        let (content, encoding) = decode_bytes(
            b"Le caf\xe9 est tr\xe8s bon. Il a \xe9t\xe9 pr\xe9par\xe9 \xe0 la fran\xe7aise.",
        );
        assert!(content.starts_with("Le caf"));
        assert!(!content.contains('\u{FFFD}'));
        assert_ne!(encoding, "utf-8-sig");
    }

    #[test]
    fn empty_input() {
        assert_eq!(decode_bytes(&[]), (String::new(), "utf-8".to_string()));
    }

    #[test]
    fn metadata_counts() {
        let mut metadata = Metadata::new();
        text_metadata("one two\nthree\n", &mut metadata);
        assert_eq!(metadata["line_count"], json!(2));
        assert_eq!(metadata["character_count"], json!(14));
        assert_eq!(metadata["word_count"], json!(3));
    }
}
