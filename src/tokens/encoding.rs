//! Model → BPE encoding mapping.

use once_cell::sync::Lazy;
use std::fmt;
use tiktoken_rs::CoreBPE;

/// BPE encodings used for text. Non-OpenAI models are approximated with
/// `cl100k_base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Cl100kBase,
    O200kBase,
}

/// Exact model names with a known encoding.
const MODEL_ENCODINGS: &[(&str, Encoding)] = &[
    ("gpt-4", Encoding::Cl100kBase),
    ("gpt-4-32k", Encoding::Cl100kBase),
    ("gpt-4-turbo", Encoding::Cl100kBase),
    ("gpt-3.5-turbo", Encoding::Cl100kBase),
    ("gpt-4o", Encoding::O200kBase),
    ("gpt-4o-mini", Encoding::O200kBase),
    ("o1-preview", Encoding::O200kBase),
    ("o1-mini", Encoding::O200kBase),
    ("claude-3-opus", Encoding::Cl100kBase),
    ("claude-3.5-sonnet", Encoding::Cl100kBase),
    ("claude-3-haiku", Encoding::Cl100kBase),
    ("gemini-1.5-pro", Encoding::Cl100kBase),
    ("gemini-1.5-flash", Encoding::Cl100kBase),
    ("gemini-1.0-pro", Encoding::Cl100kBase),
];

/// Newer OpenAI families all ship on o200k.
const O200K_PREFIXES: &[&str] = &["gpt-4o", "gpt-4.1", "gpt-5", "o1", "o3", "o4"];

static CL100K: Lazy<CoreBPE> =
    Lazy::new(|| tiktoken_rs::cl100k_base().expect("embedded cl100k_base ranks"));
static O200K: Lazy<CoreBPE> =
    Lazy::new(|| tiktoken_rs::o200k_base().expect("embedded o200k_base ranks"));

impl Encoding {
    pub const DEFAULT: Encoding = Encoding::Cl100kBase;

    /// Resolve the encoding for a model name. Unknown models fall back to
    /// `cl100k_base`.
    pub fn for_model(model_name: &str) -> Self {
        let lower = model_name.trim().to_lowercase();
        if let Some((_, encoding)) = MODEL_ENCODINGS.iter().find(|(name, _)| *name == lower) {
            return *encoding;
        }
        if O200K_PREFIXES.iter().any(|prefix| lower.starts_with(prefix)) {
            return Encoding::O200kBase;
        }
        Self::DEFAULT
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "cl100k_base" => Some(Encoding::Cl100kBase),
            "o200k_base" => Some(Encoding::O200kBase),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Cl100kBase => "cl100k_base",
            Encoding::O200kBase => "o200k_base",
        }
    }

    fn bpe(&self) -> &'static CoreBPE {
        match self {
            Encoding::Cl100kBase => &CL100K,
            Encoding::O200kBase => &O200K,
        }
    }

    /// Number of tokens in `text`. Special-token markers are counted as
    /// ordinary text.
    pub fn count(&self, text: &str) -> u64 {
        if text.is_empty() {
            return 0;
        }
        self.bpe().encode_ordinary(text).len() as u64
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_models_map_to_their_encoding() {
        assert_eq!(Encoding::for_model("gpt-4"), Encoding::Cl100kBase);
        assert_eq!(Encoding::for_model("gpt-4o-mini"), Encoding::O200kBase);
        assert_eq!(Encoding::for_model("GPT-5-nano"), Encoding::O200kBase);
        assert_eq!(Encoding::for_model("claude-3-haiku"), Encoding::Cl100kBase);
    }

    #[test]
    fn unknown_models_fall_back() {
        assert_eq!(Encoding::for_model("sonar-pro"), Encoding::Cl100kBase);
        assert_eq!(Encoding::for_model(""), Encoding::Cl100kBase);
    }

    #[test]
    fn counts_hello_world() {
        assert_eq!(Encoding::Cl100kBase.count("Hello, world!"), 4);
        assert_eq!(Encoding::O200kBase.count("Hello, world!"), 4);
        assert_eq!(Encoding::Cl100kBase.count(""), 0);
    }

    #[test]
    fn special_token_text_is_ordinary() {
        assert!(Encoding::Cl100kBase.count("<|endoftext|>") > 1);
    }

    #[test]
    fn names_round_trip() {
        for enc in [Encoding::Cl100kBase, Encoding::O200kBase] {
            assert_eq!(Encoding::from_name(enc.name()), Some(enc));
        }
        assert_eq!(Encoding::from_name("p50k_base"), None);
    }
}
