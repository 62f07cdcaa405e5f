//! Token counting for text, chat transcripts and images.
//!
//! | Input | Strategy |
//! |-------|----------|
//! | text, pdf, excel, word | BPE encoding chosen from the model name |
//! | chat messages | BPE over `role: content` lines + 4 tokens per message |
//! | image | resolution heuristic of the model's vendor family |

pub mod counter;
pub mod encoding;
pub mod image;

pub use counter::{estimate_tokens_from_chars, TokenCounter, MESSAGE_OVERHEAD_TOKENS};
pub use encoding::Encoding;
pub use image::{
    bucket_tokens, estimate_image_tokens, tile_tokens, ImageDetail, ImageEstimates, VendorFamily,
};
