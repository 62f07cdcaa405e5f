//! Small shared helpers.

pub mod format;
pub mod paths;

pub use format::{format_with_commas, round_to};
