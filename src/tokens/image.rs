//! Image token heuristics.
//!
//! Vision APIs bill images by resolution rather than by content. Two
//! conventions are modelled:
//! - **tile**: 512x512 tiles at 170 tokens each plus an 85 token base
//!   (OpenAI style)
//! - **bucket**: a flat cost per pixel-count bucket (Anthropic style, reused
//!   as the Google approximation)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const TILE_SIZE: u64 = 512;
const TILE_BASE_TOKENS: u64 = 85;
const TOKENS_PER_TILE: u64 = 170;

const SMALL_BUCKET_PIXELS: u64 = 400 * 400;
const MEDIUM_BUCKET_PIXELS: u64 = 800 * 800;

/// Vendor conventions for image billing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorFamily {
    OpenAi,
    Anthropic,
    Google,
}

impl VendorFamily {
    /// Pick a family by substring of the model name; unmatched names use the
    /// tile convention.
    pub fn from_model_name(model_name: &str) -> Self {
        let lower = model_name.to_lowercase();
        if lower.contains("gpt") {
            VendorFamily::OpenAi
        } else if lower.contains("claude") {
            VendorFamily::Anthropic
        } else if lower.contains("gemini") {
            VendorFamily::Google
        } else {
            VendorFamily::OpenAi
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VendorFamily::OpenAi => "openai",
            VendorFamily::Anthropic => "anthropic",
            VendorFamily::Google => "google",
        }
    }
}

/// Detail level requested for tile-based billing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    #[default]
    High,
    Low,
}

impl ImageDetail {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageDetail::High => "high",
            ImageDetail::Low => "low",
        }
    }
}

impl fmt::Display for ImageDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageDetail {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(ImageDetail::High),
            "low" => Ok(ImageDetail::Low),
            other => Err(format!("Invalid image detail '{}': expected 'high' or 'low'", other)),
        }
    }
}

/// Bucketed estimate by total pixel count.
pub fn bucket_tokens(width: u32, height: u32) -> u64 {
    let total_pixels = width as u64 * height as u64;
    if total_pixels < SMALL_BUCKET_PIXELS {
        1600
    } else if total_pixels < MEDIUM_BUCKET_PIXELS {
        3000
    } else {
        6000
    }
}

/// Tile estimate: `85 + ceil(w/512) * ceil(h/512) * 170`, or a flat 85 at low
/// detail.
pub fn tile_tokens(width: u32, height: u32, detail: ImageDetail) -> u64 {
    if detail == ImageDetail::Low {
        return TILE_BASE_TOKENS;
    }
    let tiles_x = (width as u64).div_ceil(TILE_SIZE);
    let tiles_y = (height as u64).div_ceil(TILE_SIZE);
    TILE_BASE_TOKENS + tiles_x * tiles_y * TOKENS_PER_TILE
}

/// Estimates for every vendor at once, so callers can show alternatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageEstimates {
    pub openai: u64,
    pub anthropic: u64,
    pub google: u64,
}

impl ImageEstimates {
    /// Alternates are always computed at high detail.
    pub fn compute(width: u32, height: u32) -> Self {
        Self {
            openai: tile_tokens(width, height, ImageDetail::High),
            anthropic: bucket_tokens(width, height),
            google: bucket_tokens(width, height),
        }
    }

    pub fn for_family(&self, family: VendorFamily) -> u64 {
        match family {
            VendorFamily::OpenAi => self.openai,
            VendorFamily::Anthropic => self.anthropic,
            VendorFamily::Google => self.google,
        }
    }
}

/// Primary estimate for one family.
pub fn estimate_image_tokens(
    width: u32,
    height: u32,
    family: VendorFamily,
    detail: ImageDetail,
) -> u64 {
    match family {
        VendorFamily::OpenAi => tile_tokens(width, height, detail),
        VendorFamily::Anthropic | VendorFamily::Google => bucket_tokens(width, height),
    }
}
