//! Platform cache locations.

use std::path::PathBuf;

pub fn cache_root_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("LOCALAPPDATA").map(PathBuf::from)
    }
    #[cfg(not(target_os = "windows"))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CACHE_HOME") {
            return Some(PathBuf::from(xdg));
        }
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache"))
    }
}

/// Default location of the price cache file.
pub fn default_price_cache_path() -> PathBuf {
    match cache_root_dir() {
        Some(root) => root.join("llm-cost").join("price_cache.json"),
        None => PathBuf::from("data").join("price_cache.json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_cache_path_ends_with_file_name() {
        let path = default_price_cache_path();
        assert!(path.ends_with("price_cache.json"));
    }
}
