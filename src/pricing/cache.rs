//! Time-boxed on-disk cache for the price catalog.
//!
//! The file holds `{"timestamp": "<RFC 3339>", "data": <payload>}`. Anything
//! else on disk (wrong shape, bad timestamp, expired) reads as a miss. Cache
//! failures are logged and never surface as errors.

use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub timestamp: DateTime<Utc>,
    pub data: Value,
}

/// Read-only snapshot of the cache file state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheInfo {
    pub exists: bool,
    pub valid: bool,
    pub size_bytes: u64,
    pub age: Option<Duration>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct PriceCache {
    path: PathBuf,
    validity: Duration,
}

impl PriceCache {
    pub fn new(path: impl Into<PathBuf>, validity_hours: u64) -> Self {
        let validity = i64::try_from(validity_hours)
            .ok()
            .and_then(Duration::try_hours)
            .unwrap_or(Duration::MAX);
        Self { path: path.into(), validity }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// The cached entry, if present, well-formed and not expired.
    pub fn load(&self) -> Option<CacheEntry> {
        let entry = self.read_entry()?;
        if self.is_valid(&entry) {
            Some(entry)
        } else {
            tracing::debug!("Price cache {} has expired", self.path.display());
            None
        }
    }

    /// Stamp `data` with the current time and persist it. The write goes to a
    /// sibling temp file first and is renamed into place.
    pub fn save(&self, data: &Value) -> bool {
        match self.write_entry(data) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to write price cache {}: {}", self.path.display(), e);
                false
            }
        }
    }

    pub fn is_valid(&self, entry: &CacheEntry) -> bool {
        self.is_valid_at(entry, Utc::now())
    }

    pub fn is_valid_at(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        match entry.timestamp.checked_add_signed(self.validity) {
            Some(expiry) => now < expiry,
            None => true,
        }
    }

    /// Remove the cache file. Removing a missing file succeeds.
    pub fn clear(&self) -> bool {
        match fs::remove_file(&self.path) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => {
                tracing::warn!("Failed to remove price cache {}: {}", self.path.display(), e);
                false
            }
        }
    }

    pub fn info(&self) -> CacheInfo {
        let Ok(meta) = fs::metadata(&self.path) else {
            return CacheInfo::default();
        };

        let mut info = CacheInfo { exists: true, size_bytes: meta.len(), ..CacheInfo::default() };
        if let Some(entry) = self.read_entry() {
            let now = Utc::now();
            info.valid = self.is_valid_at(&entry, now);
            info.age = Some(now.signed_duration_since(entry.timestamp));
            info.timestamp = Some(entry.timestamp);
        }
        info
    }

    fn read_entry(&self) -> Option<CacheEntry> {
        if !self.path.exists() {
            return None;
        }
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to read price cache {}: {}", self.path.display(), e);
                return None;
            }
        };
        match parse_entry(&content) {
            Ok(entry) => Some(entry),
            Err(reason) => {
                tracing::warn!("Ignoring price cache {}: {}", self.path.display(), reason);
                None
            }
        }
    }

    fn write_entry(&self, data: &Value) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let entry = json!({
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            "data": data,
        });
        let serialized = serde_json::to_string_pretty(&entry)?;

        let mut tmp_name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);
        let written =
            fs::write(&tmp_path, serialized).and_then(|()| fs::rename(&tmp_path, &self.path));
        if written.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        written
    }
}

fn parse_entry(content: &str) -> Result<CacheEntry, String> {
    let value: Value = serde_json::from_str(content).map_err(|e| format!("invalid JSON: {}", e))?;
    let object = value.as_object().ok_or("entry is not an object")?;
    let raw_timestamp =
        object.get("timestamp").and_then(Value::as_str).ok_or("missing timestamp")?;
    let timestamp = parse_timestamp(raw_timestamp)
        .ok_or_else(|| format!("unparseable timestamp '{}'", raw_timestamp))?;
    let data = object.get("data").cloned().ok_or("missing data")?;
    Ok(CacheEntry { timestamp, data })
}

/// RFC 3339, or a naive ISO-8601 datetime read as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok().map(|naive| naive.and_utc())
}
