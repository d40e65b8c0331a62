//! Discovery cache file consumed by the downstream fetcher.
//!
//! ```json
//! {"source": "edu_search", "last_updated": "2026-01-01T00:00:00+00:00", "urls": [...]}
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use edu_discovery::SearchResult;
use serde::{Deserialize, Serialize};

pub const SOURCE: &str = "edu_search";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryCache {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub urls: Vec<String>,

    /// Keys written by other tools, carried through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DiscoveryCache {
    /// Read a cache file. A missing file is an empty cache.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read cache file {}", path.display()))?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&raw)
            .with_context(|| format!("Cache file {} is not valid JSON", path.display()))
    }

    /// Replace the URL list with this run's results.
    pub fn record(&mut self, results: &[SearchResult]) {
        self.source = SOURCE.to_string();
        self.last_updated = Some(Utc::now().to_rfc3339());
        self.urls = results.iter().map(|r| r.url().to_string()).collect();
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize cache")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write cache file {}", path.display()))
    }
}

/// Load, update and write the cache in one step.
pub fn write_results(path: &Path, results: &[SearchResult]) -> Result<DiscoveryCache> {
    let mut cache = DiscoveryCache::load(path)?;
    cache.record(results);
    cache.save(path)?;
    Ok(cache)
}
