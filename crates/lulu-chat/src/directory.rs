//! Read-only shop directory.
//!
//! Loaded once from a JSON object keyed by shop name. Key order in the file is
//! the lookup order, so when an utterance names two shops the one listed
//! first wins.

use std::path::Path;

use lulu_core::error::{LuluError, Result};
use lulu_core::types::ShopRecord;
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
struct DirectoryEntry {
    key_lower: String,
    record: ShopRecord,
}

/// Immutable shop lookup table, safe to share across sessions behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct ShopDirectory {
    entries: Vec<DirectoryEntry>,
}

impl ShopDirectory {
    /// An empty directory; every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a directory file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LuluError::Directory(format!("cannot read {}: {}", path.display(), e))
        })?;
        let directory = Self::from_json_str(&content)?;
        tracing::info!(
            path = %path.display(),
            shops = directory.len(),
            "Shop directory loaded"
        );
        Ok(directory)
    }

    /// Load from a directory file, or return an empty directory on failure.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!(error = %e, "Shop directory unavailable, lookups will miss");
                Self::empty()
            }
        }
    }

    /// Parse the JSON directory format.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        let Value::Object(map) = value else {
            return Err(LuluError::Directory(
                "directory must be a JSON object keyed by shop name".to_string(),
            ));
        };
        Self::from_map(map)
    }

    fn from_map(map: Map<String, Value>) -> Result<Self> {
        let mut entries = Vec::with_capacity(map.len());
        for (key, raw) in map {
            let record: ShopRecord = serde_json::from_value(raw)
                .map_err(|e| LuluError::Directory(format!("shop {:?}: {}", key, e)))?;
            entries.push((key, record));
        }
        Ok(Self::from_entries(entries))
    }

    /// Build from `(name, record)` pairs in lookup order.
    ///
    /// Blank names are dropped, since an empty key would match every utterance.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, ShopRecord)>,
    {
        let entries = entries
            .into_iter()
            .filter_map(|(key, record)| {
                let trimmed = key.trim();
                if trimmed.is_empty() {
                    tracing::warn!("Skipping shop with blank name");
                    return None;
                }
                Some(DirectoryEntry {
                    key_lower: trimmed.to_lowercase(),
                    record,
                })
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First shop whose name appears in the utterance, case-insensitively.
    pub fn find_in(&self, utterance: &str) -> Option<&ShopRecord> {
        let lower = utterance.to_lowercase();
        self.entries
            .iter()
            .find(|e| lower.contains(e.key_lower.as_str()))
            .map(|e| &e.record)
    }
}
