// Artifact snapshot model.
// The JSON document the built-in updater reads and rewrites on every run.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

use super::store;

/// One fetched record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub index: u64,
    pub name: String,
    #[serde(default)]
    pub parent: Option<Value>,
    #[serde(default)]
    pub test: String,
    #[serde(default)]
    pub train: String,
    #[serde(default)]
    pub score: Option<Value>,
    pub timestamp: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CacheEntry {
    /// Numeric score, if the record carries one.
    pub fn score_value(&self) -> Option<f64> {
        self.score.as_ref().and_then(Value::as_f64)
    }
}

/// Top-level artifact document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotCache {
    #[serde(default)]
    pub total_records_at_last_run: u64,
    #[serde(default)]
    pub results: Vec<CacheEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SnapshotCache {
    /// Load the snapshot at `path`.
    ///
    /// A missing file yields an empty snapshot. A file that exists but does
    /// not parse is logged and also replaced by an empty snapshot, so the
    /// next save rebuilds it from scratch.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        match serde_json::from_str(&contents) {
            Ok(cache) => Ok(cache),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cache file is corrupt, starting fresh");
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        store::write_json(path, self)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
