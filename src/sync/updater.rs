// Built-in incremental updater.
// Pulls records added since the last run from a records API into a snapshot artifact.

use std::path::Path;

use chrono::Local;
use serde_json::Map;

use crate::cache::{CacheEntry, SnapshotCache};
use crate::error::Result;
use crate::source::RecordSource;

/// Result of updating one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The API could not be reached or reported no records. Artifact untouched.
    Unreachable,
    /// No records beyond the last run. Artifact untouched.
    UpToDate { total: u64 },
    /// New records were fetched and the artifact rewritten.
    Updated {
        added: usize,
        skipped: usize,
        cached: usize,
    },
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, UpdateOutcome::Unreachable)
    }
}

fn local_timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Bring the snapshot at `path` up to date with `source`.
///
/// Records `last+1 ..= current` are fetched in order. Records that fail to
/// load or carry no `result` are skipped, and the high-water mark still moves
/// to `current`, so they are not retried on later runs.
pub async fn update_cache<S: RecordSource>(
    source: &S,
    path: &Path,
    label: &str,
) -> Result<UpdateOutcome> {
    tracing::info!(database = label, path = %path.display(), "Updating cache");

    let mut cache = SnapshotCache::load(path)?;

    let current_total = match source.total_records().await {
        Ok(0) => {
            tracing::warn!(database = label, "API reported no records");
            return Ok(UpdateOutcome::Unreachable);
        }
        Ok(total) => total,
        Err(e) => {
            tracing::warn!(database = label, error = %e, "Could not reach records API");
            return Ok(UpdateOutcome::Unreachable);
        }
    };

    let last_total = cache.total_records_at_last_run;
    tracing::info!(database = label, current_total, last_total, "Record counts");

    if current_total <= last_total {
        tracing::info!(database = label, "No new records");
        return Ok(UpdateOutcome::UpToDate {
            total: current_total,
        });
    }

    let mut added = 0;
    let mut skipped = 0;
    for index in (last_total + 1)..=current_total {
        tracing::debug!(database = label, index, "Fetching record");
        let element = match source.element(index).await {
            Ok(element) => element,
            Err(e) => {
                tracing::warn!(database = label, index, error = %e, "Fetching record failed");
                skipped += 1;
                continue;
            }
        };

        let Some(result) = element.result.as_ref() else {
            tracing::warn!(database = label, index, "Record has no result, skipping");
            skipped += 1;
            continue;
        };

        let entry = CacheEntry {
            index,
            name: element
                .name
                .clone()
                .unwrap_or_else(|| format!("model_{}", index)),
            parent: element.parent.clone(),
            test: result.test_text(),
            train: result.train_text(),
            score: element.score.clone(),
            timestamp: local_timestamp(),
            extra: Map::new(),
        };
        tracing::info!(database = label, index, name = %entry.name, "Fetched record");
        cache.results.push(entry);
        added += 1;
    }

    cache.total_records_at_last_run = current_total;
    cache.last_update = Some(local_timestamp());
    cache.save(path)?;

    tracing::info!(
        database = label,
        added,
        skipped,
        cached = cache.len(),
        "Cache saved"
    );
    Ok(UpdateOutcome::Updated {
        added,
        skipped,
        cached: cache.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::error::SyncError;
    use crate::source::{Element, ElementResult};
    use tempfile::TempDir;

    /// In-memory records API.
    #[derive(Default)]
    struct FakeSource {
        total: Option<u64>,
        elements: HashMap<u64, Element>,
        requested: Mutex<Vec<u64>>,
    }

    impl FakeSource {
        fn with_records(total: u64) -> Self {
            let elements = (1..=total)
                .map(|i| {
                    (
                        i,
                        Element {
                            name: Some(format!("net_{}", i)),
                            parent: None,
                            result: Some(ElementResult {
                                test: serde_json::json!("model,arc_easy\nx,0.5"),
                                train: serde_json::json!("step,2000\nloss,4.1"),
                            }),
                            score: Some(serde_json::json!(i as f64 / 10.0)),
                        },
                    )
                })
                .collect();
            Self {
                total: Some(total),
                elements,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    impl RecordSource for FakeSource {
        async fn total_records(&self) -> Result<u64> {
            self.total
                .ok_or_else(|| SyncError::Other("connection refused".to_string()))
        }

        async fn element(&self, index: u64) -> Result<Element> {
            self.requested.lock().unwrap().push(index);
            self.elements
                .get(&index)
                .cloned()
                .ok_or_else(|| SyncError::Other(format!("HTTP 404 for {}", index)))
        }
    }

    #[tokio::test]
    async fn test_first_run_fetches_everything() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache.json");
        let source = FakeSource::with_records(3);

        let outcome = update_cache(&source, &path, "db1").await.unwrap();
        assert_eq!(
            outcome,
            UpdateOutcome::Updated {
                added: 3,
                skipped: 0,
                cached: 3
            }
        );

        let cache = SnapshotCache::load(&path).unwrap();
        assert_eq!(cache.total_records_at_last_run, 3);
        assert_eq!(cache.results[2].name, "net_3");
        assert_eq!(cache.results[0].test, "model,arc_easy\nx,0.5");
        assert!(cache.last_update.is_some());
    }

    #[tokio::test]
    async fn test_incremental_range() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache.json");

        update_cache(&FakeSource::with_records(2), &path, "db1")
            .await
            .unwrap();

        let source = FakeSource::with_records(5);
        update_cache(&source, &path, "db1").await.unwrap();

        assert_eq!(*source.requested.lock().unwrap(), vec![3, 4, 5]);
        let cache = SnapshotCache::load(&path).unwrap();
        let indexes: Vec<u64> = cache.results.iter().map(|e| e.index).collect();
        assert_eq!(indexes, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_up_to_date_leaves_file_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache.json");
        let source = FakeSource::with_records(2);

        update_cache(&source, &path, "db1").await.unwrap();
        let before = std::fs::read(&path).unwrap();

        let outcome = update_cache(&source, &path, "db1").await.unwrap();
        assert_eq!(outcome, UpdateOutcome::UpToDate { total: 2 });
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_unreachable_and_empty_api() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache.json");

        let down = FakeSource::default();
        assert_eq!(
            update_cache(&down, &path, "db1").await.unwrap(),
            UpdateOutcome::Unreachable
        );

        let empty = FakeSource {
            total: Some(0),
            ..FakeSource::default()
        };
        assert_eq!(
            update_cache(&empty, &path, "db1").await.unwrap(),
            UpdateOutcome::Unreachable
        );
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_invalid_records_are_skipped_but_counted() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache.json");

        let mut source = FakeSource::with_records(3);
        source.elements.remove(&2);
        source.elements.insert(
            3,
            Element {
                name: None,
                parent: Some(serde_json::json!("net_1")),
                result: Some(ElementResult::default()),
                score: None,
            },
        );
        source.elements.insert(4, Element::default());
        source.total = Some(4);

        let outcome = update_cache(&source, &path, "db1").await.unwrap();
        assert_eq!(
            outcome,
            UpdateOutcome::Updated {
                added: 2,
                skipped: 2,
                cached: 2
            }
        );

        let cache = SnapshotCache::load(&path).unwrap();
        assert_eq!(cache.total_records_at_last_run, 4);
        assert_eq!(cache.results[1].name, "model_3");
        assert_eq!(cache.results[1].test, "");
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_rebuilt() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache.json");
        std::fs::write(&path, "garbage").unwrap();

        let outcome = update_cache(&FakeSource::with_records(1), &path, "db1")
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert_eq!(SnapshotCache::load(&path).unwrap().len(), 1);
    }
}
