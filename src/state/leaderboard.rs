// Leaderboard tab state.
// Loads one snapshot artifact from disk and keeps it sorted for display.

use std::path::PathBuf;

use crate::cache::SnapshotCache;
use crate::cache::store;
use crate::report::{self, BestMetric, LeaderboardRow, SortKey};

use super::list::SelectableList;

/// State for one artifact's tab.
#[derive(Debug)]
pub struct LeaderboardTabState {
    pub title: String,
    pub path: PathBuf,
    pub sort: SortKey,
    pub rows: SelectableList<LeaderboardRow>,
    pub best: Vec<BestMetric>,
    pub last_update: Option<String>,
    pub file_size: Option<u64>,
}

impl LeaderboardTabState {
    pub fn new(title: impl Into<String>, path: PathBuf) -> Self {
        Self {
            title: title.into(),
            path,
            sort: SortKey::default(),
            rows: SelectableList::default(),
            best: Vec::new(),
            last_update: None,
            file_size: None,
        }
    }

    /// (Re)load the artifact from disk.
    pub fn load(&mut self) {
        if !self.path.exists() {
            self.rows
                .set_error(format!("{} not found", self.path.display()));
            self.best.clear();
            self.last_update = None;
            self.file_size = None;
            return;
        }

        match SnapshotCache::load(&self.path) {
            Ok(cache) => {
                let mut rows = report::leaderboard(&cache);
                report::sort_rows(&mut rows, self.sort);
                self.best = report::best_per_metric(&rows);
                self.last_update = cache.last_update.clone();
                self.file_size = store::file_size(&self.path);
                self.rows.set_loaded(rows);
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to load artifact");
                self.rows.set_error(e.to_string());
            }
        }
    }

    /// Switch to the next sort key and reorder in place.
    pub fn cycle_sort(&mut self) {
        self.sort = self.sort.next();
        if let super::list::LoadingState::Loaded(rows) = &mut self.rows.data {
            report::sort_rows(rows, self.sort);
        }
        self.rows.select_first();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SNAPSHOT: &str = r#"{
  "total_records_at_last_run": 2,
  "results": [
    { "index": 1, "name": "a", "parent": null, "test": "", "train": "", "score": 0.1, "timestamp": "" },
    { "index": 2, "name": "b", "parent": "a", "test": "", "train": "", "score": 0.9, "timestamp": "" }
  ],
  "last_update": "2026-10-19T10:00:00"
}"#;

    #[test]
    fn test_load_sorts_by_score() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache.json");
        std::fs::write(&path, SNAPSHOT).unwrap();

        let mut tab = LeaderboardTabState::new("cache", path);
        tab.load();

        assert_eq!(tab.rows.selected_item().unwrap().name, "b");
        assert_eq!(tab.last_update.as_deref(), Some("2026-10-19T10:00:00"));
        assert_eq!(tab.best[0].metric, "Score");
    }

    #[test]
    fn test_cycle_sort() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache.json");
        std::fs::write(&path, SNAPSHOT).unwrap();

        let mut tab = LeaderboardTabState::new("cache", path);
        tab.load();
        tab.cycle_sort();
        assert_eq!(tab.sort, SortKey::Loss);

        tab.cycle_sort();
        tab.cycle_sort();
        assert_eq!(tab.sort, SortKey::Index);
        assert_eq!(tab.rows.selected_item().unwrap().index, 1);
    }

    #[test]
    fn test_missing_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut tab = LeaderboardTabState::new("db1", temp_dir.path().join("nope.json"));
        tab.load();

        assert!(!tab.rows.data.is_loaded());
    }
}
