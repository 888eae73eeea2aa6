// Run history persisted between invocations.
// Each pipeline run appends one record; the oldest records fall off past the cap.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schedule::Trigger;

use super::store::{read_cached, write_cached};

/// Maximum number of runs kept on disk.
pub const HISTORY_CAP: usize = 200;

/// How a pipeline run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Unchanged,
    Published { commit: String },
    Failed { error: String },
}

impl RunOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Unchanged => "unchanged",
            RunOutcome::Published { .. } => "published",
            RunOutcome::Failed { .. } => "failed",
        }
    }
}

/// A single completed pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub trigger: Trigger,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: RunOutcome,
}

impl RunRecord {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at.signed_duration_since(self.started_at)
    }
}

/// Ordered run records, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunHistory {
    pub runs: Vec<RunRecord>,
}

impl RunHistory {
    /// Load history, treating a missing or unreadable file as empty.
    pub fn load(path: &Path) -> Self {
        match read_cached::<RunHistory>(path) {
            Ok(Some(cached)) => cached.data,
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable run history");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_cached(path, self)
    }

    pub fn push(&mut self, record: RunRecord) {
        self.runs.push(record);
        if self.runs.len() > HISTORY_CAP {
            let excess = self.runs.len() - HISTORY_CAP;
            self.runs.drain(..excess);
        }
    }

    /// Most recent run first.
    pub fn recent(&self) -> impl Iterator<Item = &RunRecord> {
        self.runs.iter().rev()
    }

    pub fn last(&self) -> Option<&RunRecord> {
        self.runs.last()
    }
}
