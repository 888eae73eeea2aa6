// Runs tab state.
// Shows the persisted pipeline run history, newest first.

use std::path::PathBuf;

use crate::cache::{RunHistory, RunOutcome, RunRecord};

use super::list::SelectableList;

#[derive(Debug, Default)]
pub struct RunsTabState {
    pub path: Option<PathBuf>,
    pub runs: SelectableList<RunRecord>,
}

impl RunsTabState {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            runs: SelectableList::default(),
        }
    }

    pub fn load(&mut self) {
        match &self.path {
            Some(path) => {
                let history = RunHistory::load(path);
                self.runs.set_loaded(history.recent().cloned().collect());
            }
            None => self
                .runs
                .set_error("No state directory available".to_string()),
        }
    }

    /// Failed runs among the loaded history.
    pub fn failed_count(&self) -> usize {
        self.runs
            .data
            .data()
            .map_or(0, |runs| {
                runs.iter()
                    .filter(|r| matches!(r.outcome, RunOutcome::Failed { .. }))
                    .count()
            })
    }
}
