// Cache module for local filesystem storage.
// Holds the artifact snapshot model, run history, and JSON file helpers.

pub mod history;
pub mod paths;
pub mod snapshot;
pub mod store;

pub use history::{RunHistory, RunOutcome, RunRecord};
pub use snapshot::{CacheEntry, SnapshotCache};
