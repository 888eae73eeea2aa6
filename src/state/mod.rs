// State management module.
// Holds the data and selection state behind each browser tab.

pub mod leaderboard;
pub mod list;
pub mod runs;

pub use leaderboard::LeaderboardTabState;
pub use list::{LoadingState, SelectableList};
pub use runs::RunsTabState;
