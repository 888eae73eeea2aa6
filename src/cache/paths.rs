// Local path utilities.
// Locates the config and state directories and derives per-database artifact names.

use std::path::PathBuf;

use directories::ProjectDirs;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "cache-sync")
}

/// Get the base state directory (~/.cache/cache-sync on Linux).
pub fn state_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Path to the user-level config file.
pub fn user_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
}

/// Path to the persisted run history.
pub fn runs_path() -> Option<PathBuf> {
    state_dir().map(|dir| dir.join("runs.json"))
}

/// Path to the log file used while the TUI owns the terminal.
pub fn tui_log_path() -> Option<PathBuf> {
    state_dir().map(|dir| dir.join("browse.log"))
}

/// Default artifact file name for a named database.
pub fn database_artifact(name: &str) -> PathBuf {
    PathBuf::from(format!("cache_{}.json", sanitize_name(name)))
}

/// Sanitize a name for use in filesystem paths.
/// Replaces problematic characters with underscores.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' => '_',
            _ => c,
        })
        .collect()
}
