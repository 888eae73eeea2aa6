// Configuration loading and validation.
// Resolves the JSON config file, applies environment overrides, and fills defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::paths;
use crate::error::{Result, SyncError};

/// Artifact written by the external sync script.
pub const DEFAULT_ARTIFACT: &str = "cache.json";

/// Config file name looked up in the workspace.
pub const WORKSPACE_CONFIG: &str = "cache-sync.json";

/// Commit author used for published artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            name: "github-actions[bot]".to_string(),
            email: "41898283+github-actions[bot]@users.noreply.github.com".to_string(),
        }
    }
}

/// The step that produces the artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncStep {
    /// Run an external program in the workspace.
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
    /// Run the built-in incremental updater over `databases`.
    Builtin,
}

impl Default for SyncStep {
    fn default() -> Self {
        SyncStep::Command {
            program: "python3".to_string(),
            args: vec!["update_cache.py".to_string()],
            timeout_secs: None,
        }
    }
}

/// A records API the built-in updater mirrors into one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub name: String,
    pub api_url: String,
    #[serde(default)]
    pub cache_file: Option<PathBuf>,
    #[serde(default = "default_element_path")]
    pub element_path: String,
}

impl DatabaseConfig {
    /// Artifact path relative to the workspace.
    pub fn cache_file(&self) -> PathBuf {
        self.cache_file
            .clone()
            .unwrap_or_else(|| paths::database_artifact(&self.name))
    }
}

fn default_element_path() -> String {
    "/elements/with-score/by-index".to_string()
}

fn default_workspace() -> PathBuf {
    PathBuf::from(".")
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_message_prefix() -> String {
    "🤖 Auto-update cache".to_string()
}

fn default_schedule_minutes() -> u64 {
    30
}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Working copy of the published repository.
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,
    /// Primary branch artifacts are pushed to.
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Remote name used for fetch and push.
    #[serde(default = "default_remote")]
    pub remote: String,
    /// Clone URL, used when the workspace does not exist yet.
    #[serde(default)]
    pub remote_url: Option<String>,
    /// Environment variable holding the access token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Fail instead of falling back to ambient git credentials.
    #[serde(default)]
    pub require_token: bool,
    /// Files the publisher stages and commits, relative to the workspace.
    /// Empty means "derive from the sync step", see `publish_artifacts`.
    #[serde(default)]
    pub artifacts: Vec<PathBuf>,
    #[serde(default)]
    pub sync: SyncStep,
    #[serde(default)]
    pub identity: Identity,
    #[serde(default = "default_message_prefix")]
    pub message_prefix: String,
    #[serde(default = "default_schedule_minutes")]
    pub schedule_minutes: u64,
    #[serde(default)]
    pub databases: Vec<DatabaseConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: default_workspace(),
            branch: default_branch(),
            remote: default_remote(),
            remote_url: None,
            token_env: default_token_env(),
            require_token: false,
            artifacts: Vec::new(),
            sync: SyncStep::default(),
            identity: Identity::default(),
            message_prefix: default_message_prefix(),
            schedule_minutes: default_schedule_minutes(),
            databases: Vec::new(),
        }
    }
}

impl Config {
    /// Resolve and load the configuration.
    ///
    /// Lookup order: `explicit`, then `cache-sync.json` in `workspace`, then
    /// the user config directory. With no file found, defaults are used.
    /// `workspace`, when given, always wins over the file's value.
    pub fn load(explicit: Option<&Path>, workspace: Option<&Path>) -> Result<Self> {
        let candidates = [
            explicit.map(Path::to_path_buf),
            workspace.map(|w| w.join(WORKSPACE_CONFIG)),
            Some(PathBuf::from(WORKSPACE_CONFIG)),
            paths::user_config_path(),
        ];

        let mut config = match explicit {
            Some(path) if !path.exists() => {
                return Err(SyncError::Config(format!(
                    "config file {} not found",
                    path.display()
                )));
            }
            _ => match candidates.into_iter().flatten().find(|p| p.exists()) {
                Some(path) => {
                    tracing::debug!(path = %path.display(), "Loading config");
                    Self::from_file(&path)?
                }
                None => Self::default(),
            },
        };

        if let Some(workspace) = workspace {
            config.workspace = workspace.to_path_buf();
        }
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| SyncError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Apply `CACHE_SYNC_*` environment overrides.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(branch) = lookup("CACHE_SYNC_BRANCH").filter(|v| !v.is_empty()) {
            self.branch = branch;
        }
        if let Some(url) = lookup("CACHE_SYNC_REMOTE_URL").filter(|v| !v.is_empty()) {
            self.remote_url = Some(url);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.artifacts.iter().any(|p| p.is_absolute()) {
            return Err(SyncError::Config(
                "artifacts must be relative to the workspace".into(),
            ));
        }
        if self.schedule_minutes == 0 {
            return Err(SyncError::Config("schedule_minutes must be positive".into()));
        }
        if self.branch.trim().is_empty() {
            return Err(SyncError::Config("branch must not be empty".into()));
        }
        if self.identity.name.trim().is_empty() || self.identity.email.trim().is_empty() {
            return Err(SyncError::Config("identity name and email are required".into()));
        }
        if let SyncStep::Command { program, .. } = &self.sync {
            if program.trim().is_empty() {
                return Err(SyncError::Config("sync program must not be empty".into()));
            }
        }
        if self.sync == SyncStep::Builtin && self.databases.is_empty() {
            return Err(SyncError::Config(
                "builtin sync needs at least one database".into(),
            ));
        }
        Ok(())
    }

    /// Files the publisher considers: the explicit list, else every database
    /// cache file for the built-in step, else `cache.json`.
    pub fn publish_artifacts(&self) -> Vec<PathBuf> {
        if !self.artifacts.is_empty() {
            return self.artifacts.clone();
        }
        match self.sync {
            SyncStep::Builtin => self.databases.iter().map(|db| db.cache_file()).collect(),
            SyncStep::Command { .. } => vec![PathBuf::from(DEFAULT_ARTIFACT)],
        }
    }

    pub fn schedule_period(&self) -> Duration {
        Duration::from_secs(self.schedule_minutes * 60)
    }

    /// Read the access token from the configured environment variable.
    pub fn token(&self) -> Result<Option<String>> {
        match std::env::var(&self.token_env) {
            Ok(token) if !token.is_empty() => Ok(Some(token)),
            _ if self.require_token => Err(SyncError::MissingToken(self.token_env.clone())),
            _ => Ok(None),
        }
    }

    /// Databases selected by name, or all when `name` is `None`.
    pub fn select_databases(&self, name: Option<&str>) -> Result<Vec<&DatabaseConfig>> {
        match name {
            None => Ok(self.databases.iter().collect()),
            Some(name) => self
                .databases
                .iter()
                .find(|db| db.name == name)
                .map(|db| vec![db])
                .ok_or_else(|| SyncError::Config(format!("unknown database '{}'", name))),
        }
    }
}
