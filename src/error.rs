// Error types for cache-sync.
// Covers HTTP source errors, git failures, sync step failures and config problems.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Missing {0} environment variable")]
    MissingToken(String),

    #[error("git {command} failed ({code}): {stderr}")]
    Git {
        command: String,
        code: String,
        stderr: String,
    },

    #[error("Push to {branch} rejected: {stderr}")]
    PushRejected { branch: String, stderr: String },

    #[error("Sync step failed: {0}")]
    SyncFailed(String),

    #[error("Another run holds the lock at {0}")]
    Locked(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
