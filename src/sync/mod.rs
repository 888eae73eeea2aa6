// Sync step invocation.
// Runs the configured artifact-producing step and reports success or failure to the pipeline.

pub mod updater;

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::cache::store;
use crate::config::{Config, DatabaseConfig, SyncStep};
use crate::error::{Result, SyncError};
use crate::source::RecordsClient;

pub use updater::{UpdateOutcome, update_cache};

/// Outcome of the built-in step for one database.
#[derive(Debug, Clone)]
pub struct DatabaseReport {
    pub name: String,
    pub cache_file: PathBuf,
    pub outcome: UpdateOutcome,
}

/// What a sync step did.
#[derive(Debug, Clone)]
pub enum SyncReport {
    Command { program: String },
    Builtin { databases: Vec<DatabaseReport> },
}

/// Run the configured sync step in `workspace`.
///
/// Any error returned here must stop the run before the publish stage.
pub async fn invoke(config: &Config, workspace: &Path) -> Result<SyncReport> {
    match &config.sync {
        SyncStep::Command {
            program,
            args,
            timeout_secs,
        } => {
            run_command(
                program,
                args,
                workspace,
                timeout_secs.map(Duration::from_secs),
            )
            .await?;
            Ok(SyncReport::Command {
                program: program.clone(),
            })
        }
        SyncStep::Builtin => {
            let databases = config.databases.iter().collect::<Vec<_>>();
            let reports = update_databases(&databases, workspace).await?;
            Ok(SyncReport::Builtin { databases: reports })
        }
    }
}

/// Run an external program, streaming its output into the log.
pub async fn run_command(
    program: &str,
    args: &[String],
    workspace: &Path,
    timeout: Option<Duration>,
) -> Result<()> {
    tracing::info!(program, ?args, "Running sync command");

    let child = Command::new(program)
        .args(args)
        .current_dir(workspace)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = match timeout {
        Some(limit) => tokio::time::timeout(limit, child).await.map_err(|_| {
            SyncError::SyncFailed(format!("{} timed out after {:?}", program, limit))
        })?,
        None => child.await,
    }
    .map_err(|e| SyncError::SyncFailed(format!("failed to start {}: {}", program, e)))?;

    for line in String::from_utf8_lossy(&output.stdout).lines() {
        tracing::info!(target: "cache_sync::sync::command", "{}", line);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stderr.lines() {
        tracing::warn!(target: "cache_sync::sync::command", "{}", line);
    }

    if !output.status.success() {
        let status = output
            .status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
        let tail: Vec<&str> = tail.into_iter().rev().collect();
        return Err(SyncError::SyncFailed(format!(
            "{} exited with status {}: {}",
            program,
            status,
            tail.join(" | ")
        )));
    }
    Ok(())
}

/// Run the built-in updater for each database, in order.
pub async fn update_databases(
    databases: &[&DatabaseConfig],
    workspace: &Path,
) -> Result<Vec<DatabaseReport>> {
    let mut reports = Vec::with_capacity(databases.len());
    for db in databases {
        let client = RecordsClient::new(&db.api_url, &db.element_path)?;
        let cache_file = db.cache_file();
        let outcome = update_cache(&client, &workspace.join(&cache_file), &db.name).await?;
        reports.push(DatabaseReport {
            name: db.name.clone(),
            cache_file,
            outcome,
        });
    }

    let succeeded = reports.iter().filter(|r| r.outcome.is_success()).count();
    if succeeded == reports.len() {
        tracing::info!(succeeded, total = reports.len(), "All databases updated");
    } else {
        tracing::warn!(
            succeeded,
            total = reports.len(),
            "Some databases could not be updated"
        );
    }
    Ok(reports)
}

/// Delete the cache files of `databases` so the next update refetches everything.
pub fn reset_databases(databases: &[&DatabaseConfig], workspace: &Path) -> Result<()> {
    for db in databases {
        let path = workspace.join(db.cache_file());
        if store::delete(&path)? {
            tracing::info!(path = %path.display(), "Deleted cache file");
        }
    }
    Ok(())
}
