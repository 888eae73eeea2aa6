// cache-sync: scheduled sync runner for cache artifacts.
// Runs the sync step, commits changed artifacts as a bot and pushes them to the primary branch.

mod app;
mod cache;
mod config;
mod error;
mod git;
mod pipeline;
mod publish;
mod report;
mod schedule;
mod source;
mod state;
mod sync;
mod ui;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::cache::{SnapshotCache, paths, store};
use crate::config::{Config, SyncStep};
use crate::error::{Result, SyncError};
use crate::pipeline::Pipeline;
use crate::publish::PublishOutcome;
use crate::schedule::{Schedule, Scheduler, Trigger};
use crate::sync::UpdateOutcome;

#[derive(Parser, Debug)]
#[command(name = "cache-sync", version, about)]
struct Cli {
    /// Config file (defaults to cache-sync.json in the workspace, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Working copy of the published repository
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the pipeline once (manual trigger)
    Run,
    /// Run the pipeline on a fixed schedule until interrupted
    Schedule {
        /// Override the configured period
        #[arg(long)]
        every_minutes: Option<u64>,
        /// Run once immediately before waiting for the first tick
        #[arg(long)]
        run_now: bool,
    },
    /// Run the built-in updater without committing
    Update {
        /// Only update this database
        #[arg(long)]
        db: Option<String>,
        /// Delete the cache file first and refetch everything
        #[arg(long)]
        force: bool,
    },
    /// Print the best model per metric for each artifact
    Summary,
    /// Browse artifacts and run history in a terminal UI
    Browse,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cache_sync=info"))
}

/// Initialize logging. JSON lines when `LOG_FORMAT=json`.
fn init_tracing() {
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter()).init();
    }
}

/// While the TUI owns the terminal, logs go to a file (or nowhere).
fn init_file_tracing() {
    let Some(path) = paths::tui_log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    if let Ok(file) = File::create(&path) {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Browse) {
        init_file_tracing();
    } else {
        init_tracing();
    }

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "cache-sync failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref(), cli.workspace.as_deref())?;

    match cli.command {
        Commands::Run => run_once(config).await,
        Commands::Schedule {
            every_minutes,
            run_now,
        } => run_scheduled(config, every_minutes, run_now).await,
        Commands::Update { db, force } => run_update(&config, db.as_deref(), force).await,
        Commands::Summary => {
            print_summary(&config);
            Ok(())
        }
        Commands::Browse => browse(&config),
    }
}

async fn run_once(config: Config) -> Result<()> {
    match Pipeline::new(config).run(Trigger::Manual).await? {
        PublishOutcome::Unchanged => println!("No changes to commit"),
        PublishOutcome::Published { commit, message } => {
            println!("Published {} \"{}\"", commit, message)
        }
    }
    Ok(())
}

async fn run_scheduled(config: Config, every_minutes: Option<u64>, run_now: bool) -> Result<()> {
    let mut config = config;
    if let Some(minutes) = every_minutes {
        if minutes == 0 {
            return Err(SyncError::Config("--every-minutes must be positive".into()));
        }
        config.schedule_minutes = minutes;
    }

    let pipeline = Pipeline::new(config);
    let period = pipeline.config().schedule_period();
    tracing::info!(
        minutes = period.as_secs() / 60,
        workspace = %pipeline.config().workspace.display(),
        "Scheduler started"
    );

    // Listen from the start so Ctrl-C during a run waits for it instead of
    // killing the process.
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown requested, stopping after the current run");
                let _ = stop_tx.send(());
            }
            Err(e) => {
                tracing::error!(error = %e, "Could not listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        }
    });
    let shutdown = async {
        let _ = stop_rx.await;
    };

    let pipeline = &pipeline;
    Scheduler::new(Schedule::every(period))
        .run_until(run_now, shutdown, move |trigger| async move {
            // Failures are recorded in run history; the next tick runs regardless.
            let _ = pipeline.run(trigger).await;
        })
        .await;
    Ok(())
}

async fn run_update(config: &Config, db: Option<&str>, force: bool) -> Result<()> {
    let databases = config.select_databases(db)?;
    if databases.is_empty() {
        return Err(SyncError::Config("no databases configured".into()));
    }

    if force {
        sync::reset_databases(&databases, &config.workspace)?;
    }
    let reports = sync::update_databases(&databases, &config.workspace).await?;

    println!("Update summary");
    for report in &reports {
        let status = match &report.outcome {
            UpdateOutcome::Unreachable => "unreachable".to_string(),
            UpdateOutcome::UpToDate { total } => format!("up to date ({} records)", total),
            UpdateOutcome::Updated {
                added,
                skipped,
                cached,
            } => format!("+{} new, {} skipped, {} cached", added, skipped, cached),
        };
        let size = format_kib(store::file_size(&config.workspace.join(&report.cache_file)));
        println!(
            "  {:<16} {:<40} {}  {}",
            report.name,
            status,
            report.cache_file.display(),
            size
        );
    }

    let succeeded = reports.iter().filter(|r| r.outcome.is_success()).count();
    println!("{}/{} databases updated successfully", succeeded, reports.len());
    Ok(())
}

fn format_kib(bytes: Option<u64>) -> String {
    bytes.map_or("-".to_string(), |b| format!("{:.1} KiB", b as f64 / 1024.0))
}

/// Artifacts to show, with a display title each.
fn artifact_tabs(config: &Config) -> Vec<(String, PathBuf)> {
    match config.sync {
        SyncStep::Builtin => config
            .databases
            .iter()
            .map(|db| (db.name.clone(), config.workspace.join(db.cache_file())))
            .collect(),
        SyncStep::Command { .. } => config
            .publish_artifacts()
            .into_iter()
            .map(|p| (artifact_title(&p), config.workspace.join(p)))
            .collect(),
    }
}

fn artifact_title(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_summary(config: &Config) {
    for (title, path) in artifact_tabs(config) {
        println!("== {} ({})", title, path.display());
        if !path.exists() {
            println!("   not found");
            continue;
        }

        let cache = match SnapshotCache::load(&path) {
            Ok(cache) => cache,
            Err(e) => {
                println!("   unreadable: {}", e);
                continue;
            }
        };
        let rows = report::leaderboard(&cache);
        println!(
            "   {} records, {} named models, {}, last update {}",
            cache.len(),
            rows.len(),
            format_kib(store::file_size(&path)),
            cache.last_update.as_deref().unwrap_or("never")
        );
        for best in report::best_per_metric(&rows) {
            println!(
                "   {:<14} {} {:>10}  {}",
                best.metric,
                best.direction(),
                best.formatted_value(),
                best.model
            );
        }
    }
}

fn browse(config: &Config) -> Result<()> {
    let mut app = App::new(artifact_tabs(config), paths::runs_path());

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();

    result.map_err(SyncError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    #[test]
    fn test_cli_parses_schedule() {
        let cli = Cli::try_parse_from([
            "cache-sync",
            "--workspace",
            "/tmp/ws",
            "schedule",
            "--every-minutes",
            "5",
            "--run-now",
        ])
        .unwrap();

        assert_eq!(cli.workspace, Some(PathBuf::from("/tmp/ws")));
        match cli.command {
            Commands::Schedule {
                every_minutes,
                run_now,
            } => {
                assert_eq!(every_minutes, Some(5));
                assert!(run_now);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_artifact_tabs_for_command_step() {
        let config = Config {
            workspace: PathBuf::from("/ws"),
            ..Config::default()
        };

        let tabs = artifact_tabs(&config);
        assert_eq!(
            tabs,
            vec![("cache".to_string(), PathBuf::from("/ws/cache.json"))]
        );
    }

    #[test]
    fn test_artifact_tabs_for_builtin_step() {
        let config = Config {
            workspace: PathBuf::from("/ws"),
            sync: SyncStep::Builtin,
            databases: vec![DatabaseConfig {
                name: "db1".to_string(),
                api_url: "http://localhost:1".to_string(),
                cache_file: None,
                element_path: "/elements".to_string(),
            }],
            ..Config::default()
        };

        let tabs = artifact_tabs(&config);
        assert_eq!(tabs[0].0, "db1");
        assert_eq!(tabs[0].1, PathBuf::from("/ws/cache_db1.json"));
    }
}
