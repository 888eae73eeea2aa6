// One end-to-end pipeline run.
// prepare workspace -> sync step -> change detection -> commit and push, recorded in history.

use std::path::PathBuf;

use chrono::Utc;

use crate::cache::{RunHistory, RunOutcome, RunRecord, paths};
use crate::config::Config;
use crate::error::Result;
use crate::git::{Repository, RunLock};
use crate::publish::{PublishOutcome, Publisher};
use crate::schedule::Trigger;
use crate::sync::{self, SyncReport};

/// Runs the pipeline for one configuration.
pub struct Pipeline {
    config: Config,
    history_path: Option<PathBuf>,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            history_path: paths::runs_path(),
        }
    }

    /// Record runs at `path` instead of the user state directory.
    pub fn with_history_path(mut self, path: Option<PathBuf>) -> Self {
        self.history_path = path;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute one run. The trigger is recorded but does not change what runs.
    pub async fn run(&self, trigger: Trigger) -> Result<PublishOutcome> {
        let started_at = Utc::now();
        tracing::info!(trigger = trigger.label(), "Pipeline run starting");

        let result = self.execute().await;

        let outcome = match &result {
            Ok(PublishOutcome::Unchanged) => RunOutcome::Unchanged,
            Ok(PublishOutcome::Published { commit, .. }) => RunOutcome::Published {
                commit: commit.clone(),
            },
            Err(e) => {
                tracing::error!(trigger = trigger.label(), error = %e, "Pipeline run failed");
                RunOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        tracing::info!(trigger = trigger.label(), outcome = outcome.label(), "Pipeline run finished");

        self.record(RunRecord {
            trigger,
            started_at,
            finished_at: Utc::now(),
            outcome,
        });
        result
    }

    async fn execute(&self) -> Result<PublishOutcome> {
        let config = &self.config;
        let repo = Repository::open(&config.workspace, &config.remote, config.token()?);

        // prepare resets the working tree, so an existing clone is locked first.
        let held = if Repository::is_repo(repo.path()) {
            Some(RunLock::acquire(&repo.git_dir())?)
        } else {
            None
        };
        repo.prepare(config.remote_url.as_deref(), &config.branch)
            .await?;
        let _lock = match held {
            Some(lock) => lock,
            None => RunLock::acquire(&repo.git_dir())?,
        };

        log_sync_report(&sync::invoke(config, repo.path()).await?);

        Publisher::new(
            &repo,
            &config.identity,
            &config.branch,
            &config.message_prefix,
        )
        .publish(&config.publish_artifacts())
        .await
    }

    fn record(&self, record: RunRecord) {
        let Some(path) = &self.history_path else {
            return;
        };
        let mut history = RunHistory::load(path);
        history.push(record);
        if let Err(e) = history.save(path) {
            tracing::warn!(path = %path.display(), error = %e, "Could not save run history");
        }
    }
}

fn log_sync_report(report: &SyncReport) {
    match report {
        SyncReport::Command { program } => {
            tracing::info!(program = %program, "Sync command finished");
        }
        SyncReport::Builtin { databases } => {
            for db in databases {
                tracing::info!(
                    database = %db.name,
                    file = %db.cache_file.display(),
                    outcome = ?db.outcome,
                    "Database synced"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncStep;
    use crate::error::SyncError;
    use crate::git::repo::tests::{Fixture, fixture, git_in};

    fn config_for(fx: &Fixture, script: &str) -> Config {
        Config {
            workspace: fx.work.clone(),
            remote_url: Some(fx.remote.to_string_lossy().to_string()),
            token_env: "CACHE_SYNC_TEST_TOKEN_THAT_IS_NOT_SET".to_string(),
            sync: SyncStep::Command {
                program: "sh".to_string(),
                args: vec!["-c".to_string(), script.to_string()],
                timeout_secs: Some(30),
            },
            ..Config::default()
        }
    }

    fn pipeline(fx: &Fixture, script: &str) -> Pipeline {
        let history = fx.remote.parent().unwrap().join("runs.json");
        Pipeline::new(config_for(fx, script)).with_history_path(Some(history))
    }

    fn history(fx: &Fixture) -> RunHistory {
        RunHistory::load(&fx.remote.parent().unwrap().join("runs.json"))
    }

    async fn remote_commits(fx: &Fixture) -> u64 {
        git_in(&fx.remote, &["rev-list", "--count", "main"])
            .await
            .parse()
            .unwrap()
    }

    #[tokio::test]
    async fn test_identical_output_publishes_nothing() {
        let fx = fixture().await;
        let pipeline = pipeline(&fx, "printf '{}\\n' > cache.json");

        let outcome = pipeline.run(Trigger::Manual).await.unwrap();

        assert_eq!(outcome, PublishOutcome::Unchanged);
        assert_eq!(remote_commits(&fx).await, 1);
        assert_eq!(history(&fx).last().unwrap().outcome, RunOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_second_run_without_change_is_idempotent() {
        let fx = fixture().await;
        let pipeline = pipeline(&fx, "printf '{\"n\": 1}\\n' > cache.json");

        let first = pipeline.run(Trigger::Scheduled).await.unwrap();
        let second = pipeline.run(Trigger::Scheduled).await.unwrap();

        assert!(matches!(first, PublishOutcome::Published { .. }));
        assert_eq!(second, PublishOutcome::Unchanged);
        assert_eq!(remote_commits(&fx).await, 2);
        assert_eq!(history(&fx).runs.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_sync_never_publishes() {
        let fx = fixture().await;
        let pipeline = pipeline(&fx, "printf 'partial' > cache.json; exit 1");

        let err = pipeline.run(Trigger::Manual).await.unwrap_err();

        assert!(matches!(err, SyncError::SyncFailed(_)));
        assert_eq!(remote_commits(&fx).await, 1);
        assert!(matches!(
            history(&fx).last().unwrap().outcome,
            RunOutcome::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn test_triggers_run_identical_sequence() {
        let manual_fx = fixture().await;
        let scheduled_fx = fixture().await;
        let script = "printf '{\"n\": 7}\\n' > cache.json";

        let manual = pipeline(&manual_fx, script).run(Trigger::Manual).await.unwrap();
        let scheduled = pipeline(&scheduled_fx, script)
            .run(Trigger::Scheduled)
            .await
            .unwrap();

        assert!(matches!(manual, PublishOutcome::Published { .. }));
        assert!(matches!(scheduled, PublishOutcome::Published { .. }));

        let manual_tree = git_in(&manual_fx.remote, &["rev-parse", "main^{tree}"]).await;
        let scheduled_tree = git_in(&scheduled_fx.remote, &["rev-parse", "main^{tree}"]).await;
        assert_eq!(manual_tree, scheduled_tree);
    }

    /// Commit a change to `file` on the remote from a separate clone.
    async fn push_upstream(fx: &Fixture, file: &str, contents: &str) {
        let root = fx.remote.parent().unwrap();
        let upstream = root.join("upstream");
        if !upstream.exists() {
            let remote = fx.remote.to_string_lossy().to_string();
            git_in(root, &["clone", &remote, "upstream"]).await;
        }
        git_in(&upstream, &["pull", "--ff-only"]).await;
        std::fs::write(upstream.join(file), contents).unwrap();
        git_in(
            &upstream,
            &[
                "-c",
                "user.name=Other",
                "-c",
                "user.email=other@example.com",
                "commit",
                "-am",
                "upstream change",
            ],
        )
        .await;
        git_in(&upstream, &["push", "origin", "main"]).await;
    }

    #[tokio::test]
    async fn test_run_after_rejected_push_publishes() {
        let fx = fixture().await;
        let remote = fx.remote.to_string_lossy().to_string();
        // The first run races a competing push in between prepare and publish.
        let script = format!(
            "if [ ! -d ../race ]; then \
               git clone -q '{remote}' ../race && \
               (cd ../race && echo race > README.md && \
                git -c user.name=Other -c user.email=other@example.com commit -qam race && \
                git push -q origin main); \
             fi; \
             printf '{{\"n\": 9}}\\n' > cache.json"
        );
        let pipeline = pipeline(&fx, &script);

        let err = pipeline.run(Trigger::Scheduled).await.unwrap_err();
        assert!(matches!(err, SyncError::PushRejected { .. }));
        assert_eq!(remote_commits(&fx).await, 2);

        let outcome = pipeline.run(Trigger::Scheduled).await.unwrap();
        assert!(matches!(outcome, PublishOutcome::Published { .. }));
        assert_eq!(remote_commits(&fx).await, 3);

        let readme = git_in(&fx.remote, &["show", "main:README.md"]).await;
        assert_eq!(readme, "race");
    }

    #[tokio::test]
    async fn test_run_after_failed_sync_and_upstream_change() {
        let fx = fixture().await;

        let failing = pipeline(&fx, "printf 'partial' > cache.json; exit 1");
        assert!(failing.run(Trigger::Scheduled).await.is_err());

        push_upstream(&fx, "cache.json", "{\"n\": 1}\n").await;

        let good = pipeline(&fx, "printf '{\"n\": 2}\\n' > cache.json");
        let outcome = good.run(Trigger::Scheduled).await.unwrap();

        assert!(matches!(outcome, PublishOutcome::Published { .. }));
        assert_eq!(remote_commits(&fx).await, 3);
        let cache = git_in(&fx.remote, &["show", "main:cache.json"]).await;
        assert_eq!(cache, "{\"n\": 2}");
    }

    #[tokio::test]
    async fn test_held_lock_blocks_run() {
        let fx = fixture().await;
        let pipeline = pipeline(&fx, "printf '{\"n\": 3}\\n' > cache.json");

        // Clone first so the lock has a git directory to live in.
        pipeline.run(Trigger::Manual).await.unwrap();
        let _held = RunLock::acquire(&fx.work.join(".git")).unwrap();

        let err = pipeline.run(Trigger::Manual).await.unwrap_err();
        assert!(matches!(err, SyncError::Locked(_)));
    }
}
