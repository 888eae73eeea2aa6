// Change-detecting publisher.
// Stages artifacts, commits them only when they differ from HEAD, and pushes the result.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::config::Identity;
use crate::error::Result;
use crate::git::Repository;

/// Timestamp layout used in commit messages.
pub const MESSAGE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// What the publisher did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Unchanged,
    Published { commit: String, message: String },
}

/// Build the commit message for a publish at `at`.
pub fn commit_message(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{}: {}", prefix, at.format(MESSAGE_TIME_FORMAT))
}

/// Commits and pushes artifacts for one repository.
pub struct Publisher<'a> {
    repo: &'a Repository,
    identity: &'a Identity,
    branch: &'a str,
    message_prefix: &'a str,
}

impl<'a> Publisher<'a> {
    pub fn new(
        repo: &'a Repository,
        identity: &'a Identity,
        branch: &'a str,
        message_prefix: &'a str,
    ) -> Self {
        Self {
            repo,
            identity,
            branch,
            message_prefix,
        }
    }

    /// Publish `artifacts` if any of them changed.
    ///
    /// Never creates an empty commit. A rejected push is returned as an
    /// error without retrying; the local commit stays until the next
    /// `Repository::prepare` resets the workspace to the remote branch.
    pub async fn publish(&self, artifacts: &[PathBuf]) -> Result<PublishOutcome> {
        let staged = self.repo.stage(artifacts).await?;
        if staged.is_empty() || !self.repo.has_staged_changes(&staged).await? {
            tracing::info!("No changes to commit");
            return Ok(PublishOutcome::Unchanged);
        }

        let message = commit_message(self.message_prefix, Utc::now());
        let commit = self.repo.commit(&message, self.identity, &staged).await?;
        tracing::info!(commit = %commit, message = %message, "Committed artifacts");

        self.repo.push(self.branch).await?;
        tracing::info!(branch = self.branch, commit = %commit, "Pushed");

        Ok(PublishOutcome::Published { commit, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::git::repo::tests::{fixture, git_in};
    use chrono::TimeZone;

    #[test]
    fn test_commit_message_format() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 9, 5, 7).unwrap();
        assert_eq!(
            commit_message("🤖 Auto-update cache", at),
            "🤖 Auto-update cache: 2026-10-19 09:05:07 UTC"
        );
    }

    #[tokio::test]
    async fn test_unchanged_creates_no_commit() {
        let fx = fixture().await;
        let url = fx.remote.to_string_lossy().to_string();
        let repo = Repository::open(&fx.work, "origin", None);
        repo.prepare(Some(&url), "main").await.unwrap();
        let identity = Identity::default();

        let publisher = Publisher::new(&repo, &identity, "main", "🤖 Auto-update cache");
        let outcome = publisher
            .publish(&[PathBuf::from("cache.json")])
            .await
            .unwrap();

        assert_eq!(outcome, PublishOutcome::Unchanged);
        assert_eq!(repo.commit_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_changed_artifact_is_committed_and_pushed() {
        let fx = fixture().await;
        let url = fx.remote.to_string_lossy().to_string();
        let repo = Repository::open(&fx.work, "origin", None);
        repo.prepare(Some(&url), "main").await.unwrap();
        let identity = Identity::default();

        std::fs::write(fx.work.join("cache.json"), "{\"results\": []}\n").unwrap();
        std::fs::write(fx.work.join("README.md"), "local edit\n").unwrap();

        let before = Utc::now().timestamp();
        let publisher = Publisher::new(&repo, &identity, "main", "🤖 Auto-update cache");
        let outcome = publisher
            .publish(&[PathBuf::from("cache.json")])
            .await
            .unwrap();
        let after = Utc::now().timestamp();

        let PublishOutcome::Published { commit, message } = outcome else {
            panic!("expected a published outcome");
        };
        assert_eq!(repo.commit_count().await.unwrap(), 2);

        let author = git_in(&fx.work, &["log", "-1", "--format=%an <%ae>"]).await;
        assert_eq!(
            author,
            "github-actions[bot] <41898283+github-actions[bot]@users.noreply.github.com>"
        );

        let stamp = message
            .strip_prefix("🤖 Auto-update cache: ")
            .and_then(|s| s.strip_suffix(" UTC"))
            .unwrap();
        let parsed = chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc()
            .timestamp();
        assert!(parsed >= before - 1 && parsed <= after);

        // Only the artifact went into the commit.
        let files = git_in(&fx.work, &["show", "--name-only", "--format=", "HEAD"]).await;
        assert_eq!(files, "cache.json");

        let remote_head = git_in(&fx.remote, &["rev-parse", "main"]).await;
        assert_eq!(remote_head, commit);
    }

    #[tokio::test]
    async fn test_rejected_push_is_not_retried() {
        let fx = fixture().await;
        let url = fx.remote.to_string_lossy().to_string();
        let repo = Repository::open(&fx.work, "origin", None);
        repo.prepare(Some(&url), "main").await.unwrap();
        let identity = Identity::default();

        // Someone else pushes first.
        let other = fx.work.parent().unwrap().join("other");
        let other_str = other.to_string_lossy().to_string();
        git_in(fx.work.parent().unwrap(), &["clone", &url, &other_str]).await;
        std::fs::write(other.join("README.md"), "race\n").unwrap();
        git_in(
            &other,
            &[
                "-c",
                "user.name=Other",
                "-c",
                "user.email=other@example.com",
                "commit",
                "-am",
                "race",
            ],
        )
        .await;
        git_in(&other, &["push", "origin", "main"]).await;

        std::fs::write(fx.work.join("cache.json"), "{\"n\": 2}\n").unwrap();
        let publisher = Publisher::new(&repo, &identity, "main", "🤖 Auto-update cache");
        let err = publisher
            .publish(&[PathBuf::from("cache.json")])
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::PushRejected { .. }));
    }
}
