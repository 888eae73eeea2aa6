// Trigger sources and the periodic scheduler.
// Fires on wall-clock aligned intervals and never overlaps runs inside one process.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// What started a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Scheduled,
    Manual,
}

impl Trigger {
    pub fn label(&self) -> &'static str {
        match self {
            Trigger::Scheduled => "scheduled",
            Trigger::Manual => "manual",
        }
    }
}

/// Fixed-period schedule aligned to the Unix epoch, so a 30 minute period
/// fires at :00 and :30 of every hour like `*/30 * * * *`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    period_secs: i64,
}

impl Schedule {
    /// Create a schedule; periods shorter than a second are rounded up.
    pub fn every(period: Duration) -> Self {
        Self {
            period_secs: period.as_secs().max(1) as i64,
        }
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs as u64)
    }

    /// The first fire time strictly after `t`.
    pub fn next_after(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        let next = (t.timestamp().div_euclid(self.period_secs) + 1) * self.period_secs;
        Utc.timestamp_opt(next, 0).single().unwrap_or(t)
    }

    /// Time to wait from `now` until `at`, zero if already past.
    pub fn wait_until(at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
        at.signed_duration_since(now)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// Periodic driver for a job.
pub struct Scheduler {
    schedule: Schedule,
}

impl Scheduler {
    pub fn new(schedule: Schedule) -> Self {
        Self { schedule }
    }

    /// Run `job` on every fire time until `shutdown` resolves.
    ///
    /// The next fire time is computed after the job finishes, so ticks that
    /// elapse while a run is executing are skipped instead of queued.
    /// Shutdown is only observed between runs; an in-flight job always
    /// completes. When `run_now` is set the first run starts immediately.
    pub async fn run_until<F, Fut, S>(&self, run_now: bool, shutdown: S, mut job: F)
    where
        F: FnMut(Trigger) -> Fut,
        Fut: Future<Output = ()>,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        if run_now {
            job(Trigger::Scheduled).await;
        }

        loop {
            let now = Utc::now();
            let next = self.schedule.next_after(now);
            tracing::info!(next = %next.format("%Y-%m-%d %H:%M:%S UTC"), "Next scheduled run");

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Scheduler stopping");
                    return;
                }
                _ = tokio::time::sleep(Schedule::wait_until(next, now)) => {}
            }

            job(Trigger::Scheduled).await;
        }
    }
}
