//! Cron-driven trigger for the daily briefing.
//!
//! [`DailyScheduler`] evaluates a cron expression in UTC and drives a single
//! background loop: sleep until the next fire time, run one orchestrator
//! cycle inline, repeat. Because the cycle runs inside the loop, triggers
//! that elapse while a cycle is still running are skipped (and logged)
//! rather than started concurrently.

use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use briefing_core::error::CoreError;
use chrono::{DateTime, Utc};
use cron::Schedule;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::orchestrator::Orchestrator;

/// A parsed cron schedule.
///
/// Accepts the classic five-field form (`min hour dom month dow`) as well
/// as the six/seven-field form with seconds (and year) understood by the
/// `cron` crate. Day-of-week numbers follow the `cron` crate (1 = Sunday);
/// names such as `Mon-Fri` are unambiguous.
#[derive(Debug, Clone)]
pub struct DailyScheduler {
    expression: String,
    schedule: Schedule,
}

impl DailyScheduler {
    pub fn new(expression: &str) -> Result<Self, CoreError> {
        let expression = normalize(expression);
        let schedule = Schedule::from_str(&expression).map_err(|e| {
            CoreError::Validation(format!("invalid cron expression '{expression}': {e}"))
        })?;

        if schedule.upcoming(Utc).next().is_none() {
            return Err(CoreError::Validation(format!(
                "cron expression '{expression}' never fires"
            )));
        }

        Ok(Self {
            expression,
            schedule,
        })
    }

    /// The normalized (seconds-first) expression.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First fire time strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }

    /// Number of fire times in `(start, end]`.
    pub fn fires_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> usize {
        self.schedule
            .after(&start)
            .take_while(|t| *t <= end)
            .count()
    }

    /// Run the scheduling loop until `cancel` is triggered.
    ///
    /// Cancellation interrupts the wait between cycles but never a running
    /// cycle; the loop exits once the in-flight cycle completes.
    pub async fn run(&self, orchestrator: Arc<Orchestrator>, cancel: CancellationToken) {
        tracing::info!(schedule = %self.expression, "Briefing scheduler started");

        loop {
            let now = Utc::now();
            let Some(next) = self.next_after(now) else {
                tracing::warn!(schedule = %self.expression, "No upcoming fire time, scheduler exiting");
                break;
            };
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            tracing::info!(next_run = %next, wait_secs = wait.as_secs(), "Next briefing scheduled");

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Briefing scheduler stopping");
                    break;
                }
                _ = tokio::time::sleep(wait) => {}
            }

            // Failures are logged by the orchestrator; the schedule carries on.
            let _ = orchestrator.run_cycle().await;

            let skipped = self.fires_between(next, Utc::now());
            if skipped > 0 {
                tracing::warn!(
                    skipped,
                    "Scheduled triggers elapsed while a cycle was running and were skipped"
                );
            }

            if cancel.is_cancelled() {
                tracing::info!("Briefing scheduler stopping");
                break;
            }
        }
    }
}

/// How the scheduler task ended under [`supervise`].
#[derive(Debug, PartialEq, Eq)]
pub enum SchedulerExit {
    /// Shutdown was requested and the loop finished within the grace period.
    Shutdown,
    /// Shutdown was requested but the in-flight cycle outlived the grace
    /// period; the task was aborted.
    Abandoned,
    /// The loop returned on its own before any shutdown request.
    Stopped,
    /// The task panicked or was cancelled before any shutdown request.
    Failed(String),
}

impl SchedulerExit {
    /// Whether the process should exit with a failure status.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Stopped | Self::Failed(_))
    }
}

/// Wait for either `shutdown` or the end of the scheduler task.
///
/// On shutdown, `cancel` is triggered and the task gets `grace` to finish
/// its in-flight cycle. The scheduler loop only returns when cancelled, so
/// the task ending first is reported as a failure.
pub async fn supervise(
    mut handle: JoinHandle<()>,
    shutdown: impl Future<Output = ()>,
    cancel: &CancellationToken,
    grace: Duration,
) -> SchedulerExit {
    tokio::select! {
        () = shutdown => {
            cancel.cancel();
            tracing::info!(grace_secs = grace.as_secs(), "Waiting for briefing scheduler to stop");
            match tokio::time::timeout(grace, &mut handle).await {
                Ok(_) => SchedulerExit::Shutdown,
                Err(_) => {
                    tracing::warn!("Briefing cycle did not finish before shutdown timeout, abandoning it");
                    handle.abort();
                    SchedulerExit::Abandoned
                }
            }
        }
        joined = &mut handle => match joined {
            Ok(()) => {
                tracing::error!("Briefing scheduler stopped unexpectedly");
                SchedulerExit::Stopped
            }
            Err(e) => {
                tracing::error!(error = %e, "Briefing scheduler task failed");
                SchedulerExit::Failed(e.to_string())
            }
        },
    }
}

/// Prefix a seconds field onto five-field expressions.
fn normalize(expression: &str) -> String {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    if fields.len() == 5 {
        format!("0 {}", fields.join(" "))
    } else {
        fields.join(" ")
    }
}
