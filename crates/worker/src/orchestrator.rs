//! Daily briefing cycle.
//!
//! The [`Orchestrator`] runs every registered ingestion service once, in
//! registration order, and reports which entries were written. It tracks an
//! `idle -> running -> idle` flag so at most one cycle is active at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use briefing_core::types::{EntryId, Timestamp};
use briefing_pipeline::{IngestionError, IngestionService};
use chrono::Utc;

/// Failure of one orchestrator cycle.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("Ingestion service '{service}' failed: {source}")]
    Ingestion {
        service: &'static str,
        #[source]
        source: IngestionError,
    },

    #[error("A cycle is already running")]
    AlreadyRunning,
}

/// Entry written by one service during a cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceOutcome {
    pub service: &'static str,
    pub entry_id: EntryId,
}

/// Summary of a completed cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    pub outcomes: Vec<ServiceOutcome>,
}

/// Sequences ingestion services into a single cycle.
pub struct Orchestrator {
    services: Vec<Arc<dyn IngestionService>>,
    running: AtomicBool,
}

impl Orchestrator {
    pub fn new(services: Vec<Arc<dyn IngestionService>>) -> Self {
        Self {
            services,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run one cycle.
    ///
    /// Stops at the first failing service; entries already written by
    /// earlier services stay persisted. Every outcome is logged here, so
    /// callers driving a schedule may discard the result.
    pub async fn run_cycle(&self) -> Result<CycleReport, OrchestratorError> {
        let Some(_guard) = RunningGuard::acquire(&self.running) else {
            tracing::warn!("Briefing cycle requested while another is running, skipping");
            return Err(OrchestratorError::AlreadyRunning);
        };

        let started_at = Utc::now();
        tracing::info!(services = self.services.len(), "Starting daily briefing task...");

        match self.run_services().await {
            Ok(outcomes) => {
                let finished_at = Utc::now();
                tracing::info!(
                    entries = outcomes.len(),
                    elapsed_ms = (finished_at - started_at).num_milliseconds(),
                    "Daily briefing task finished"
                );
                Ok(CycleReport {
                    started_at,
                    finished_at,
                    outcomes,
                })
            }
            Err(e) => {
                match &e {
                    OrchestratorError::Ingestion { service, source } => tracing::error!(
                        service,
                        step = source.step(),
                        error = %source,
                        "Daily briefing task failed"
                    ),
                    other => tracing::error!(error = %other, "Daily briefing task failed"),
                }
                Err(e)
            }
        }
    }

    async fn run_services(&self) -> Result<Vec<ServiceOutcome>, OrchestratorError> {
        let mut outcomes = Vec::with_capacity(self.services.len());
        for service in &self.services {
            let entry = service
                .fetch_and_store_updates()
                .await
                .map_err(|source| OrchestratorError::Ingestion {
                    service: service.name(),
                    source,
                })?;
            tracing::info!(service = service.name(), entry_id = %entry.id, "Ingestion service finished");
            outcomes.push(ServiceOutcome {
                service: service.name(),
                entry_id: entry.id,
            });
        }
        Ok(outcomes)
    }
}

/// Holds the running flag for the lifetime of a cycle.
///
/// Dropping the guard (including when the cycle future is cancelled)
/// returns the orchestrator to idle.
struct RunningGuard<'a>(&'a AtomicBool);

impl<'a> RunningGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
