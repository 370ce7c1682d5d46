//! GitHub daily summary ingestion.
//!
//! Fetches the recent commit window, serializes it as
//! `{"commits": [...]}`, asks the LLM for a summary, and stores the result
//! tagged `github` / `code` / `daily`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use briefing_core::sources::{github_daily_tags, SOURCE_GITHUB};
use briefing_db::models::information_entry::{InformationEntry, NewInformationEntry};
use briefing_db::EntryStore;
use briefing_github::{CommitSource, RawCommit};
use briefing_llm::SummarizationChain;
use serde::Serialize;

use crate::error::IngestionError;
use crate::IngestionService;

/// Activity sent to the summarizer, keyed by activity type.
///
/// Only commits are collected today; pull requests and issues would be
/// added here as sibling keys.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityPayload {
    pub commits: Vec<RawCommit>,
}

impl ActivityPayload {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Ingestion service for one GitHub repository.
pub struct GithubIngestion {
    source: Arc<dyn CommitSource>,
    chain: SummarizationChain,
    store: Arc<dyn EntryStore>,
    timeout: Option<Duration>,
}

impl GithubIngestion {
    pub fn new(
        source: Arc<dyn CommitSource>,
        chain: SummarizationChain,
        store: Arc<dyn EntryStore>,
    ) -> Self {
        Self {
            source,
            chain,
            store,
            timeout: None,
        }
    }

    /// Bound the fetch and summarize steps.
    ///
    /// The save is never cut short: once a summary exists it is either
    /// persisted or the persist error is returned.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    async fn fetch_and_summarize(&self) -> Result<(usize, String), IngestionError> {
        let commits = self.source.recent_commits().await?;
        let commit_count = commits.len();

        let payload = ActivityPayload { commits }.to_json()?;
        tracing::debug!(commit_count, payload_len = payload.len(), "Activity payload built");

        let summary = self.chain.summarize_activity(payload).await?;
        Ok((commit_count, summary))
    }
}

#[async_trait]
impl IngestionService for GithubIngestion {
    fn name(&self) -> &'static str {
        SOURCE_GITHUB
    }

    async fn fetch_and_store_updates(&self) -> Result<InformationEntry, IngestionError> {
        let (commit_count, summary) = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.fetch_and_summarize())
                .await
                .map_err(|_| IngestionError::TimedOut(limit))??,
            None => self.fetch_and_summarize().await?,
        };

        let entry = self
            .store
            .save(NewInformationEntry {
                content: summary,
                source: SOURCE_GITHUB.to_string(),
                tags: github_daily_tags(),
            })
            .await?;

        tracing::info!(
            entry_id = %entry.id,
            commit_count,
            summary_len = entry.content.len(),
            "GitHub summary stored"
        );
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_keyed_by_activity_type() {
        let payload = ActivityPayload {
            commits: vec![serde_json::json!({"sha": "abc", "commit": {"message": "m"}})],
        };
        let json: serde_json::Value = serde_json::from_str(&payload.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"commits": [{"sha": "abc", "commit": {"message": "m"}}]})
        );
    }

    #[test]
    fn empty_window_still_serializes() {
        let payload = ActivityPayload { commits: vec![] };
        assert_eq!(payload.to_json().unwrap(), r#"{"commits":[]}"#);
    }
}
