use std::time::Duration;

use briefing_github::GithubError;
use briefing_llm::LlmError;

/// Failure of one ingestion cycle, tagged with the step that failed.
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    /// The source API call failed (auth, rate limit, network, config).
    #[error("Fetch failed: {0}")]
    Fetch(#[from] GithubError),

    /// The fetched activity could not be serialized for the prompt.
    #[error("Serializing activity failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Rendering or running the summarization chain failed.
    #[error("Summarization failed: {0}")]
    Summarize(#[from] LlmError),

    /// Fetching and summarizing did not finish within the configured bound.
    /// Nothing was written.
    #[error("Fetch and summarize exceeded timeout of {0:?}")]
    TimedOut(Duration),

    /// Writing the entry failed.
    #[error("Persisting entry failed: {0}")]
    Persist(#[from] sqlx::Error),
}

impl IngestionError {
    /// Name of the failed step, for structured logs.
    pub fn step(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch",
            Self::Serialize(_) => "serialize",
            Self::Summarize(_) => "summarize",
            Self::TimedOut(_) => "timeout",
            Self::Persist(_) => "persist",
        }
    }
}
