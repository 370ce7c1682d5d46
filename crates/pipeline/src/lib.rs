//! Source ingestion services.
//!
//! Each service runs one ingestion cycle (fetch, then summarize, then persist) and
//! writes exactly one entry on success. Services hold only shared,
//! immutable handles so several can run side by side.

pub mod error;
pub mod github;

pub use error::IngestionError;
pub use github::{ActivityPayload, GithubIngestion};

use async_trait::async_trait;
use briefing_db::models::information_entry::InformationEntry;

/// One source's fetch → summarize → persist cycle.
#[async_trait]
pub trait IngestionService: Send + Sync {
    /// Short name used in logs and cycle reports (e.g. `"github"`).
    fn name(&self) -> &'static str;

    /// Run a full cycle and return the persisted entry.
    ///
    /// All-or-nothing: no entry is written unless every earlier step
    /// succeeded, and errors are returned to the caller unhandled.
    async fn fetch_and_store_updates(&self) -> Result<InformationEntry, IngestionError>;
}
