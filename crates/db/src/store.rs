//! Storage seam for ingestion services.
//!
//! Services depend on [`EntryStore`] rather than on SQLite directly, so the
//! storage engine can be swapped and tests can substitute their own store.

use async_trait::async_trait;
use briefing_core::clock::MonotonicClock;
use uuid::Uuid;

use crate::models::information_entry::{EntryFilter, InformationEntry, NewInformationEntry};
use crate::repositories::InformationEntryRepo;
use crate::DbPool;

/// Durable, queryable storage of information entries.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Persist a new entry, assigning its id and creation timestamp.
    async fn save(&self, entry: NewInformationEntry) -> Result<InformationEntry, sqlx::Error>;

    /// List entries matching `filter`, oldest first.
    async fn list(&self, filter: &EntryFilter) -> Result<Vec<InformationEntry>, sqlx::Error>;
}

/// [`EntryStore`] backed by the `information_entries` table.
pub struct SqliteEntryStore {
    pool: DbPool,
    clock: MonotonicClock,
}

impl SqliteEntryStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            clock: MonotonicClock::new(),
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl EntryStore for SqliteEntryStore {
    async fn save(&self, entry: NewInformationEntry) -> Result<InformationEntry, sqlx::Error> {
        let id = Uuid::now_v7();
        let created_at = self.clock.now();

        let saved = InformationEntryRepo::insert(&self.pool, id, &entry, created_at).await?;
        tracing::debug!(
            entry_id = %saved.id,
            source = %saved.source,
            content_len = saved.content.len(),
            "Information entry saved"
        );
        Ok(saved)
    }

    async fn list(&self, filter: &EntryFilter) -> Result<Vec<InformationEntry>, sqlx::Error> {
        InformationEntryRepo::list(&self.pool, filter).await
    }
}
