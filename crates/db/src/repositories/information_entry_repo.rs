//! Repository for the `information_entries` table.

use briefing_core::types::{EntryId, Timestamp};
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::models::information_entry::{
    EntryFilter, InformationEntry, InformationEntryRow, NewInformationEntry,
};

/// Column list for `information_entries` queries.
const COLUMNS: &str = "id, content, source, tags, created_at";

/// Default page size for [`InformationEntryRepo::list`].
const DEFAULT_LIMIT: i64 = 100;

/// Upper bound on the page size for [`InformationEntryRepo::list`].
const MAX_LIMIT: i64 = 1000;

/// Provides insert and query operations for information entries.
pub struct InformationEntryRepo;

impl InformationEntryRepo {
    /// Insert a new entry with a caller-assigned id and timestamp, returning
    /// the stored row.
    pub async fn insert(
        pool: &SqlitePool,
        id: EntryId,
        input: &NewInformationEntry,
        created_at: Timestamp,
    ) -> Result<InformationEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO information_entries (id, content, source, tags, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, InformationEntryRow>(&query)
            .bind(id)
            .bind(&input.content)
            .bind(&input.source)
            .bind(Json(&input.tags))
            .bind(created_at)
            .fetch_one(pool)
            .await?;
        Ok(row.into())
    }

    /// Find an entry by id.
    pub async fn find_by_id(
        pool: &SqlitePool,
        id: EntryId,
    ) -> Result<Option<InformationEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM information_entries WHERE id = ?1");
        let row = sqlx::query_as::<_, InformationEntryRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// List entries matching `filter`, oldest first.
    pub async fn list(
        pool: &SqlitePool,
        filter: &EntryFilter,
    ) -> Result<Vec<InformationEntry>, sqlx::Error> {
        let limit = filter.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let query = format!(
            "SELECT {COLUMNS} FROM information_entries \
             WHERE (?1 IS NULL OR source = ?1) \
               AND (?2 IS NULL OR EXISTS ( \
                    SELECT 1 FROM json_each(information_entries.tags) \
                    WHERE json_each.value = ?2)) \
               AND (?3 IS NULL OR created_at >= ?3) \
             ORDER BY created_at ASC, rowid ASC \
             LIMIT ?4"
        );
        let rows = sqlx::query_as::<_, InformationEntryRow>(&query)
            .bind(filter.source.as_deref())
            .bind(filter.tag.as_deref())
            .bind(filter.since)
            .bind(limit)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Count entries, optionally restricted to one source.
    pub async fn count(pool: &SqlitePool, source: Option<&str>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_entries WHERE (?1 IS NULL OR source = ?1)",
        )
        .bind(source)
        .fetch_one(pool)
        .await
    }
}
