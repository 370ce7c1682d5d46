//! Information entry model, insert DTO, and query filter.

use briefing_core::types::{EntryId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity structs
// ---------------------------------------------------------------------------

/// A persisted summary of activity from one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InformationEntry {
    pub id: EntryId,
    pub content: String,
    pub source: String,
    pub tags: Vec<String>,
    pub created_at: Timestamp,
}

/// A row from the `information_entries` table.
///
/// `tags` is stored as a JSON array in a TEXT column.
#[derive(Debug, Clone, FromRow)]
pub struct InformationEntryRow {
    pub id: EntryId,
    pub content: String,
    pub source: String,
    pub tags: Json<Vec<String>>,
    pub created_at: Timestamp,
}

impl From<InformationEntryRow> for InformationEntry {
    fn from(row: InformationEntryRow) -> Self {
        Self {
            id: row.id,
            content: row.content,
            source: row.source,
            tags: row.tags.0,
            created_at: row.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// DTO for inserting a new entry. `id` and `created_at` are assigned by the
/// store at write time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewInformationEntry {
    pub content: String,
    pub source: String,
    pub tags: Vec<String>,
}

/// Query filter for listing entries. All fields are optional; unset fields
/// do not constrain the result.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryFilter {
    /// Exact match on `source`.
    pub source: Option<String>,
    /// Entries whose tag list contains this tag.
    pub tag: Option<String>,
    /// Entries created at or after this instant.
    pub since: Option<Timestamp>,
    /// Maximum rows returned (defaults to 100, capped at 1000).
    pub limit: Option<i64>,
}

impl EntryFilter {
    pub fn by_source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::default()
        }
    }
}
