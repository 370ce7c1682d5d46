//! Well-known source names and tag sets.
//!
//! These must match the `source` and `tags` values written to the
//! `information_entries` table by each ingestion path.

/// Source tag for entries produced by the GitHub ingestion path.
pub const SOURCE_GITHUB: &str = "github";

/// Tags attached to every GitHub daily summary, in storage order.
pub const GITHUB_DAILY_TAGS: [&str; 3] = ["github", "code", "daily"];

/// Owned copy of [`GITHUB_DAILY_TAGS`] for building insert DTOs.
pub fn github_daily_tags() -> Vec<String> {
    GITHUB_DAILY_TAGS.iter().map(|t| t.to_string()).collect()
}
