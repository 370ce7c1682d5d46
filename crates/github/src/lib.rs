//! GitHub REST API client used by the daily briefing.
//!
//! - [`GithubApi`]: thin `reqwest` wrapper for the commits endpoint.
//! - [`CommitSource`]: the seam ingestion services fetch through.
//! - [`GithubConfig`]: token, target repository, and fetch window.

pub mod api;
pub mod config;

pub use api::{CommitSource, GithubApi, GithubError, RawCommit};
pub use config::GithubConfig;
