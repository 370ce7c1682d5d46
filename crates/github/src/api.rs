//! REST client for the GitHub commits endpoint.
//!
//! Wraps `GET /repos/{owner}/{repo}/commits` using [`reqwest`]. Commit
//! records are returned as raw JSON so the summarization payload carries
//! whatever GitHub sends.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};

use crate::config::{GithubConfig, MAX_LOOKBACK_HOURS, MAX_PER_PAGE};

/// A commit record exactly as returned by the GitHub API.
pub type RawCommit = serde_json::Value;

/// Value sent in the `User-Agent` header (GitHub rejects requests without one).
const USER_AGENT_VALUE: &str = "daily-briefing";

/// REST API version pinned via the `X-GitHub-Api-Version` header.
const API_VERSION: &str = "2022-11-28";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from the GitHub REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    /// A required setting was not configured.
    #[error("GitHub configuration missing: {0} must be set")]
    MissingConfig(&'static str),

    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// GitHub returned a non-2xx status code.
    #[error("GitHub API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The lookback window is not a positive number of hours within range.
    #[error("Invalid lookback window: {0} hours")]
    InvalidLookback(i64),

    /// The response body was not the expected JSON array.
    #[error("Unexpected GitHub response: {0}")]
    UnexpectedPayload(String),
}

impl GithubError {
    /// Whether GitHub rejected the credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Api { status: 401, .. } | Self::MissingConfig("GITHUB_TOKEN"))
    }

    /// Whether the request hit a primary or secondary rate limit.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::Api { status: 429, .. } => true,
            Self::Api { status: 403, body } => body.to_ascii_lowercase().contains("rate limit"),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// CommitSource
// ---------------------------------------------------------------------------

/// A source of recent commit activity for one repository.
#[async_trait]
pub trait CommitSource: Send + Sync {
    /// Commits inside the configured recent window, newest first.
    async fn recent_commits(&self) -> Result<Vec<RawCommit>, GithubError>;
}

// ---------------------------------------------------------------------------
// GithubApi
// ---------------------------------------------------------------------------

/// HTTP client for one configured repository.
pub struct GithubApi {
    client: reqwest::Client,
    config: GithubConfig,
}

/// Credentials and target resolved from [`GithubConfig`] at call time.
struct Target<'a> {
    token: &'a str,
    owner: &'a str,
    repo: &'a str,
}

impl GithubApi {
    /// Create a client with a per-request timeout taken from `config`.
    pub fn new(config: GithubConfig) -> Result<Self, GithubError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .default_headers(default_headers())
            .build()?;
        Ok(Self { client, config })
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: GithubConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &GithubConfig {
        &self.config
    }

    /// List commits on the default branch made after `since`.
    ///
    /// Sends `GET /repos/{owner}/{repo}/commits?since=..&per_page=..`.
    pub async fn list_commits(&self, since: DateTime<Utc>) -> Result<Vec<RawCommit>, GithubError> {
        let target = self.target()?;
        let url = format!(
            "{}/repos/{}/{}/commits",
            self.config.api_url.trim_end_matches('/'),
            target.owner,
            target.repo
        );
        let since = since.to_rfc3339_opts(SecondsFormat::Secs, true);
        let per_page = self.config.per_page.clamp(1, MAX_PER_PAGE).to_string();

        tracing::debug!(%url, %since, %per_page, "Fetching GitHub commits");

        let response = self
            .client
            .get(&url)
            .bearer_auth(target.token)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .query(&[("since", since.as_str()), ("per_page", per_page.as_str())])
            .send()
            .await?;

        let body: serde_json::Value = Self::ensure_success(response).await?.json().await?;
        match body {
            serde_json::Value::Array(commits) => Ok(commits),
            other => Err(GithubError::UnexpectedPayload(format!(
                "expected a JSON array of commits, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Start of the recent-activity window relative to `now`.
    ///
    /// Lookbacks outside `1..=MAX_LOOKBACK_HOURS` are rejected rather than
    /// clamped.
    pub fn window_start(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, GithubError> {
        let hours = self.config.lookback_hours;
        if !(1..=MAX_LOOKBACK_HOURS).contains(&hours) {
            return Err(GithubError::InvalidLookback(hours));
        }
        TimeDelta::try_hours(hours)
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or(GithubError::InvalidLookback(hours))
    }

    // ---- private helpers ----

    fn target(&self) -> Result<Target<'_>, GithubError> {
        Ok(Target {
            token: required(&self.config.token, "GITHUB_TOKEN")?,
            owner: required(&self.config.owner, "GITHUB_ORG")?,
            repo: required(&self.config.repo, "GITHUB_REPO")?,
        })
    }

    /// Return the response unchanged on success, or a
    /// [`GithubError::Api`] carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, GithubError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GithubError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl CommitSource for GithubApi {
    async fn recent_commits(&self) -> Result<Vec<RawCommit>, GithubError> {
        let since = self.window_start(Utc::now())?;
        let commits = self.list_commits(since).await?;
        tracing::info!(
            owner = self.config.owner.as_deref().unwrap_or_default(),
            repo = self.config.repo.as_deref().unwrap_or_default(),
            commit_count = commits.len(),
            "Fetched recent GitHub commits"
        );
        Ok(commits)
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    headers
}

/// A configured value, treating blank strings as unset.
fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, GithubError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(GithubError::MissingConfig(name))
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
