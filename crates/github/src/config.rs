use std::time::Duration;

/// Default REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default activity window: the last 24 hours.
pub const DEFAULT_LOOKBACK_HOURS: i64 = 24;

/// Longest accepted activity window: one year.
pub const MAX_LOOKBACK_HOURS: i64 = 24 * 365;

/// Default page size for the commits listing.
pub const DEFAULT_PER_PAGE: u32 = 30;

/// GitHub allows at most 100 items per page.
pub const MAX_PER_PAGE: u32 = 100;

/// Default timeout for a single API request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Connection and targeting settings for [`GithubApi`](crate::GithubApi).
///
/// `token`, `owner`, and `repo` are optional here and checked when a fetch
/// is attempted, so a worker can start without them and report the gap in
/// the failed cycle.
#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    /// How far back the commits window reaches from the time of the fetch.
    pub lookback_hours: i64,
    /// Maximum commits requested (clamped to [`MAX_PER_PAGE`]).
    pub per_page: u32,
    pub request_timeout: Duration,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            owner: None,
            repo: None,
            lookback_hours: DEFAULT_LOOKBACK_HOURS,
            per_page: DEFAULT_PER_PAGE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
