use std::str::FromStr;
use std::time::Duration;

use briefing_core::error::CoreError;
use briefing_github::config::MAX_LOOKBACK_HOURS;
use briefing_github::GithubConfig;
use briefing_llm::LlmConfig;

use crate::scheduler::DailyScheduler;

/// Default SQLite database, relative to the working directory.
const DEFAULT_DATABASE_URL: &str = "sqlite://briefing.db";

/// Default cadence: every day at 08:00 UTC.
const DEFAULT_SCHEDULE: &str = "0 8 * * *";

/// Default time allowed for an in-flight cycle to finish at shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Worker configuration loaded from environment variables.
///
/// Credentials and repository identifiers are optional at load time; the
/// client that needs them reports their absence when a cycle runs.
/// Malformed values (bad numbers, bad cron expressions) are rejected here.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub github: GithubConfig,
    pub llm: LlmConfig,
    pub schedule: DailyScheduler,
    /// Run one cycle immediately at startup, before the first scheduled one.
    pub run_on_startup: bool,
    /// Bound on the fetch and summarize steps of a cycle; the save is not cut short.
    pub cycle_timeout: Option<Duration>,
    /// How long shutdown waits for an in-flight cycle.
    pub shutdown_timeout: Duration,
}

impl WorkerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                       | Default                     |
    /// |-------------------------------|-----------------------------|
    /// | `DATABASE_URL`                | `sqlite://briefing.db`      |
    /// | `GITHUB_TOKEN`                | --                          |
    /// | `GITHUB_ORG`                  | --                          |
    /// | `GITHUB_REPO`                 | --                          |
    /// | `GITHUB_API_URL`              | `https://api.github.com`    |
    /// | `GITHUB_LOOKBACK_HOURS`       | `24`                        |
    /// | `GITHUB_PER_PAGE`             | `30`                        |
    /// | `GITHUB_TIMEOUT_SECS`         | `20`                        |
    /// | `OPENAI_API_KEY`              | --                          |
    /// | `OPENAI_API_BASE`             | `https://api.openai.com/v1` |
    /// | `OPENAI_MODEL`                | `gpt-4o`                    |
    /// | `OPENAI_TEMPERATURE`          | provider default            |
    /// | `OPENAI_TIMEOUT_SECS`         | `120`                       |
    /// | `BRIEFING_SCHEDULE`           | `0 8 * * *` (UTC)           |
    /// | `BRIEFING_RUN_ON_STARTUP`     | `false`                     |
    /// | `BRIEFING_CYCLE_TIMEOUT_SECS` | unset (no timeout)          |
    /// | `SHUTDOWN_TIMEOUT_SECS`       | `30`                        |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let github_defaults = GithubConfig::default();
        let github = GithubConfig {
            api_url: var("GITHUB_API_URL").unwrap_or(github_defaults.api_url),
            token: var("GITHUB_TOKEN"),
            owner: var("GITHUB_ORG"),
            repo: var("GITHUB_REPO"),
            lookback_hours: parse_or(&var, "GITHUB_LOOKBACK_HOURS", github_defaults.lookback_hours)?,
            per_page: parse_or(&var, "GITHUB_PER_PAGE", github_defaults.per_page)?,
            request_timeout: parse_secs(&var, "GITHUB_TIMEOUT_SECS")?
                .unwrap_or(github_defaults.request_timeout),
        };
        if !(1..=MAX_LOOKBACK_HOURS).contains(&github.lookback_hours) {
            return Err(CoreError::Validation(format!(
                "GITHUB_LOOKBACK_HOURS must be between 1 and {MAX_LOOKBACK_HOURS}"
            )));
        }

        let llm_defaults = LlmConfig::default();
        let llm = LlmConfig {
            api_base: var("OPENAI_API_BASE").unwrap_or(llm_defaults.api_base),
            api_key: var("OPENAI_API_KEY"),
            model: var("OPENAI_MODEL").unwrap_or(llm_defaults.model),
            temperature: parse_opt(&var, "OPENAI_TEMPERATURE")?,
            request_timeout: parse_secs(&var, "OPENAI_TIMEOUT_SECS")?
                .unwrap_or(llm_defaults.request_timeout),
        };

        let expression = var("BRIEFING_SCHEDULE").unwrap_or_else(|| DEFAULT_SCHEDULE.to_string());
        let schedule = DailyScheduler::new(&expression)?;

        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            github,
            llm,
            schedule,
            run_on_startup: parse_bool(&var, "BRIEFING_RUN_ON_STARTUP")?.unwrap_or(false),
            cycle_timeout: parse_secs(&var, "BRIEFING_CYCLE_TIMEOUT_SECS")?,
            shutdown_timeout: parse_secs(&var, "SHUTDOWN_TIMEOUT_SECS")?
                .unwrap_or(Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS)),
        })
    }
}

fn parse_opt<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, CoreError> {
    var(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| CoreError::Validation(format!("{key} has invalid value '{raw}'")))
        })
        .transpose()
}

fn parse_or<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, CoreError> {
    Ok(parse_opt(var, key)?.unwrap_or(default))
}

fn parse_secs(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<Duration>, CoreError> {
    match parse_opt::<u64>(var, key)? {
        Some(0) => Err(CoreError::Validation(format!("{key} must be greater than zero"))),
        other => Ok(other.map(Duration::from_secs)),
    }
}

fn parse_bool(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<bool>, CoreError> {
    var(key)
        .map(|raw| match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(CoreError::Validation(format!(
                "{key} must be a boolean, got '{raw}'"
            ))),
        })
        .transpose()
}
