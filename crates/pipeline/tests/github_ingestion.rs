//! End-to-end ingestion cycles against a real SQLite store.
//!
//! The GitHub API and the LLM provider are replaced by in-test
//! implementations of [`CommitSource`] and [`CompletionClient`]; the store
//! is the production [`SqliteEntryStore`] on a throw-away database.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use briefing_db::models::information_entry::{EntryFilter, InformationEntry, NewInformationEntry};
use briefing_db::repositories::InformationEntryRepo;
use briefing_db::{EntryStore, SqliteEntryStore};
use briefing_github::{CommitSource, GithubError, RawCommit};
use briefing_llm::{CompletionClient, LlmError, SummarizationChain};
use briefing_pipeline::{GithubIngestion, IngestionError, IngestionService};
use serde_json::json;
use sqlx::SqlitePool;

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

enum FakeSource {
    Commits(Mutex<Vec<Vec<RawCommit>>>),
    Unauthorized,
}

impl FakeSource {
    /// Returns each batch in turn, one per call.
    fn batches(batches: Vec<Vec<RawCommit>>) -> Arc<Self> {
        Arc::new(Self::Commits(Mutex::new(batches)))
    }
}

#[async_trait]
impl CommitSource for FakeSource {
    async fn recent_commits(&self) -> Result<Vec<RawCommit>, GithubError> {
        match self {
            Self::Commits(batches) => {
                let mut batches = batches.lock().unwrap();
                Ok(if batches.is_empty() {
                    Vec::new()
                } else {
                    batches.remove(0)
                })
            }
            Self::Unauthorized => Err(GithubError::Api {
                status: 401,
                body: r#"{"message":"Bad credentials"}"#.to_string(),
            }),
        }
    }
}

struct FakeLlm {
    reply: Result<String, u16>,
    prompts: Mutex<Vec<String>>,
}

impl FakeLlm {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn quota_exceeded() -> Arc<Self> {
        Arc::new(Self {
            reply: Err(429),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionClient for FakeLlm {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(LlmError::Api {
                status: *status,
                body: r#"{"error":{"code":"insufficient_quota"}}"#.to_string(),
            }),
        }
    }
}

/// A store whose writes always fail.
struct BrokenStore {
    attempts: AtomicUsize,
}

#[async_trait]
impl EntryStore for BrokenStore {
    async fn save(&self, _entry: NewInformationEntry) -> Result<InformationEntry, sqlx::Error> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(sqlx::Error::PoolClosed)
    }

    async fn list(&self, _filter: &EntryFilter) -> Result<Vec<InformationEntry>, sqlx::Error> {
        Ok(Vec::new())
    }
}

/// A provider that answers only after `delay`.
struct SlowLlm {
    delay: Duration,
}

#[async_trait]
impl CompletionClient for SlowLlm {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        tokio::time::sleep(self.delay).await;
        Ok("late summary".to_string())
    }
}

/// A real store whose writes start only after `delay`.
struct SlowStore {
    inner: SqliteEntryStore,
    delay: Duration,
}

#[async_trait]
impl EntryStore for SlowStore {
    async fn save(&self, entry: NewInformationEntry) -> Result<InformationEntry, sqlx::Error> {
        tokio::time::sleep(self.delay).await;
        self.inner.save(entry).await
    }

    async fn list(&self, filter: &EntryFilter) -> Result<Vec<InformationEntry>, sqlx::Error> {
        self.inner.list(filter).await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn commit(author: &str, message: &str, timestamp: &str) -> RawCommit {
    json!({"author": author, "message": message, "timestamp": timestamp})
}

fn ingestion(
    source: Arc<dyn CommitSource>,
    llm: Arc<dyn CompletionClient>,
    store: Arc<dyn EntryStore>,
) -> GithubIngestion {
    let chain = SummarizationChain::activity_summary(llm).unwrap();
    GithubIngestion::new(source, chain, store)
}

async fn entry_count(pool: &SqlitePool) -> i64 {
    InformationEntryRepo::count(pool, None).await.unwrap()
}

// ---------------------------------------------------------------------------
// Successful cycles
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn single_commit_produces_one_tagged_entry(pool: SqlitePool) {
    let source = FakeSource::batches(vec![vec![commit("a", "fix bug", "2024-01-01T00:00:00Z")]]);
    let llm = FakeLlm::replying("a fixed a bug");
    let store = Arc::new(SqliteEntryStore::new(pool.clone()));
    let service = ingestion(source, llm.clone(), store);

    let entry = service.fetch_and_store_updates().await.unwrap();

    assert_eq!(entry.content, "a fixed a bug");
    assert_eq!(entry.source, "github");
    assert_eq!(entry.tags, vec!["github", "code", "daily"]);
    assert_eq!(service.name(), "github");

    let stored = InformationEntryRepo::list(&pool, &EntryFilter::default())
        .await
        .unwrap();
    assert_eq!(stored, vec![entry]);

    let prompts = llm.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    let expected_payload = json!({
        "commits": [{"author": "a", "message": "fix bug", "timestamp": "2024-01-01T00:00:00Z"}]
    })
    .to_string();
    assert!(
        prompts[0].contains(&expected_payload),
        "prompt should embed the full payload: {}",
        prompts[0]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn consecutive_cycles_are_not_idempotent(pool: SqlitePool) {
    let source = FakeSource::batches(vec![
        vec![commit("a", "fix bug", "2024-01-01T00:00:00Z")],
        vec![commit("b", "add feature", "2024-01-02T00:00:00Z")],
    ]);
    let llm = FakeLlm::replying("summary");
    let store = Arc::new(SqliteEntryStore::new(pool.clone()));
    let service = ingestion(source, llm, store);

    let first = service.fetch_and_store_updates().await.unwrap();
    let second = service.fetch_and_store_updates().await.unwrap();

    assert_ne!(first.id, second.id);
    assert!(second.created_at > first.created_at);
    assert_eq!(entry_count(&pool).await, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn large_payload_reaches_prompt_intact(pool: SqlitePool) {
    let commits: Vec<RawCommit> = (0..2_000)
        .map(|i| commit("dev", &format!("change number {i} {}", "x".repeat(200)), "2024-01-01T00:00:00Z"))
        .collect();
    let expected_payload = json!({ "commits": commits.clone() }).to_string();
    let source = FakeSource::batches(vec![commits]);
    let llm = FakeLlm::replying("busy day");
    let store = Arc::new(SqliteEntryStore::new(pool.clone()));
    let service = ingestion(source, llm.clone(), store);

    service.fetch_and_store_updates().await.unwrap();

    let prompts = llm.prompts.lock().unwrap();
    assert!(prompts[0].contains(&expected_payload));
}

// ---------------------------------------------------------------------------
// Failed cycles
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn auth_failure_persists_nothing(pool: SqlitePool) {
    let llm = FakeLlm::replying("unused");
    let store = Arc::new(SqliteEntryStore::new(pool.clone()));
    let service = ingestion(Arc::new(FakeSource::Unauthorized), llm.clone(), store);

    let err = service.fetch_and_store_updates().await.unwrap_err();

    assert_matches!(err, IngestionError::Fetch(ref e) if e.is_auth_failure());
    assert_eq!(err.step(), "fetch");
    assert_eq!(llm.prompt_count(), 0);
    assert_eq!(entry_count(&pool).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn quota_failure_persists_nothing(pool: SqlitePool) {
    let source = FakeSource::batches(vec![vec![commit("a", "fix bug", "2024-01-01T00:00:00Z")]]);
    let llm = FakeLlm::quota_exceeded();
    let store = Arc::new(SqliteEntryStore::new(pool.clone()));
    let service = ingestion(source, llm.clone(), store);

    let err = service.fetch_and_store_updates().await.unwrap_err();

    assert_matches!(err, IngestionError::Summarize(ref e) if e.is_quota_exceeded());
    assert_eq!(llm.prompt_count(), 1);
    assert_eq!(entry_count(&pool).await, 0);
}

#[tokio::test]
async fn store_failure_is_returned() {
    let source = FakeSource::batches(vec![vec![commit("a", "fix bug", "2024-01-01T00:00:00Z")]]);
    let llm = FakeLlm::replying("a fixed a bug");
    let store = Arc::new(BrokenStore {
        attempts: AtomicUsize::new(0),
    });
    let service = ingestion(source, llm, store.clone());

    let err = service.fetch_and_store_updates().await.unwrap_err();

    assert_matches!(err, IngestionError::Persist(sqlx::Error::PoolClosed));
    assert_eq!(store.attempts.load(Ordering::SeqCst), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failure_then_success_writes_once(pool: SqlitePool) {
    let store: Arc<dyn EntryStore> = Arc::new(SqliteEntryStore::new(pool.clone()));
    let source = FakeSource::batches(vec![vec![commit("a", "fix bug", "2024-01-01T00:00:00Z")]]);

    let failing = ingestion(source.clone(), FakeLlm::quota_exceeded(), store.clone());
    assert!(failing.fetch_and_store_updates().await.is_err());

    let working = ingestion(
        FakeSource::batches(vec![vec![commit("a", "fix bug", "2024-01-01T00:00:00Z")]]),
        FakeLlm::replying("ok"),
        store,
    );
    working.fetch_and_store_updates().await.unwrap();

    assert_eq!(entry_count(&pool).await, 1);
}

// ---------------------------------------------------------------------------
// Timeout
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn slow_summary_times_out_without_writing(pool: SqlitePool) {
    let source = FakeSource::batches(vec![vec![commit("a", "fix bug", "2024-01-01T00:00:00Z")]]);
    let store = Arc::new(SqliteEntryStore::new(pool.clone()));
    let service = ingestion(
        source,
        Arc::new(SlowLlm {
            delay: Duration::from_secs(5),
        }),
        store,
    )
    .with_timeout(Some(Duration::from_millis(50)));

    let err = service.fetch_and_store_updates().await.unwrap_err();

    assert_matches!(err, IngestionError::TimedOut(d) if d == Duration::from_millis(50));
    assert_eq!(err.step(), "timeout");
    assert_eq!(entry_count(&pool).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn timeout_does_not_cut_short_the_save(pool: SqlitePool) {
    let source = FakeSource::batches(vec![vec![commit("a", "fix bug", "2024-01-01T00:00:00Z")]]);
    let store = Arc::new(SlowStore {
        inner: SqliteEntryStore::new(pool.clone()),
        delay: Duration::from_millis(200),
    });
    let service = ingestion(source, FakeLlm::replying("saved anyway"), store)
        .with_timeout(Some(Duration::from_millis(50)));

    let entry = service.fetch_and_store_updates().await.unwrap();

    assert_eq!(entry.content, "saved anyway");
    assert_eq!(entry_count(&pool).await, 1);
}
