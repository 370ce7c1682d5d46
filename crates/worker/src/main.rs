use std::sync::Arc;

use briefing_db::{EntryStore, SqliteEntryStore};
use briefing_github::{CommitSource, GithubApi};
use briefing_llm::{CompletionClient, OpenAiClient, SummarizationChain};
use briefing_pipeline::{GithubIngestion, IngestionService};
use briefing_worker::config::WorkerConfig;
use briefing_worker::orchestrator::Orchestrator;
use briefing_worker::scheduler::supervise;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = match WorkerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    tracing::info!(schedule = %config.schedule.expression(), "Briefing worker starting");

    // --- Database ---
    let pool = briefing_db::create_pool(&config.database_url)
        .await
        .expect("Failed to open database");
    briefing_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    briefing_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    // --- Ingestion services ---
    let store: Arc<dyn EntryStore> = Arc::new(SqliteEntryStore::new(pool.clone()));
    let source: Arc<dyn CommitSource> =
        Arc::new(GithubApi::new(config.github.clone()).expect("Failed to build GitHub client"));
    let llm: Arc<dyn CompletionClient> =
        Arc::new(OpenAiClient::new(config.llm.clone()).expect("Failed to build LLM client"));
    let chain = SummarizationChain::activity_summary(llm).expect("Invalid summary prompt");

    let services: Vec<Arc<dyn IngestionService>> = vec![Arc::new(
        GithubIngestion::new(source, chain, store).with_timeout(config.cycle_timeout),
    )];
    let orchestrator = Arc::new(Orchestrator::new(services));

    if config.run_on_startup {
        // Outcome is logged by the orchestrator.
        let _ = orchestrator.run_cycle().await;
    }

    // --- Scheduler ---
    let cancel = CancellationToken::new();
    let scheduler = config.schedule.clone();
    let scheduler_handle = {
        let orchestrator = Arc::clone(&orchestrator);
        let cancel = cancel.clone();
        tokio::spawn(async move { scheduler.run(orchestrator, cancel).await })
    };

    let exit = supervise(
        scheduler_handle,
        shutdown_signal(),
        &cancel,
        config.shutdown_timeout,
    )
    .await;

    pool.close().await;
    if exit.is_failure() {
        std::process::exit(1);
    }
    tracing::info!("Graceful shutdown complete");
}

/// Console logging filtered by `RUST_LOG`; `LOG_FORMAT=json` switches to
/// JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "briefing_worker=info,briefing_pipeline=info,briefing_github=info,briefing_llm=info,briefing_db=info"
            .into()
    });

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let fmt_layer = if json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
