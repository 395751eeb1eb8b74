use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use clap::Parser;
use geoscope_analysis::{AnalysisClient, HttpAnalysisBackend};
use geoscope_core::config::{CliConfigOverrides, LayeredConfig};
use geoscope_store::memory::MemoryStore;
use geoscope_store::ports::{GeometryStore, TaskLedger};
use geoscope_store::postgres::{PostgresConfig, PostgresStore};
use geoscope_tasks::{NotificationRelay, TaskOrchestrator};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geoscope_api::config::ApiConfig;
use geoscope_api::create_router;
use geoscope_api::state::AppState;

/// GeoScope API server
#[derive(Debug, Parser)]
#[command(name = "geoscope-api", version, about)]
struct Args {
    /// TOML configuration file (defaults to $GEOSCOPE_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long)]
    cors_origin: Option<String>,

    /// PostgreSQL URL; in-memory storage when unset
    #[arg(long)]
    database_url: Option<String>,

    /// Base URL of the analysis service
    #[arg(long)]
    analysis_url: Option<String>,

    #[arg(long)]
    analysis_deadline_secs: Option<u64>,

    #[arg(long)]
    max_concurrent_dispatches: Option<usize>,
}

impl Args {
    fn overrides(&self) -> CliConfigOverrides {
        CliConfigOverrides {
            port: self.port,
            cors_origin: self.cors_origin.clone(),
            database_url: self.database_url.clone(),
            analysis_url: self.analysis_url.clone(),
            analysis_deadline_secs: self.analysis_deadline_secs,
            max_concurrent_dispatches: self.max_concurrent_dispatches,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geoscope_api=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let layered = LayeredConfig::load(args.config.as_deref(), args.overrides())
        .context("Failed to load configuration")?;
    let config = ApiConfig::from_layered(&layered);

    tracing::info!(
        port = config.port,
        analysis_url = %config.analysis_url,
        storage = if config.uses_postgres() { "postgres" } else { "memory" },
        "Starting GeoScope API server"
    );

    let (store, ledger, storage_backend) = init_storage(&config).await?;

    let backend = HttpAnalysisBackend::new(config.analysis_url.clone())
        .context("Failed to create analysis client")?;
    let analysis = Arc::new(AnalysisClient::new(backend).with_policy(config.retry));

    let orchestrator = TaskOrchestrator::new(
        store.clone(),
        ledger.clone(),
        analysis,
        NotificationRelay::new(config.relay_capacity),
        config.orchestrator(),
    );

    // Work left behind by a previous process
    let stale = orchestrator.fail_stale(config.stale_task_age).await?;
    let resumed = orchestrator.resume_pending().await?;
    tracing::info!(stale, resumed, "Recovered analysis tasks");

    let state = Arc::new(AppState::new(store, ledger, orchestrator, storage_backend));

    let origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin '{}'", config.cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = create_router(state).layer(cors).layer(TraceLayer::new_for_http());

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("CORS enabled for {}", config.cors_origin);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

/// Select the storage backend based on `database_url`
async fn init_storage(
    config: &ApiConfig,
) -> anyhow::Result<(Arc<dyn GeometryStore>, Arc<dyn TaskLedger>, &'static str)> {
    match &config.database_url {
        Some(database_url) => {
            tracing::info!("database_url configured, connecting to PostgreSQL...");
            let pg_config =
                PostgresConfig::new(database_url.clone()).context("Invalid database_url")?;
            let store = PostgresStore::new(pg_config).await.context(
                "Failed to connect to PostgreSQL. Ensure PostgreSQL with PostGIS is running \
                 and the database exists",
            )?;
            let store = Arc::new(store);
            let geometry: Arc<dyn GeometryStore> = store.clone();
            let ledger: Arc<dyn TaskLedger> = store;
            Ok((geometry, ledger, "postgres"))
        }
        None => {
            tracing::info!("Using in-memory storage (set DATABASE_URL for PostgreSQL)");
            let store = MemoryStore::new();
            let geometry: Arc<dyn GeometryStore> = Arc::new(store.clone());
            let ledger: Arc<dyn TaskLedger> = Arc::new(store);
            Ok((geometry, ledger, "memory"))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
