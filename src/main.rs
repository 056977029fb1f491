//! Local Library Server
//!
//! Catalog and loan management REST API server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use local_library_server::{
    config::{AppConfig, LoggingConfig, SessionBackend},
    create_router,
    repository::Repository,
    services::{
        redis::RedisSessionStore,
        sessions::{MemorySessionStore, SessionStore},
        Services,
    },
    AppState,
};

/// Install the global subscriber. The returned guard flushes the log file on drop.
fn init_tracing(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("local_library_server={},tower_http=debug", config.level).into()
    });

    let (file_writer, guard) = match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "local-library.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(fmt::layer().json())
            .with(file_writer.map(|w| fmt::layer().json().with_writer(w)))
            .init();
    } else {
        registry
            .with(fmt::layer())
            .with(file_writer.map(|w| fmt::layer().with_ansi(false).with_writer(w)))
            .init();
    }

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let _log_guard = init_tracing(&config.logging);

    tracing::info!("Starting Local Library Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let session_store: Arc<dyn SessionStore> = match config.session.backend {
        SessionBackend::Redis => {
            let store =
                RedisSessionStore::new(&config.session.redis_url, config.session.ttl_seconds)
                    .await
                    .context("Failed to connect to Redis")?;
            tracing::info!("Connected to Redis session store");
            Arc::new(store)
        }
        SessionBackend::Memory => {
            tracing::warn!("Using in-memory sessions; visit counts are lost on restart");
            Arc::new(MemorySessionStore::new())
        }
    };

    let repository = Arc::new(Repository::new(pool));
    let services = Services::new(
        repository.clone(),
        repository,
        config.auth.clone(),
        session_store,
    );

    services
        .auth
        .ensure_bootstrap_user()
        .await
        .context("Failed to create bootstrap account")?;

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };
    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
