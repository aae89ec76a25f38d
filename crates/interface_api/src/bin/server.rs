//! Ledger API Server Binary
//!
//! Starts the HTTP API over PostgreSQL storage.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin ledger-api
//!
//! # Run with environment variables
//! LEDGER_PORT=8080 LEDGER_DATABASE_URL=postgres://... cargo run --bin ledger-api
//! ```
//!
//! # Environment Variables
//!
//! * `LEDGER_HOST` - Server host (default: 0.0.0.0)
//! * `LEDGER_PORT` - Server port (default: 8080)
//! * `LEDGER_JWT_SECRET` - JWT signing secret (required in production)
//! * `LEDGER_DATABASE_URL` - PostgreSQL connection string
//! * `LEDGER_LOG_LEVEL` - Log level or filter directive (default: info); `RUST_LOG` wins
//! * `LEDGER_LOG_FORMAT` - `text` or `json` (default: text)
//! * `LEDGER_MAX_CONNECTIONS` - Pool size (default: 10)
//! * `LEDGER_LOCK_TIMEOUT_MS` - Account lock wait bound (default: 5000)
//! * `LEDGER_DEFAULT_PAGE_LIMIT` / `LEDGER_MAX_PAGE_LIMIT` - Listing bounds (default: 20 / 100)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use domain_ledger::TransactionCoordinator;
use infra_db::{create_pool, run_migrations, PostgresLedgerStore};
use interface_api::{
    config::{ApiConfig, LogFormat},
    create_router,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Main entry point for the API server.
///
/// Initializes logging, loads configuration, connects and migrates the
/// database, and serves until Ctrl+C or SIGTERM.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("loading configuration")?;
    config.validate().context("validating configuration")?;

    init_tracing(&config.log_level, config.log_format);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting ledger API server"
    );

    let database = config.database_config();
    tracing::info!("Connecting to database...");
    let pool = create_pool(database.clone())
        .await
        .context("connecting to database")?;

    tracing::info!("Running database migrations...");
    run_migrations(&pool).await.context("running migrations")?;

    let store = PostgresLedgerStore::new(pool, database.lock_timeout);
    let coordinator =
        TransactionCoordinator::new(Arc::new(store)).with_limits(config.listing_limits());

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .context("parsing server address")?;
    let app = create_router(coordinator, config);

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await.context("binding listener")?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Installs the global subscriber; `RUST_LOG` overrides the configured level
fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// If a handler cannot be installed that branch never completes; the
/// other one still shuts the server down.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
