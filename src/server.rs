//! HTTP server initialization and runtime setup.
//!
//! Selects the product store, assembles the message bus and runs the Axum
//! server until a shutdown signal arrives.

use crate::application::{MessageBus, default_handlers};
use crate::config::Config;
use crate::domain::repositories::ProductRepository;
use crate::infrastructure::notifications::{LogNotifier, Notifications, NullNotifier};
use crate::infrastructure::persistence::{InMemoryProductRepository, PgProductRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Connects to PostgreSQL with the configured pool settings and applies
/// pending migrations.
///
/// # Errors
///
/// Returns an error if the connection or a migration fails.
pub async fn connect_database(config: &Config, database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    Ok(pool)
}

/// Builds the product store selected by the configuration.
///
/// # Errors
///
/// Returns an error if a database is configured but unreachable.
pub async fn build_repository(config: &Config) -> Result<Arc<dyn ProductRepository>> {
    match config.database_url {
        Some(ref url) => {
            let pool = connect_database(config, url).await?;
            Ok(Arc::new(PgProductRepository::new(Arc::new(pool))))
        }
        None => {
            tracing::warn!("No database configured, products are kept in memory");
            Ok(Arc::new(InMemoryProductRepository::new()))
        }
    }
}

/// Builds the shared application state: store, handlers and bus.
///
/// # Errors
///
/// Returns an error if the product store cannot be initialized.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let repository = build_repository(config).await?;

    let notifier: Arc<dyn Notifications> = if config.notifications_enabled {
        tracing::info!("Out-of-stock notifications go to {}", config.notify_recipient);
        Arc::new(LogNotifier::new())
    } else {
        tracing::info!("Notifications disabled (NullNotifier)");
        Arc::new(NullNotifier::new())
    };

    let registry = default_handlers(notifier, &config.notify_recipient);
    let bus = MessageBus::new(registry, config.retry_policy());

    Ok(AppState::new(repository, Arc::new(bus)))
}

/// Runs the HTTP server with the given configuration.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let state = build_state(&config).await?;
    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
