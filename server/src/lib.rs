//! Event planner HTTP server.
//!
//! Wires the `PostgreSQL` stores into the engine, serves the HTTP API and
//! the Prometheus exporter, and shuts down gracefully on Ctrl+C or SIGTERM.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod metrics;

pub use config::Config;

use anyhow::Context;
use planner_core::environment::SystemClock;
use planner_core::{Engine, EngineConfig};
use planner_postgres::{
    PgPool, PostgresEventStore, PostgresIdentityProvider, PostgresReadiness, PostgresRsvpStore,
    connect, run_migrations,
};
use planner_web::{AppState, build_router};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::Notify;
use tracing::{error, info, warn};

/// Application state over a connected pool.
#[must_use]
pub fn build_state(pool: PgPool, engine_config: EngineConfig) -> AppState {
    let engine = Engine::new(
        Arc::new(PostgresEventStore::new(pool.clone())),
        Arc::new(PostgresRsvpStore::new(pool.clone())),
        Arc::new(SystemClock),
        engine_config,
    );
    AppState::new(
        Arc::new(engine),
        Arc::new(PostgresIdentityProvider::new(pool.clone())),
        Arc::new(PostgresReadiness::new(pool)),
    )
}

/// Run the server until a shutdown signal arrives.
///
/// # Errors
///
/// Returns an error if the metrics exporter, the database or the listener
/// cannot be set up, or if serving fails.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let mut metrics_server = None;
    if let Some(addr) = config.server.metrics_addr() {
        let mut server = metrics::MetricsServer::new(addr);
        server
            .start()
            .await
            .context("Failed to start metrics server")?;
        metrics_server = Some(server);
    }

    info!("Connecting to PostgreSQL...");
    let pool = connect(&config.postgres.pool_settings())
        .await
        .context("Failed to connect to PostgreSQL")?;
    if config.postgres.run_migrations {
        run_migrations(&pool)
            .await
            .context("Failed to apply migrations")?;
        info!("Migrations applied");
    }

    let state = build_state(pool.clone(), config.engine.engine_config());
    let app = build_router(state, &config.server.cors_origins);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(address = %addr, "Server listening");

    let draining = Arc::new(Notify::new());
    let serve = axum::serve(listener, app)
        .with_graceful_shutdown({
            let draining = Arc::clone(&draining);
            async move {
                shutdown_signal().await;
                draining.notify_one();
            }
        })
        .into_future();
    tokio::pin!(serve);

    tokio::select! {
        result = &mut serve => result?,
        () = draining.notified() => {
            let grace = Duration::from_secs(config.server.shutdown_timeout);
            match tokio::time::timeout(grace, &mut serve).await {
                Ok(result) => result?,
                Err(_) => warn!(timeout_secs = grace.as_secs(), "Graceful shutdown timed out"),
            }
        }
    }

    pool.close().await;
    drop(metrics_server);
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
