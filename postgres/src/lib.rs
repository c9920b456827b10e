//! `PostgreSQL` stores for the event planner.
//!
//! This crate provides production implementations of the persistence traits
//! from `planner-core`, built on sqlx:
//!
//! - [`PostgresEventStore`]: events with aggregated RSVP counts
//! - [`PostgresRsvpStore`]: RSVPs, upserted atomically on `(user_id, event_id)`
//! - [`PostgresIdentityProvider`]: session token lookup
//! - [`PostgresReadiness`]: health probe
//!
//! Every session opened by [`connect`] carries a `statement_timeout`, so a
//! stuck query is cancelled server-side as well as abandoned by the engine.
//!
//! # Example
//!
//! ```ignore
//! use planner_postgres::{PoolSettings, connect, run_migrations};
//!
//! let pool = connect(&PoolSettings::new("postgres://localhost/planner")).await?;
//! run_migrations(&pool).await?;
//! let events = PostgresEventStore::new(pool.clone());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod event_store;
mod identity;
mod rows;
mod rsvp_store;

pub use event_store::PostgresEventStore;
pub use identity::{PostgresIdentityProvider, PostgresReadiness};
pub use rsvp_store::PostgresRsvpStore;
pub use sqlx::PgPool;

use planner_core::error::StoreError;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Connection pool settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolSettings {
    /// Connection string
    pub url: String,
    /// Maximum pool size
    pub max_connections: u32,
    /// How long to wait for a free connection
    pub acquire_timeout: Duration,
    /// Server-side limit on any single statement
    pub statement_timeout: Duration,
}

impl PoolSettings {
    /// Settings with defaults for everything but the URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
            statement_timeout: Duration::from_secs(5),
        }
    }
}

/// Open a connection pool.
///
/// # Errors
///
/// Returns [`StoreError::Database`] if the URL is invalid or the database
/// cannot be reached.
pub async fn connect(settings: &PoolSettings) -> Result<PgPool, StoreError> {
    let options = PgConnectOptions::from_str(&settings.url)
        .map_err(|e| StoreError::Database(format!("Invalid database URL: {e}")))?
        .options([(
            "statement_timeout",
            settings.statement_timeout.as_millis().to_string(),
        )]);

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect_with(options)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to connect: {e}")))?;

    tracing::info!(
        max_connections = settings.max_connections,
        statement_timeout_ms =
            u64::try_from(settings.statement_timeout.as_millis()).unwrap_or(u64::MAX),
        "Connected to PostgreSQL"
    );
    Ok(pool)
}

/// Apply the embedded schema migrations.
///
/// # Errors
///
/// Returns [`StoreError::Database`] if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
    Ok(())
}
