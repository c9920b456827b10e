//! Session lookup and health probe backed by `PostgreSQL`.

use planner_core::error::StoreError;
use planner_core::store::{IdentityProvider, Readiness, StoreFuture};
use planner_core::types::{Identity, UserId};
use sqlx::PgPool;

/// Resolves session tokens from the `sessions` table.
///
/// Expired sessions resolve to no identity.
#[derive(Clone, Debug)]
pub struct PostgresIdentityProvider {
    pool: PgPool,
}

impl PostgresIdentityProvider {
    /// Create a provider over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl IdentityProvider for PostgresIdentityProvider {
    fn current_identity(&self, credential: String) -> StoreFuture<'_, Option<Identity>> {
        Box::pin(async move {
            let row: Option<(String, Option<String>, Option<String>)> = sqlx::query_as(
                "SELECT u.id, u.name, u.email
                 FROM sessions s
                 JOIN users u ON u.id = s.user_id
                 WHERE s.token = $1 AND s.expires_at > now()",
            )
            .bind(&credential)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to resolve session: {e}")))?;

            Ok(row.map(|(id, name, email)| Identity {
                id: UserId::new(id),
                name,
                email,
            }))
        })
    }
}

/// Readiness probe issuing `SELECT 1`.
#[derive(Clone, Debug)]
pub struct PostgresReadiness {
    pool: PgPool,
}

impl PostgresReadiness {
    /// Create a probe over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl Readiness for PostgresReadiness {
    fn check(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Database(format!("Health check failed: {e}")))?;
            Ok(())
        })
    }
}
