//! `PostgreSQL` RSVP store.

use crate::rows::{
    AttendanceRow, EVENT_COLUMNS, RsvpEntryRow, SUMMARY_COLUMNS, convert_all, decode_status,
};
use planner_core::error::StoreError;
use planner_core::store::{RsvpStore, StoreFuture};
use planner_core::types::{Attendance, EventId, Rsvp, RsvpEntry, RsvpStatus, UserId};
use sqlx::PgPool;

/// Name of the foreign key from `rsvps.event_id` to `events.id`.
const EVENT_FK: &str = "rsvps_event_fk";

/// RSVP table access.
///
/// The `(user_id, event_id)` primary key makes [`RsvpStore::upsert`] a
/// single `INSERT ... SELECT ... ON CONFLICT DO UPDATE`, which only
/// selects the event while it is public.
#[derive(Clone, Debug)]
pub struct PostgresRsvpStore {
    pool: PgPool,
}

impl PostgresRsvpStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl PostgresRsvpStore {
    /// Why an upsert inserted nothing.
    async fn rejection(&self, event_id: EventId) -> StoreError {
        let visibility: Result<Option<(bool,)>, sqlx::Error> =
            sqlx::query_as("SELECT is_public FROM events WHERE id = $1")
                .bind(event_id.as_uuid())
                .fetch_optional(&self.pool)
                .await;
        match visibility {
            Ok(None) => StoreError::EventMissing(event_id),
            Ok(Some((false,))) => StoreError::EventNotPublic(event_id),
            Ok(Some((true,))) => {
                StoreError::Database(format!("RSVP to event {event_id} was not recorded"))
            }
            Err(e) => StoreError::Database(format!("Failed to load event: {e}")),
        }
    }
}

impl RsvpStore for PostgresRsvpStore {
    fn get_by_user_and_event(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> StoreFuture<'_, Option<Rsvp>> {
        Box::pin(async move {
            let row: Option<(String,)> =
                sqlx::query_as("SELECT status FROM rsvps WHERE user_id = $1 AND event_id = $2")
                    .bind(user_id.as_str())
                    .bind(event_id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| StoreError::Database(format!("Failed to load RSVP: {e}")))?;

            row.map(|(status,)| {
                Ok(Rsvp {
                    user_id,
                    event_id,
                    status: decode_status(&status)?,
                })
            })
            .transpose()
        })
    }

    fn upsert(
        &self,
        user_id: UserId,
        event_id: EventId,
        status: RsvpStatus,
    ) -> StoreFuture<'_, Rsvp> {
        Box::pin(async move {
            // Only public events take the row; visibility and write are one statement.
            let stored: Option<(String,)> = sqlx::query_as(
                "INSERT INTO rsvps (user_id, event_id, status)
                 SELECT $1, e.id, $3 FROM events e WHERE e.id = $2 AND e.is_public
                 ON CONFLICT (user_id, event_id) DO UPDATE
                 SET status = EXCLUDED.status, updated_at = now()
                 RETURNING status",
            )
            .bind(user_id.as_str())
            .bind(event_id.as_uuid())
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() && db_err.constraint() == Some(EVENT_FK) {
                        return StoreError::EventMissing(event_id);
                    }
                }
                StoreError::Database(format!("Failed to upsert RSVP: {e}"))
            })?;

            let Some((stored,)) = stored else {
                return Err(self.rejection(event_id).await);
            };

            metrics::counter!("planner.postgres.rsvp_upserts").increment(1);
            Ok(Rsvp {
                user_id,
                event_id,
                status: decode_status(&stored)?,
            })
        })
    }

    fn list_by_event(&self, event_id: EventId) -> StoreFuture<'_, Vec<Attendance>> {
        Box::pin(async move {
            let rows: Vec<AttendanceRow> = sqlx::query_as(
                "SELECT r.user_id, u.name, u.email, r.status
                 FROM rsvps r
                 LEFT JOIN users u ON u.id = r.user_id
                 WHERE r.event_id = $1
                 ORDER BY r.created_at ASC, r.user_id ASC",
            )
            .bind(event_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to list RSVPs: {e}")))?;

            convert_all(rows)
        })
    }

    fn list_by_user(&self, user_id: UserId) -> StoreFuture<'_, Vec<RsvpEntry>> {
        Box::pin(async move {
            let query = format!(
                "SELECT r.status AS rsvp_status, {EVENT_COLUMNS}, {SUMMARY_COLUMNS}
                 FROM rsvps r
                 JOIN events e ON e.id = r.event_id
                 LEFT JOIN users u ON u.id = e.owner_id
                 WHERE r.user_id = $1
                 ORDER BY e.date ASC, e.id ASC"
            );
            let rows: Vec<RsvpEntryRow> = sqlx::query_as(&query)
                .bind(user_id.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StoreError::Database(format!("Failed to list user RSVPs: {e}")))?;

            convert_all(rows)
        })
    }
}
