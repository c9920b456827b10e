//! `PostgreSQL` event store.

use crate::rows::{
    AttendanceRow, EVENT_COLUMNS, EventRow, SUMMARY_COLUMNS, SummaryRow, contains_pattern,
    convert_all,
};
use planner_core::error::StoreError;
use planner_core::form::EventDraft;
use planner_core::store::{EventStore, StoreFuture};
use planner_core::types::{
    Audience, Event, EventDetail, EventId, EventQuery, EventSummary, TimeWindow, UserId,
};
use sqlx::PgPool;

/// Events table access.
///
/// RSVP counts are aggregated per query, never stored.
#[derive(Clone, Debug)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl EventStore for PostgresEventStore {
    fn create(&self, owner: UserId, draft: EventDraft) -> StoreFuture<'_, Event> {
        Box::pin(async move {
            let query = format!(
                "INSERT INTO events AS e
                     (id, title, description, date, location, max_attendees, is_public, owner_id)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 RETURNING {EVENT_COLUMNS}"
            );
            let id = EventId::new();
            let row: EventRow = sqlx::query_as(&query)
                .bind(id.as_uuid())
                .bind(&draft.title)
                .bind(&draft.description)
                .bind(draft.date)
                .bind(&draft.location)
                .bind(draft.max_attendees.map(i64::from))
                .bind(draft.is_public)
                .bind(owner.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| StoreError::Database(format!("Failed to insert event: {e}")))?;

            let event = Event::try_from(row)?;
            tracing::debug!(event_id = %event.id, "Inserted event");
            Ok(event)
        })
    }

    fn get_by_id(&self, id: EventId) -> StoreFuture<'_, Option<Event>> {
        Box::pin(async move {
            let query = format!("SELECT {EVENT_COLUMNS} FROM events e WHERE e.id = $1");
            let row: Option<EventRow> = sqlx::query_as(&query)
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Database(format!("Failed to load event: {e}")))?;

            row.map(Event::try_from).transpose()
        })
    }

    fn get_detail(&self, id: EventId) -> StoreFuture<'_, Option<EventDetail>> {
        Box::pin(async move {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| StoreError::Database(format!("Failed to begin transaction: {e}")))?;

            let query = format!(
                "SELECT {EVENT_COLUMNS}, {SUMMARY_COLUMNS}
                 FROM events e
                 LEFT JOIN users u ON u.id = e.owner_id
                 WHERE e.id = $1"
            );
            let row: Option<SummaryRow> = sqlx::query_as(&query)
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| StoreError::Database(format!("Failed to load event: {e}")))?;

            let Some(row) = row else {
                return Ok(None);
            };

            let attendees: Vec<AttendanceRow> = sqlx::query_as(
                "SELECT r.user_id, u.name, u.email, r.status
                 FROM rsvps r
                 LEFT JOIN users u ON u.id = r.user_id
                 WHERE r.event_id = $1
                 ORDER BY r.created_at ASC, r.user_id ASC",
            )
            .bind(id.as_uuid())
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to load RSVPs: {e}")))?;

            tx.commit()
                .await
                .map_err(|e| StoreError::Database(format!("Failed to commit: {e}")))?;

            let summary = EventSummary::try_from(row)?;
            Ok(Some(EventDetail::new(
                summary.event,
                summary.owner,
                convert_all(attendees)?,
            )))
        })
    }

    fn update(&self, id: EventId, draft: EventDraft) -> StoreFuture<'_, Option<Event>> {
        Box::pin(async move {
            let query = format!(
                "UPDATE events AS e
                 SET title = $2, description = $3, date = $4, location = $5,
                     max_attendees = $6, is_public = $7, updated_at = now()
                 WHERE e.id = $1
                 RETURNING {EVENT_COLUMNS}"
            );
            let row: Option<EventRow> = sqlx::query_as(&query)
                .bind(id.as_uuid())
                .bind(&draft.title)
                .bind(&draft.description)
                .bind(draft.date)
                .bind(&draft.location)
                .bind(draft.max_attendees.map(i64::from))
                .bind(draft.is_public)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Database(format!("Failed to update event: {e}")))?;

            row.map(Event::try_from).transpose()
        })
    }

    fn delete(&self, id: EventId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            // RSVPs go with it through ON DELETE CASCADE.
            let result = sqlx::query("DELETE FROM events WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Database(format!("Failed to delete event: {e}")))?;

            Ok(result.rows_affected() > 0)
        })
    }

    fn list(&self, query: EventQuery) -> StoreFuture<'_, Vec<EventSummary>> {
        Box::pin(async move {
            let (from, before) = match query.window {
                TimeWindow::Any => (None, None),
                TimeWindow::From(instant) => (Some(instant), None),
                TimeWindow::Before(instant) => (None, Some(instant)),
            };
            let (viewer_mode, user) = match &query.audience {
                Audience::Viewer(viewer) => (true, viewer.as_ref().map(UserId::as_str)),
                Audience::Owner(owner) => (false, Some(owner.as_str())),
            };
            let pattern = query.search.as_deref().map(contains_pattern);

            let sql = format!(
                "SELECT {EVENT_COLUMNS}, {SUMMARY_COLUMNS}
                 FROM events e
                 LEFT JOIN users u ON u.id = e.owner_id
                 WHERE ($1::text IS NULL
                        OR e.title ILIKE $1 OR e.description ILIKE $1 OR e.location ILIKE $1)
                   AND ($2::timestamptz IS NULL OR e.date >= $2)
                   AND ($3::timestamptz IS NULL OR e.date < $3)
                   AND CASE WHEN $4
                            THEN e.is_public OR COALESCE(e.owner_id = $5, FALSE)
                            ELSE COALESCE(e.owner_id = $5, FALSE)
                       END
                 ORDER BY e.date ASC, e.id ASC"
            );
            let rows: Vec<SummaryRow> = sqlx::query_as(&sql)
                .bind(pattern)
                .bind(from)
                .bind(before)
                .bind(viewer_mode)
                .bind(user)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StoreError::Database(format!("Failed to list events: {e}")))?;

            convert_all(rows)
        })
    }
}
