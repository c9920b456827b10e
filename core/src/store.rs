//! Persistence seams consumed by the engine.
//!
//! Every trait here is dyn-compatible: methods take owned arguments and
//! return boxed futures, so the engine can hold `Arc<dyn EventStore>` and
//! friends without being generic over the backend.
//!
//! # Implementations
//!
//! - `PostgresEventStore` and friends (in `planner-postgres`): production
//! - `InMemoryStore` (in `planner-testing`): fast, deterministic tests

use crate::error::StoreError;
use crate::form::EventDraft;
use crate::types::{
    Attendance, Event, EventDetail, EventId, EventQuery, EventSummary, Identity, Rsvp,
    RsvpEntry, RsvpStatus, UserId,
};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by store methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Storage for events and their aggregated read models.
///
/// Implementations must be `Send + Sync`; a single instance is shared by
/// every request.
pub trait EventStore: Send + Sync {
    /// Persist a new event owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn create(&self, owner: UserId, draft: EventDraft) -> StoreFuture<'_, Event>;

    /// Load a single event.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails. A missing event is `Ok(None)`.
    fn get_by_id(&self, id: EventId) -> StoreFuture<'_, Option<Event>>;

    /// Load an event together with its owner and respondents.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails. A missing event is `Ok(None)`.
    fn get_detail(&self, id: EventId) -> StoreFuture<'_, Option<EventDetail>>;

    /// Replace the editable fields of an event. The owner never changes.
    ///
    /// Returns `None` when the event no longer exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn update(&self, id: EventId, draft: EventDraft) -> StoreFuture<'_, Option<Event>>;

    /// Delete an event and, with it, every RSVP that references it.
    ///
    /// Returns `false` when there was nothing to delete.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn delete(&self, id: EventId) -> StoreFuture<'_, bool>;

    /// List events matching `query`, ordered by date ascending, with
    /// RSVP counts.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails.
    fn list(&self, query: EventQuery) -> StoreFuture<'_, Vec<EventSummary>>;
}

/// Storage for RSVPs, unique on `(user, event)`.
pub trait RsvpStore: Send + Sync {
    /// Load one user's RSVP to one event.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails.
    fn get_by_user_and_event(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> StoreFuture<'_, Option<Rsvp>>;

    /// Insert the RSVP or overwrite the status of the existing one.
    ///
    /// Must be a single atomic operation: concurrent first-time calls for
    /// the same pair leave exactly one record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EventMissing`] if the event was deleted
    /// meanwhile, or another [`StoreError`] if the write fails.
    fn upsert(
        &self,
        user_id: UserId,
        event_id: EventId,
        status: RsvpStatus,
    ) -> StoreFuture<'_, Rsvp>;

    /// Everyone who responded to an event.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails.
    fn list_by_event(&self, event_id: EventId) -> StoreFuture<'_, Vec<Attendance>>;

    /// A user's RSVPs with their events, ordered by event date ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails.
    fn list_by_user(&self, user_id: UserId) -> StoreFuture<'_, Vec<RsvpEntry>>;
}

/// Resolves request credentials to identities.
///
/// The planner never issues credentials; it only asks who is calling.
pub trait IdentityProvider: Send + Sync {
    /// Resolve a credential. Unknown or expired credentials are `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the lookup itself fails.
    fn current_identity(&self, credential: String) -> StoreFuture<'_, Option<Identity>>;
}

/// Backend health probe.
pub trait Readiness: Send + Sync {
    /// Succeeds when the backend can serve requests.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend is unreachable.
    fn check(&self) -> StoreFuture<'_, ()>;
}
