//! The authorization and RSVP engine.
//!
//! Every operation follows the same shape: check the identity, load the
//! event, apply the policy predicates, mutate through the store, then
//! invalidate the affected cache tags. Invalidation only runs after the
//! store confirmed the write.
//!
//! Store calls run under [`EngineConfig::store_timeout`]. Store failures
//! are logged and counted here and reach the caller only as the generic
//! per-operation message of [`PlannerError::Store`].

use crate::cache::{CacheTag, TagVersions, TaggedCache};
use crate::environment::Clock;
use crate::error::{Operation, PlannerError, Result, StoreError};
use crate::form::EventForm;
use crate::policy;
use crate::store::{EventStore, RsvpStore, StoreFuture};
use crate::types::{
    Attendance, Audience, Event, EventDetail, EventId, EventQuery, EventSummary, Identity, Rsvp,
    RsvpEntry, RsvpStatus, TimeFilter, TimeWindow, UserId,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Engine tuning knobs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Deadline applied to every store call
    pub store_timeout: Duration,
    /// How long a cached read may be served; zero disables caching
    pub cache_ttl: Duration,
    /// Maximum entries per cache
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(30),
            cache_capacity: 1024,
        }
    }
}

/// What a cached listing depends on besides the `events` tag.
///
/// Listings are filtered by viewer, so the viewer is part of the key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ListingKey {
    viewer: Option<UserId>,
    search: Option<String>,
}

/// Authorization and RSVP engine.
///
/// Cheap to share behind an `Arc`; holds no per-request state.
pub struct Engine {
    events: Arc<dyn EventStore>,
    rsvps: Arc<dyn RsvpStore>,
    clock: Arc<dyn Clock>,
    tags: Arc<TagVersions>,
    listings: TaggedCache<ListingKey, Vec<EventSummary>>,
    details: TaggedCache<EventId, Option<EventDetail>>,
    config: EngineConfig,
}

impl Engine {
    /// Create an engine over the given stores.
    #[must_use]
    pub fn new(
        events: Arc<dyn EventStore>,
        rsvps: Arc<dyn RsvpStore>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        let tags = Arc::new(TagVersions::new());
        let listings = TaggedCache::new(
            "listings",
            Arc::clone(&tags),
            config.cache_ttl,
            config.cache_capacity,
        );
        let details = TaggedCache::new(
            "details",
            Arc::clone(&tags),
            config.cache_ttl,
            config.cache_capacity,
        );
        Self {
            events,
            rsvps,
            clock,
            tags,
            listings,
            details,
            config,
        }
    }

    /// Tag versions shared by the engine's caches.
    #[must_use]
    pub fn tags(&self) -> &Arc<TagVersions> {
        &self.tags
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Load the full view of one event.
    ///
    /// # Errors
    ///
    /// - [`PlannerError::NotFound`] if the event does not exist
    /// - [`PlannerError::Forbidden`] if it is private and `requester` is not the owner
    /// - [`PlannerError::Store`] if the store fails
    #[tracing::instrument(skip_all, fields(event_id = %event_id))]
    pub async fn get_event(
        &self,
        requester: Option<&Identity>,
        event_id: EventId,
    ) -> Result<EventDetail> {
        let detail = self
            .details
            .get_or_load(
                event_id,
                vec![CacheTag::Events, CacheTag::Event(event_id)],
                || self.call(Operation::GetEvent, self.events.get_detail(event_id)),
            )
            .await?
            .ok_or(PlannerError::NotFound)?;

        policy::can_view(requester, &detail.event)?;
        Ok(detail)
    }

    /// List the events visible to `requester`, ordered by date ascending.
    ///
    /// An event is listed when it is public or owned by the requester.
    /// Time filters are evaluated against a single instant taken at the
    /// start of the call; a blank search is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::Store`] if the store fails.
    #[tracing::instrument(skip_all, fields(filter = filter.as_str()))]
    pub async fn list_events(
        &self,
        requester: Option<&Identity>,
        filter: TimeFilter,
        search: Option<&str>,
    ) -> Result<Vec<EventSummary>> {
        let window = filter.window(self.clock.now());
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let viewer = requester.map(|r| r.id.clone());

        let key = ListingKey {
            viewer: viewer.clone(),
            search: search.as_deref().map(str::to_lowercase),
        };
        let query = EventQuery {
            search,
            window: TimeWindow::Any,
            audience: Audience::Viewer(viewer),
        };

        // Cached listings are time-independent; the window is applied per call.
        let visible = self
            .listings
            .get_or_load(key, vec![CacheTag::Events], || {
                self.call(Operation::ListEvents, self.events.list(query))
            })
            .await?;

        Ok(visible
            .into_iter()
            .filter(|summary| window.contains(summary.event.date))
            .collect())
    }

    /// Everyone who responded to an event the requester can see.
    ///
    /// # Errors
    ///
    /// - [`PlannerError::NotFound`] if the event does not exist
    /// - [`PlannerError::Forbidden`] if the requester cannot view it
    /// - [`PlannerError::Store`] if the store fails
    pub async fn list_attendees(
        &self,
        requester: Option<&Identity>,
        event_id: EventId,
    ) -> Result<Vec<Attendance>> {
        let event = self.load_event(Operation::GetEvent, event_id).await?;
        policy::can_view(requester, &event)?;
        self.call(Operation::GetEvent, self.rsvps.list_by_event(event_id))
            .await
    }

    /// The requester's own status for an event, if they responded.
    ///
    /// # Errors
    ///
    /// - [`PlannerError::Unauthenticated`] without an identity
    /// - [`PlannerError::NotFound`] if the event does not exist
    /// - [`PlannerError::Forbidden`] if the requester cannot view it
    /// - [`PlannerError::Store`] if the store fails
    pub async fn rsvp_status(
        &self,
        requester: Option<&Identity>,
        event_id: EventId,
    ) -> Result<Option<RsvpStatus>> {
        let requester = policy::require_identity(requester)?;
        let event = self.load_event(Operation::GetEvent, event_id).await?;
        policy::can_view(Some(requester), &event)?;

        let rsvp = self
            .call(
                Operation::GetEvent,
                self.rsvps
                    .get_by_user_and_event(requester.id.clone(), event_id),
            )
            .await?;
        Ok(rsvp.map(|r| r.status))
    }

    /// Every event the requester owns, public and private, by date.
    ///
    /// # Errors
    ///
    /// - [`PlannerError::Unauthenticated`] without an identity
    /// - [`PlannerError::Store`] if the store fails
    pub async fn owned_events(&self, requester: Option<&Identity>) -> Result<Vec<EventSummary>> {
        let requester = policy::require_identity(requester)?;
        self.call(
            Operation::OwnedEvents,
            self.events.list(EventQuery::owned_by(requester.id.clone())),
        )
        .await
    }

    /// The requester's RSVPs with their events, by event date.
    ///
    /// # Errors
    ///
    /// - [`PlannerError::Unauthenticated`] without an identity
    /// - [`PlannerError::Store`] if the store fails
    pub async fn responded_events(&self, requester: Option<&Identity>) -> Result<Vec<RsvpEntry>> {
        let requester = policy::require_identity(requester)?;
        self.call(
            Operation::RespondedEvents,
            self.rsvps.list_by_user(requester.id.clone()),
        )
        .await
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Create an event owned by the requester.
    ///
    /// # Errors
    ///
    /// - [`PlannerError::Unauthenticated`] without an identity
    /// - [`PlannerError::Validation`] with the first failing rule
    /// - [`PlannerError::Store`] if the write fails
    #[tracing::instrument(skip_all)]
    pub async fn create_event(
        &self,
        requester: Option<&Identity>,
        form: &EventForm,
    ) -> Result<Event> {
        let requester = policy::require_identity(requester)?;
        let draft = form.validate()?;

        let event = self
            .call(
                Operation::CreateEvent,
                self.events.create(requester.id.clone(), draft),
            )
            .await?;

        self.tags.invalidate(CacheTag::Events);
        metrics::counter!("planner.events.created").increment(1);
        tracing::info!(event_id = %event.id, owner = %event.owner_id, "Event created");
        Ok(event)
    }

    /// Replace the fields of an event the requester owns.
    ///
    /// # Errors
    ///
    /// - [`PlannerError::Unauthenticated`] without an identity
    /// - [`PlannerError::NotFound`] if the event does not exist
    /// - [`PlannerError::Forbidden`] if the requester is not the owner
    /// - [`PlannerError::Validation`] with the first failing rule
    /// - [`PlannerError::Store`] if the write fails
    #[tracing::instrument(skip_all, fields(event_id = %event_id))]
    pub async fn update_event(
        &self,
        requester: Option<&Identity>,
        event_id: EventId,
        form: &EventForm,
    ) -> Result<Event> {
        let requester = policy::require_identity(requester)?;
        let event = self.load_event(Operation::UpdateEvent, event_id).await?;
        policy::can_edit(requester, &event)?;
        let draft = form.validate()?;

        let updated = self
            .call(Operation::UpdateEvent, self.events.update(event_id, draft))
            .await?
            .ok_or(PlannerError::NotFound)?;

        self.tags.invalidate(CacheTag::Events);
        self.tags.invalidate(CacheTag::Event(event_id));
        tracing::info!(event_id = %event_id, "Event updated");
        Ok(updated)
    }

    /// Delete an event the requester owns, with all its RSVPs.
    ///
    /// # Errors
    ///
    /// - [`PlannerError::Unauthenticated`] without an identity
    /// - [`PlannerError::NotFound`] if the event does not exist
    /// - [`PlannerError::Forbidden`] if the requester is not the owner
    /// - [`PlannerError::Store`] if the write fails
    #[tracing::instrument(skip_all, fields(event_id = %event_id))]
    pub async fn delete_event(
        &self,
        requester: Option<&Identity>,
        event_id: EventId,
    ) -> Result<()> {
        let requester = policy::require_identity(requester)?;
        let event = self.load_event(Operation::DeleteEvent, event_id).await?;
        policy::can_delete(requester, &event)?;

        let deleted = self
            .call(Operation::DeleteEvent, self.events.delete(event_id))
            .await?;
        if !deleted {
            return Err(PlannerError::NotFound);
        }

        self.tags.invalidate(CacheTag::Events);
        self.tags.retire(&CacheTag::Event(event_id));
        metrics::counter!("planner.events.deleted").increment(1);
        tracing::info!(event_id = %event_id, "Event deleted");
        Ok(())
    }

    /// Record the requester's attendance intent for a public event.
    ///
    /// The write is a single upsert keyed on `(requester, event)`; sending
    /// the current status again still writes. The store re-checks that the
    /// event is public in the same statement, so an event made private
    /// after it was loaded still rejects the RSVP.
    ///
    /// # Errors
    ///
    /// - [`PlannerError::Unauthenticated`] without an identity
    /// - [`PlannerError::RuleViolation`] for an unknown status or a private event
    /// - [`PlannerError::NotFound`] if the event does not exist
    /// - [`PlannerError::Store`] if the write fails
    #[tracing::instrument(skip_all, fields(event_id = %event_id))]
    pub async fn rsvp(
        &self,
        requester: Option<&Identity>,
        event_id: EventId,
        status: &str,
    ) -> Result<Rsvp> {
        let requester = policy::require_identity(requester)?;
        let status = RsvpStatus::parse(status)?;
        let event = self.load_event(Operation::Rsvp, event_id).await?;
        policy::accepts_rsvp(&event)?;

        let rsvp = self
            .call(
                Operation::Rsvp,
                self.rsvps.upsert(requester.id.clone(), event_id, status),
            )
            .await?;

        self.tags.invalidate(CacheTag::Events);
        self.tags.invalidate(CacheTag::Event(event_id));
        metrics::counter!("planner.rsvps.recorded", "status" => status.as_str()).increment(1);
        tracing::info!(
            event_id = %event_id,
            user_id = %rsvp.user_id,
            status = %status,
            "RSVP recorded"
        );
        Ok(rsvp)
    }

    // ========================================================================
    // Store plumbing
    // ========================================================================

    async fn load_event(&self, operation: Operation, event_id: EventId) -> Result<Event> {
        self.call(operation, self.events.get_by_id(event_id))
            .await?
            .ok_or(PlannerError::NotFound)
    }

    /// Run a store call under the deadline and translate its failure.
    async fn call<T>(&self, operation: Operation, fut: StoreFuture<'_, T>) -> Result<T> {
        let after = self.config.store_timeout;
        let started = Instant::now();
        let result = match tokio::time::timeout(after, fut).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout { after }),
        };
        metrics::histogram!("planner.store.duration_seconds", "operation" => operation.as_str())
            .record(started.elapsed().as_secs_f64());
        result.map_err(|source| Self::store_failure(operation, source))
    }

    fn store_failure(operation: Operation, source: StoreError) -> PlannerError {
        match source {
            StoreError::EventMissing(event_id) => {
                tracing::debug!(%event_id, %operation, "Event vanished during operation");
                return PlannerError::NotFound;
            }
            StoreError::EventNotPublic(event_id) => {
                tracing::debug!(%event_id, %operation, "Event made private during operation");
                return PlannerError::RuleViolation(policy::NOT_PUBLIC.to_string());
            }
            _ => {}
        }

        metrics::counter!("planner.store.errors", "operation" => operation.as_str()).increment(1);
        tracing::error!(operation = %operation, error = %source, "Store call failed");
        PlannerError::Store { operation, source }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
