//! In-memory stores for fast, deterministic tests.
//!
//! [`InMemoryStore`] implements every persistence trait of the planner over
//! a single `RwLock`ed state, so an event store, an RSVP store and an
//! identity provider built from clones of one instance all see the same
//! data. Failures and latency can be injected to exercise error paths.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on poisoned locks

use planner_core::error::StoreError;
use planner_core::form::EventDraft;
use planner_core::store::{EventStore, IdentityProvider, Readiness, RsvpStore, StoreFuture};
use planner_core::types::{
    Attendance, Contact, Event, EventDetail, EventId, EventQuery, EventSummary, Identity, Rsvp,
    RsvpEntry, RsvpStatus, UserId,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
struct RsvpRecord {
    status: RsvpStatus,
    seq: u64,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, Identity>,
    sessions: HashMap<String, UserId>,
    events: HashMap<EventId, Event>,
    rsvps: HashMap<(UserId, EventId), RsvpRecord>,
}

impl State {
    fn contact(&self, user_id: &UserId) -> Contact {
        self.users
            .get(user_id)
            .map(Identity::contact)
            .unwrap_or_default()
    }

    fn rsvp_count(&self, event_id: EventId) -> u64 {
        self.rsvps.keys().filter(|(_, e)| *e == event_id).count() as u64
    }

    fn summary(&self, event: &Event) -> EventSummary {
        EventSummary {
            event: event.clone(),
            owner: self.contact(&event.owner_id),
            rsvp_count: self.rsvp_count(event.id),
        }
    }

    fn attendance(&self, event_id: EventId) -> Vec<Attendance> {
        let mut rows: Vec<_> = self
            .rsvps
            .iter()
            .filter(|((_, e), _)| *e == event_id)
            .map(|((user_id, _), record)| (record.seq, user_id, record.status))
            .collect();
        rows.sort_by_key(|(seq, _, _)| *seq);
        rows.into_iter()
            .map(|(_, user_id, status)| {
                let contact = self.contact(user_id);
                Attendance {
                    user_id: user_id.clone(),
                    name: contact.name,
                    email: contact.email,
                    status,
                }
            })
            .collect()
    }
}

#[derive(Debug, Default)]
struct Faults {
    unavailable: AtomicBool,
    latency: Mutex<Option<Duration>>,
}

/// In-memory implementation of every planner store.
///
/// Cloning is cheap and clones share state.
///
/// # Example
///
/// ```
/// use planner_testing::InMemoryStore;
/// use planner_core::types::Identity;
///
/// let store = InMemoryStore::new();
/// store.register_user(Identity::new("alice").with_name("Alice"));
/// store.issue_session("token-alice", "alice");
/// assert_eq!(store.event_count(), 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
    faults: Arc<Faults>,
    seq: Arc<AtomicU64>,
}

impl InMemoryStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a user known, so their name shows up in read models.
    pub fn register_user(&self, identity: Identity) {
        self.state
            .write()
            .unwrap()
            .users
            .insert(identity.id.clone(), identity);
    }

    /// Map a credential to a registered user.
    pub fn issue_session(&self, token: impl Into<String>, user_id: impl Into<String>) {
        self.state
            .write()
            .unwrap()
            .sessions
            .insert(token.into(), UserId::new(user_id));
    }

    /// Forget a credential.
    pub fn revoke_session(&self, token: &str) {
        self.state.write().unwrap().sessions.remove(token);
    }

    /// Insert an event as-is, bypassing validation.
    pub fn insert_event(&self, event: Event) {
        self.state.write().unwrap().events.insert(event.id, event);
    }

    /// Make every subsequent call fail with a database error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every subsequent call.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.faults.latency.lock().unwrap() = latency;
    }

    /// Number of stored events
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.state.read().unwrap().events.len()
    }

    /// Number of stored RSVPs across all events
    #[must_use]
    pub fn rsvp_count(&self) -> usize {
        self.state.read().unwrap().rsvps.len()
    }

    /// Every stored RSVP row for one event
    #[must_use]
    pub fn rsvp_rows(&self, event_id: EventId) -> Vec<Rsvp> {
        self.state
            .read()
            .unwrap()
            .rsvps
            .iter()
            .filter(|((_, e), _)| *e == event_id)
            .map(|((user_id, event_id), record)| Rsvp {
                user_id: user_id.clone(),
                event_id: *event_id,
                status: record.status,
            })
            .collect()
    }

    /// Load an event without going through the trait.
    #[must_use]
    pub fn event(&self, event_id: EventId) -> Option<Event> {
        self.state.read().unwrap().events.get(&event_id).cloned()
    }

    async fn simulate(&self) -> Result<(), StoreError> {
        let latency = *self.faults.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.faults.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Database(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

impl EventStore for InMemoryStore {
    fn create(&self, owner: UserId, draft: EventDraft) -> StoreFuture<'_, Event> {
        Box::pin(async move {
            self.simulate().await?;
            let event = Event {
                id: EventId::new(),
                title: draft.title,
                description: draft.description,
                date: draft.date,
                location: draft.location,
                max_attendees: draft.max_attendees,
                is_public: draft.is_public,
                owner_id: owner,
            };
            self.state
                .write()
                .unwrap()
                .events
                .insert(event.id, event.clone());
            Ok(event)
        })
    }

    fn get_by_id(&self, id: EventId) -> StoreFuture<'_, Option<Event>> {
        Box::pin(async move {
            self.simulate().await?;
            Ok(self.state.read().unwrap().events.get(&id).cloned())
        })
    }

    fn get_detail(&self, id: EventId) -> StoreFuture<'_, Option<EventDetail>> {
        Box::pin(async move {
            self.simulate().await?;
            let state = self.state.read().unwrap();
            Ok(state.events.get(&id).map(|event| {
                EventDetail::new(
                    event.clone(),
                    state.contact(&event.owner_id),
                    state.attendance(id),
                )
            }))
        })
    }

    fn update(&self, id: EventId, draft: EventDraft) -> StoreFuture<'_, Option<Event>> {
        Box::pin(async move {
            self.simulate().await?;
            let mut state = self.state.write().unwrap();
            Ok(state.events.get_mut(&id).map(|event| {
                event.title = draft.title;
                event.description = draft.description;
                event.date = draft.date;
                event.location = draft.location;
                event.max_attendees = draft.max_attendees;
                event.is_public = draft.is_public;
                event.clone()
            }))
        })
    }

    fn delete(&self, id: EventId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            self.simulate().await?;
            let mut state = self.state.write().unwrap();
            let existed = state.events.remove(&id).is_some();
            state.rsvps.retain(|(_, event_id), _| *event_id != id);
            Ok(existed)
        })
    }

    fn list(&self, query: EventQuery) -> StoreFuture<'_, Vec<EventSummary>> {
        Box::pin(async move {
            self.simulate().await?;
            let state = self.state.read().unwrap();
            let mut events: Vec<&Event> =
                state.events.values().filter(|e| query.matches(e)).collect();
            events.sort_by_key(|e| (e.date, e.id));
            Ok(events.into_iter().map(|e| state.summary(e)).collect())
        })
    }
}

impl RsvpStore for InMemoryStore {
    fn get_by_user_and_event(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> StoreFuture<'_, Option<Rsvp>> {
        Box::pin(async move {
            self.simulate().await?;
            let state = self.state.read().unwrap();
            Ok(state
                .rsvps
                .get(&(user_id.clone(), event_id))
                .map(|record| Rsvp {
                    user_id,
                    event_id,
                    status: record.status,
                }))
        })
    }

    fn upsert(
        &self,
        user_id: UserId,
        event_id: EventId,
        status: RsvpStatus,
    ) -> StoreFuture<'_, Rsvp> {
        Box::pin(async move {
            self.simulate().await?;
            // One write lock covers the visibility check and the write.
            let mut state = self.state.write().unwrap();
            match state.events.get(&event_id) {
                None => return Err(StoreError::EventMissing(event_id)),
                Some(event) if !event.is_public => {
                    return Err(StoreError::EventNotPublic(event_id));
                }
                Some(_) => {}
            }
            let seq = self.seq.fetch_add(1, Ordering::SeqCst);
            state
                .rsvps
                .entry((user_id.clone(), event_id))
                .and_modify(|record| record.status = status)
                .or_insert(RsvpRecord { status, seq });
            Ok(Rsvp {
                user_id,
                event_id,
                status,
            })
        })
    }

    fn list_by_event(&self, event_id: EventId) -> StoreFuture<'_, Vec<Attendance>> {
        Box::pin(async move {
            self.simulate().await?;
            Ok(self.state.read().unwrap().attendance(event_id))
        })
    }

    fn list_by_user(&self, user_id: UserId) -> StoreFuture<'_, Vec<RsvpEntry>> {
        Box::pin(async move {
            self.simulate().await?;
            let state = self.state.read().unwrap();
            let mut entries: Vec<(&Event, RsvpStatus)> = state
                .rsvps
                .iter()
                .filter(|((u, _), _)| *u == user_id)
                .filter_map(|((_, e), record)| state.events.get(e).map(|ev| (ev, record.status)))
                .collect();
            entries.sort_by_key(|(e, _)| (e.date, e.id));
            Ok(entries
                .into_iter()
                .map(|(event, status)| RsvpEntry {
                    status,
                    event: state.summary(event),
                })
                .collect())
        })
    }
}

impl IdentityProvider for InMemoryStore {
    fn current_identity(&self, credential: String) -> StoreFuture<'_, Option<Identity>> {
        Box::pin(async move {
            self.simulate().await?;
            let state = self.state.read().unwrap();
            Ok(state.sessions.get(&credential).map(|user_id| {
                state
                    .users
                    .get(user_id)
                    .cloned()
                    .unwrap_or_else(|| Identity::new(user_id.as_str()))
            }))
        })
    }
}

impl Readiness for InMemoryStore {
    fn check(&self) -> StoreFuture<'_, ()> {
        Box::pin(self.simulate())
    }
}
