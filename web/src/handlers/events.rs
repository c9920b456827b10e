//! Event endpoints.
//!
//! - `GET /events` - List visible events (`search`, `filter=upcoming|past`)
//! - `POST /events` - Create an event (requires auth)
//! - `GET /events/:id` - Event detail with respondents
//! - `PUT /events/:id` - Replace an event's fields (owner only)
//! - `DELETE /events/:id` - Delete an event and its RSVPs (owner only)
//! - `POST /events/:id/rsvp` - Record the caller's RSVP
//! - `GET /events/:id/rsvp` - The caller's own RSVP status
//! - `GET /events/:id/rsvps` - Everyone who responded
//!
//! Reads answer with the payload or `{code, message}`; mutations answer
//! with an [`Outcome`].

use crate::error::AppError;
use crate::extractors::{CurrentIdentity, FormBody, InvalidBody};
use crate::outcome::Outcome;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use planner_core::{EventForm, PlannerError};
use planner_core::outcome::{DeletedEvent, RsvpRecorded, SavedEvent};
use planner_core::policy;
use planner_core::types::{Attendance, EventDetail, EventId, EventSummary, RsvpStatus, TimeFilter};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query string of the event listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Case-insensitive text matched against title, description and location
    pub search: Option<String>,
    /// `upcoming`, `past`, anything else lists all
    pub filter: Option<String>,
}

/// Body of an RSVP.
#[derive(Debug, Default, Deserialize)]
pub struct RsvpRequest {
    /// `GOING`, `MAYBE` or `NOT_GOING`
    #[serde(default)]
    pub status: String,
}

/// The caller's own RSVP status.
#[derive(Debug, Serialize)]
pub struct MyRsvp {
    /// Status, `null` if the caller has not responded
    pub status: Option<RsvpStatus>,
}

// ============================================================================
// Reads
// ============================================================================

/// List the events visible to the caller, ordered by date.
///
/// # Errors
///
/// Returns 500 if the store fails.
pub async fn list_events(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<EventSummary>>, AppError> {
    let filter = TimeFilter::from_param(params.filter.as_deref());
    let events = state
        .engine
        .list_events(identity.as_ref(), filter, params.search.as_deref())
        .await?;
    Ok(Json(events))
}

/// Full view of one event.
///
/// # Errors
///
/// Returns 404 for unknown or malformed ids and 403 for private events the
/// caller does not own.
pub async fn get_event(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
) -> Result<Json<EventDetail>, AppError> {
    let event_id = EventId::parse(&id)?;
    let detail = state.engine.get_event(identity.as_ref(), event_id).await?;
    Ok(Json(detail))
}

/// Everyone who responded to an event.
///
/// # Errors
///
/// Same as [`get_event`].
pub async fn list_attendees(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
) -> Result<Json<Vec<Attendance>>, AppError> {
    let event_id = EventId::parse(&id)?;
    let attendees = state
        .engine
        .list_attendees(identity.as_ref(), event_id)
        .await?;
    Ok(Json(attendees))
}

/// The caller's own status for an event.
///
/// # Errors
///
/// Returns 401 for anonymous callers, otherwise the same as [`get_event`].
pub async fn my_rsvp(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
) -> Result<Json<MyRsvp>, AppError> {
    policy::require_identity(identity.as_ref())?;
    let event_id = EventId::parse(&id)?;
    let status = state.engine.rsvp_status(identity.as_ref(), event_id).await?;
    Ok(Json(MyRsvp { status }))
}

// ============================================================================
// Mutations
// ============================================================================

/// Create an event owned by the caller.
pub async fn create_event(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    body: Result<FormBody<EventForm>, InvalidBody>,
) -> Outcome<SavedEvent> {
    let result = async {
        policy::require_identity(identity.as_ref())?;
        let FormBody(form) = body?;
        state
            .engine
            .create_event(identity.as_ref(), &form)
            .await
            .map(SavedEvent::from)
    };
    Outcome(result.await)
}

/// Replace the fields of an event the caller owns.
pub async fn update_event(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
    body: Result<FormBody<EventForm>, InvalidBody>,
) -> Outcome<SavedEvent> {
    let result = async {
        policy::require_identity(identity.as_ref())?;
        let event_id = EventId::parse(&id)?;
        let FormBody(form) = body?;
        state
            .engine
            .update_event(identity.as_ref(), event_id, &form)
            .await
            .map(SavedEvent::from)
    };
    Outcome(result.await)
}

/// Delete an event the caller owns.
pub async fn delete_event(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
) -> Outcome<DeletedEvent> {
    let result = async {
        policy::require_identity(identity.as_ref())?;
        let event_id = EventId::parse(&id)?;
        state.engine.delete_event(identity.as_ref(), event_id).await?;
        Ok::<_, PlannerError>(DeletedEvent { event_id })
    };
    Outcome(result.await)
}

/// Record the caller's RSVP to a public event.
pub async fn rsvp(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
    body: Result<FormBody<RsvpRequest>, InvalidBody>,
) -> Outcome<RsvpRecorded> {
    let result = async {
        policy::require_identity(identity.as_ref())?;
        let event_id = EventId::parse(&id)?;
        let FormBody(request) = body?;
        state
            .engine
            .rsvp(identity.as_ref(), event_id, &request.status)
            .await
            .map(|rsvp| RsvpRecorded { rsvp })
    };
    Outcome(result.await)
}
