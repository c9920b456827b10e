//! Dashboard endpoints, scoped to the caller.
//!
//! - `GET /dashboard/events` - Events the caller owns, public and private
//! - `GET /dashboard/rsvps` - The caller's RSVPs with their events

use crate::error::AppError;
use crate::extractors::CurrentIdentity;
use crate::state::AppState;
use axum::{Json, extract::State};
use planner_core::types::{EventSummary, RsvpEntry};

/// Events owned by the caller.
///
/// # Errors
///
/// Returns 401 for anonymous callers and 500 if the store fails.
pub async fn my_events(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<Vec<EventSummary>>, AppError> {
    Ok(Json(state.engine.owned_events(identity.as_ref()).await?))
}

/// The caller's RSVPs.
///
/// # Errors
///
/// Returns 401 for anonymous callers and 500 if the store fails.
pub async fn my_rsvps(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<Vec<RsvpEntry>>, AppError> {
    Ok(Json(state.engine.responded_events(identity.as_ref()).await?))
}
