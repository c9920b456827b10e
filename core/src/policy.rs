//! Authorization predicates.
//!
//! Pure functions over an optional identity and an event. The engine calls
//! them in a fixed order; each returns the error the caller should see.

use crate::error::PlannerError;
use crate::types::{Event, Identity};

/// The caller must be authenticated.
///
/// # Errors
///
/// Returns [`PlannerError::Unauthenticated`] when `requester` is `None`.
pub fn require_identity(requester: Option<&Identity>) -> Result<&Identity, PlannerError> {
    requester.ok_or(PlannerError::Unauthenticated)
}

/// Whether `requester` owns `event`.
#[must_use]
pub fn is_owner(requester: &Identity, event: &Event) -> bool {
    requester.id == event.owner_id
}

/// Public events are visible to everyone; private ones only to the owner.
///
/// # Errors
///
/// Returns [`PlannerError::Forbidden`] for a private event viewed by anyone
/// but its owner, anonymous callers included.
pub fn can_view(requester: Option<&Identity>, event: &Event) -> Result<(), PlannerError> {
    if event.is_public || requester.is_some_and(|r| is_owner(r, event)) {
        Ok(())
    } else {
        Err(PlannerError::Forbidden(
            "Not authorized to view this event".to_string(),
        ))
    }
}

/// Only the owner may edit.
///
/// # Errors
///
/// Returns [`PlannerError::Forbidden`] for non-owners.
pub fn can_edit(requester: &Identity, event: &Event) -> Result<(), PlannerError> {
    if is_owner(requester, event) {
        Ok(())
    } else {
        Err(PlannerError::Forbidden(
            "Not authorized to edit this event".to_string(),
        ))
    }
}

/// Only the owner may delete.
///
/// # Errors
///
/// Returns [`PlannerError::Forbidden`] for non-owners.
pub fn can_delete(requester: &Identity, event: &Event) -> Result<(), PlannerError> {
    if is_owner(requester, event) {
        Ok(())
    } else {
        Err(PlannerError::Forbidden(
            "Not authorized to delete this event".to_string(),
        ))
    }
}

/// Rule message for RSVPs to private events.
pub const NOT_PUBLIC: &str = "Event is not public";

/// RSVPs are accepted on public events only. The owner is no exception.
///
/// # Errors
///
/// Returns [`PlannerError::RuleViolation`] for private events.
pub fn accepts_rsvp(event: &Event) -> Result<(), PlannerError> {
    if event.is_public {
        Ok(())
    } else {
        Err(PlannerError::RuleViolation(NOT_PUBLIC.to_string()))
    }
}
