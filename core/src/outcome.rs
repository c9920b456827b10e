//! Structured results for mutating operations.
//!
//! Mutations never surface as exceptions at the client boundary: they
//! answer with `{success, error?, ...payload}`.

use crate::error::PlannerError;
use crate::types::{Event, EventId, Rsvp};
use serde::{Deserialize, Serialize};

/// Result envelope returned by every mutating operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome<T> {
    /// Whether the operation committed
    pub success: bool,
    /// Client-facing error message on failure
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    /// Payload on success
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T> ActionOutcome<T> {
    /// A successful outcome carrying `data`.
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    /// A failed outcome carrying the client-facing message of `error`.
    #[must_use]
    pub fn failed(error: &PlannerError) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            data: None,
        }
    }
}

impl<T> From<Result<T, PlannerError>> for ActionOutcome<T> {
    fn from(result: Result<T, PlannerError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failed(&e),
        }
    }
}

/// Payload of create and update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedEvent {
    /// Id of the saved event
    pub event_id: EventId,
}

impl From<Event> for SavedEvent {
    fn from(event: Event) -> Self {
        Self { event_id: event.id }
    }
}

/// Payload of delete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedEvent {
    /// Id of the deleted event
    pub event_id: EventId,
}

/// Payload of an RSVP.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsvpRecorded {
    /// The stored RSVP
    pub rsvp: Rsvp,
}
