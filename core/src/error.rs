//! Error taxonomy for planner operations.
//!
//! [`PlannerError`] is what engine callers see. [`StoreError`] is what the
//! persistence layer reports; the engine wraps it so that only a generic
//! per-operation message ever reaches a client, while the full error is
//! kept as the `source` for logging.

use crate::types::EventId;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for planner operations.
pub type Result<T> = std::result::Result<T, PlannerError>;

/// Failures reported by store implementations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Database connection or query failed.
    #[error("Database error: {0}")]
    Database(String),

    /// A row could not be mapped to a domain value.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The referenced event no longer exists (lost a race with a delete).
    #[error("Event {0} does not exist")]
    EventMissing(EventId),

    /// The event stopped accepting RSVPs before the write landed.
    #[error("Event {0} is not public")]
    EventNotPublic(EventId),

    /// The call did not complete within the store deadline.
    #[error("Store call timed out after {after:?}")]
    Timeout {
        /// The deadline that elapsed
        after: Duration,
    },
}

/// The operation a failure happened in.
///
/// Determines the message a client gets when the store fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Listing events
    ListEvents,
    /// Loading one event
    GetEvent,
    /// Creating an event
    CreateEvent,
    /// Editing an event
    UpdateEvent,
    /// Deleting an event
    DeleteEvent,
    /// Responding to an event
    Rsvp,
    /// Listing the caller's own events
    OwnedEvents,
    /// Listing the caller's RSVPs
    RespondedEvents,
}

impl Operation {
    /// Client-facing message used when the store fails.
    #[must_use]
    pub const fn failure_message(&self) -> &'static str {
        match self {
            Self::ListEvents => "Failed to fetch events",
            Self::GetEvent => "Failed to fetch event",
            Self::CreateEvent => "Failed to create event",
            Self::UpdateEvent => "Failed to update event",
            Self::DeleteEvent => "Failed to delete the event",
            Self::Rsvp => "Failed to RSVP",
            Self::OwnedEvents => "Failed to fetch user events",
            Self::RespondedEvents => "Failed to fetch rsvps",
        }
    }

    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ListEvents => "list_events",
            Self::GetEvent => "get_event",
            Self::CreateEvent => "create_event",
            Self::UpdateEvent => "update_event",
            Self::DeleteEvent => "delete_event",
            Self::Rsvp => "rsvp",
            Self::OwnedEvents => "owned_events",
            Self::RespondedEvents => "responded_events",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a planner operation can fail with.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlannerError {
    /// No identity accompanied the request.
    #[error("Not authenticated")]
    Unauthenticated,

    /// The event does not exist.
    #[error("Event not found")]
    NotFound,

    /// An identity is present but lacks rights on the event.
    #[error("{0}")]
    Forbidden(String),

    /// A domain rule was broken (private event, unknown status).
    #[error("{0}")]
    RuleViolation(String),

    /// Malformed input; carries the first failing rule's message.
    #[error("{0}")]
    Validation(String),

    /// The backing store failed. Displays only the generic message.
    #[error("{}", .operation.failure_message())]
    Store {
        /// Operation that was running
        operation: Operation,
        /// Underlying failure, for logs only
        #[source]
        source: StoreError,
    },
}

impl PlannerError {
    /// Short machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::NotFound => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::RuleViolation(_) => "RULE_VIOLATION",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Store { .. } => "STORE_ERROR",
        }
    }

    /// Returns `true` if the caller can fix the request and retry.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Store { .. })
    }
}
