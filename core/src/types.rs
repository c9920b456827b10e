//! Domain types for the event planner.
//!
//! Value objects (identifiers, RSVP status), the stored entities (events and
//! RSVPs) and the read models returned by queries.

use crate::error::PlannerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Identifier of a user, as issued by the identity provider.
///
/// Opaque to the planner: it is only ever compared for equality.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a provider-issued identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parse an identifier taken from a URL or form field.
    ///
    /// Malformed identifiers cannot name an existing event, so they are
    /// reported as [`PlannerError::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::NotFound`] if `raw` is not a UUID.
    pub fn parse(raw: &str) -> Result<Self, PlannerError> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| PlannerError::NotFound)
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Identity
// ============================================================================

/// The authenticated caller of an operation.
///
/// Supplied per request by the identity provider; the planner never
/// creates or destroys identities.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-issued user id
    pub id: UserId,
    /// Display name, if known
    pub name: Option<String>,
    /// Email address, if known
    pub email: Option<String>,
}

impl Identity {
    /// Create an identity with no profile information.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            name: None,
            email: None,
        }
    }

    /// Attach a display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach an email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Public contact details of this identity.
    #[must_use]
    pub fn contact(&self) -> Contact {
        Contact {
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Contact details shown alongside an event owner.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Display name
    pub name: Option<String>,
    /// Email address
    pub email: Option<String>,
}

// ============================================================================
// RSVP status
// ============================================================================

/// A respondent's attendance intent.
///
/// This is a closed set: anything else arriving from a client is rejected
/// by [`RsvpStatus::parse`] before it can reach storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RsvpStatus {
    /// Will attend
    Going,
    /// Will not attend
    NotGoing,
    /// Undecided
    Maybe,
}

impl RsvpStatus {
    /// Every status, in display order.
    pub const ALL: [Self; 3] = [Self::Going, Self::Maybe, Self::NotGoing];

    /// Convert status to its wire and database representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Going => "GOING",
            Self::NotGoing => "NOT_GOING",
            Self::Maybe => "MAYBE",
        }
    }

    /// Parse a status supplied by a client.
    ///
    /// Matching is exact: the wire format is upper case.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::RuleViolation`] for anything outside the
    /// three known statuses.
    pub fn parse(s: &str) -> Result<Self, PlannerError> {
        match s {
            "GOING" => Ok(Self::Going),
            "NOT_GOING" => Ok(Self::NotGoing),
            "MAYBE" => Ok(Self::Maybe),
            other => Err(PlannerError::RuleViolation(format!(
                "Invalid RSVP status: {other}"
            ))),
        }
    }
}

impl FromStr for RsvpStatus {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RsvpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A plannable happening.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event ID
    pub id: EventId,
    /// Event title
    pub title: String,
    /// Event description
    pub description: String,
    /// When the event takes place
    pub date: DateTime<Utc>,
    /// Where the event takes place
    pub location: String,
    /// Advisory attendance cap (never enforced)
    pub max_attendees: Option<u32>,
    /// Whether anyone may view and RSVP
    pub is_public: bool,
    /// The creator, sole holder of edit and delete rights
    pub owner_id: UserId,
}

/// One user's RSVP to one event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rsvp {
    /// Respondent
    pub user_id: UserId,
    /// Event responded to
    pub event_id: EventId,
    /// Current status
    pub status: RsvpStatus,
}

// ============================================================================
// Read models
// ============================================================================

/// An event as it appears in listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    /// The event itself
    #[serde(flatten)]
    pub event: Event,
    /// Owner contact details
    pub owner: Contact,
    /// Number of RSVPs of any status
    pub rsvp_count: u64,
}

/// A respondent as listed on an event page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    /// Respondent
    pub user_id: UserId,
    /// Respondent display name
    pub name: Option<String>,
    /// Respondent email
    pub email: Option<String>,
    /// Their current status
    pub status: RsvpStatus,
}

/// Full event view including the respondents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail {
    /// The event itself
    #[serde(flatten)]
    pub event: Event,
    /// Owner contact details
    pub owner: Contact,
    /// Everyone who responded
    pub rsvps: Vec<Attendance>,
    /// Number of RSVPs of any status
    pub rsvp_count: u64,
}

impl EventDetail {
    /// Build a detail view; the count is derived from `rsvps`.
    #[must_use]
    pub fn new(event: Event, owner: Contact, rsvps: Vec<Attendance>) -> Self {
        let rsvp_count = rsvps.len() as u64;
        Self {
            event,
            owner,
            rsvps,
            rsvp_count,
        }
    }

    /// Status of the given user's RSVP, if they responded.
    #[must_use]
    pub fn status_of(&self, user_id: &UserId) -> Option<RsvpStatus> {
        self.rsvps
            .iter()
            .find(|a| &a.user_id == user_id)
            .map(|a| a.status)
    }
}

/// One of the caller's RSVPs together with the event it refers to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpEntry {
    /// The caller's status
    pub status: RsvpStatus,
    /// The event responded to
    pub event: EventSummary,
}

// ============================================================================
// Queries
// ============================================================================

/// Time filter accepted by the event listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TimeFilter {
    /// No time restriction
    #[default]
    All,
    /// Events at or after the evaluation instant
    Upcoming,
    /// Events strictly before the evaluation instant
    Past,
}

impl TimeFilter {
    /// Interpret the `filter` query parameter. Unknown values mean [`TimeFilter::All`].
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            Some("upcoming") => Self::Upcoming,
            Some("past") => Self::Past,
            _ => Self::All,
        }
    }

    /// Resolve against an instant.
    #[must_use]
    pub const fn window(self, now: DateTime<Utc>) -> TimeWindow {
        match self {
            Self::All => TimeWindow::Any,
            Self::Upcoming => TimeWindow::From(now),
            Self::Past => TimeWindow::Before(now),
        }
    }

    /// Short label used in cache keys and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Upcoming => "upcoming",
            Self::Past => "past",
        }
    }
}

/// A resolved time restriction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeWindow {
    /// No restriction
    Any,
    /// `date >= instant`
    From(DateTime<Utc>),
    /// `date < instant`
    Before(DateTime<Utc>),
}

impl TimeWindow {
    /// Whether `date` falls inside the window.
    #[must_use]
    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        match *self {
            Self::Any => true,
            Self::From(instant) => date >= instant,
            Self::Before(instant) => date < instant,
        }
    }
}

/// Whose point of view a listing is computed from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Audience {
    /// Public events, plus the viewer's own private events
    Viewer(Option<UserId>),
    /// Every event owned by this user
    Owner(UserId),
}

impl Audience {
    /// Whether `event` is visible to this audience.
    #[must_use]
    pub fn admits(&self, event: &Event) -> bool {
        match self {
            Self::Viewer(viewer) => event.is_public || viewer.as_ref() == Some(&event.owner_id),
            Self::Owner(owner) => &event.owner_id == owner,
        }
    }
}

/// Store-level listing query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventQuery {
    /// Case-insensitive substring matched against title, description or location
    pub search: Option<String>,
    /// Time restriction
    pub window: TimeWindow,
    /// Visibility restriction
    pub audience: Audience,
}

impl EventQuery {
    /// Every event owned by `owner`, regardless of date.
    #[must_use]
    pub const fn owned_by(owner: UserId) -> Self {
        Self {
            search: None,
            window: TimeWindow::Any,
            audience: Audience::Owner(owner),
        }
    }

    /// Reference predicate for the query; stores may evaluate it natively.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        self.audience.admits(event)
            && self.window.contains(event.date)
            && self.matches_search(event)
    }

    fn matches_search(&self, event: &Event) -> bool {
        let Some(needle) = self.search.as_deref() else {
            return true;
        };
        let needle = needle.to_lowercase();
        [&event.title, &event.description, &event.location]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(title: &str, is_public: bool, owner: &str) -> Event {
        Event {
            id: EventId::new(),
            title: title.to_string(),
            description: "Monthly gathering".to_string(),
            date: Utc.with_ymd_and_hms(2026, 3, 1, 18, 0, 0).unwrap(),
            location: "Oslo".to_string(),
            max_attendees: None,
            is_public,
            owner_id: UserId::new(owner),
        }
    }

    #[test]
    fn test_status_round_trips_wire_names() {
        for status in RsvpStatus::ALL {
            assert_eq!(RsvpStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_status_rejects_unknown_values() {
        let err = RsvpStatus::parse("going").unwrap_err();
        assert_eq!(err.to_string(), "Invalid RSVP status: going");
        assert!(RsvpStatus::parse("").is_err());
        assert!(RsvpStatus::parse("DECLINED").is_err());
    }

    #[test]
    fn test_status_serializes_screaming_case() {
        let json = serde_json::to_string(&RsvpStatus::NotGoing).unwrap();
        assert_eq!(json, "\"NOT_GOING\"");
    }

    #[test]
    fn test_event_id_parse_maps_garbage_to_not_found() {
        assert!(matches!(EventId::parse("nope"), Err(PlannerError::NotFound)));
        let id = EventId::new();
        assert_eq!(EventId::parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_time_filter_from_param() {
        assert_eq!(TimeFilter::from_param(Some("upcoming")), TimeFilter::Upcoming);
        assert_eq!(TimeFilter::from_param(Some("past")), TimeFilter::Past);
        assert_eq!(TimeFilter::from_param(Some("soon")), TimeFilter::All);
        assert_eq!(TimeFilter::from_param(None), TimeFilter::All);
    }

    #[test]
    fn test_window_boundary_belongs_to_upcoming() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 18, 0, 0).unwrap();
        assert!(TimeFilter::Upcoming.window(now).contains(now));
        assert!(!TimeFilter::Past.window(now).contains(now));
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let e = event("Rust Meetup", true, "alice");
        let query = |s: &str| EventQuery {
            search: Some(s.to_string()),
            window: TimeWindow::Any,
            audience: Audience::Viewer(None),
        };
        assert!(query("meetup").matches(&e));
        assert!(query("GATHERING").matches(&e));
        assert!(query("osl").matches(&e));
        assert!(!query("berlin").matches(&e));
    }

    #[test]
    fn test_audience_visibility() {
        let private = event("Board meeting", false, "alice");
        assert!(!Audience::Viewer(None).admits(&private));
        assert!(!Audience::Viewer(Some(UserId::new("bob"))).admits(&private));
        assert!(Audience::Viewer(Some(UserId::new("alice"))).admits(&private));
        assert!(Audience::Owner(UserId::new("alice")).admits(&private));
        assert!(!Audience::Owner(UserId::new("bob")).admits(&event("Picnic", true, "alice")));
    }

    #[test]
    fn test_event_serializes_camel_case() {
        let json = serde_json::to_value(event("Picnic", true, "alice")).unwrap();
        assert_eq!(json["isPublic"], true);
        assert_eq!(json["ownerId"], "alice");
        assert!(json["maxAttendees"].is_null());
    }
}
