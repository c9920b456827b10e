//! Row types and their conversion into domain values.

use chrono::{DateTime, Utc};
use planner_core::error::StoreError;
use planner_core::types::{
    Attendance, Contact, Event, EventId, EventSummary, RsvpEntry, RsvpStatus, UserId,
};
use uuid::Uuid;

/// Columns selected for an event, in this order.
pub(crate) const EVENT_COLUMNS: &str =
    "e.id, e.title, e.description, e.date, e.location, e.max_attendees, e.is_public, e.owner_id";

/// Owner contact and RSVP count selected next to [`EVENT_COLUMNS`].
pub(crate) const SUMMARY_COLUMNS: &str = "u.name AS owner_name, u.email AS owner_email, \
     (SELECT COUNT(*) FROM rsvps c WHERE c.event_id = e.id) AS rsvp_count";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EventRow {
    id: Uuid,
    title: String,
    description: String,
    date: DateTime<Utc>,
    location: String,
    max_attendees: Option<i64>,
    is_public: bool,
    owner_id: String,
}

impl TryFrom<EventRow> for Event {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let max_attendees = row
            .max_attendees
            .map(u32::try_from)
            .transpose()
            .map_err(|_| {
                StoreError::Decode(format!("max_attendees out of range for event {}", row.id))
            })?;

        Ok(Self {
            id: EventId::from_uuid(row.id),
            title: row.title,
            description: row.description,
            date: row.date,
            location: row.location,
            max_attendees,
            is_public: row.is_public,
            owner_id: UserId::new(row.owner_id),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SummaryRow {
    #[sqlx(flatten)]
    event: EventRow,
    owner_name: Option<String>,
    owner_email: Option<String>,
    rsvp_count: i64,
}

impl SummaryRow {
    pub(crate) fn owner(&self) -> Contact {
        Contact {
            name: self.owner_name.clone(),
            email: self.owner_email.clone(),
        }
    }
}

impl TryFrom<SummaryRow> for EventSummary {
    type Error = StoreError;

    fn try_from(row: SummaryRow) -> Result<Self, Self::Error> {
        let owner = row.owner();
        Ok(Self {
            event: row.event.try_into()?,
            owner,
            rsvp_count: u64::try_from(row.rsvp_count).unwrap_or_default(),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AttendanceRow {
    user_id: String,
    name: Option<String>,
    email: Option<String>,
    status: String,
}

impl TryFrom<AttendanceRow> for Attendance {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: UserId::new(row.user_id),
            name: row.name,
            email: row.email,
            status: decode_status(&row.status)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct RsvpEntryRow {
    rsvp_status: String,
    #[sqlx(flatten)]
    summary: SummaryRow,
}

impl TryFrom<RsvpEntryRow> for RsvpEntry {
    type Error = StoreError;

    fn try_from(row: RsvpEntryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            status: decode_status(&row.rsvp_status)?,
            event: row.summary.try_into()?,
        })
    }
}

/// Parse a status column value.
pub(crate) fn decode_status(raw: &str) -> Result<RsvpStatus, StoreError> {
    RsvpStatus::parse(raw).map_err(|_| StoreError::Decode(format!("Unknown RSVP status: {raw}")))
}

/// Convert a list of rows, failing on the first bad one.
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// `ILIKE` pattern matching `needle` as a literal substring.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
