//! Event form validation.
//!
//! Clients submit events as loosely typed form fields. [`EventForm`] holds
//! them as received and [`EventForm::validate`] turns them into an
//! [`EventDraft`], reporting only the first rule that fails.

use crate::error::PlannerError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Raw event fields as submitted by a client.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventForm {
    /// Event title
    pub title: Option<String>,
    /// Event description
    pub description: Option<String>,
    /// Event date (RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` or `YYYY-MM-DD`, UTC)
    pub date: Option<String>,
    /// Event location
    pub location: Option<String>,
    /// Optional attendance cap, as text
    #[serde(deserialize_with = "lenient_text")]
    pub max_attendees: Option<String>,
    /// Visibility marker; `on` or `true` make the event public
    #[serde(deserialize_with = "lenient_text")]
    pub is_public: Option<String>,
}

/// Validated event fields, ready to be stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventDraft {
    /// Event title
    pub title: String,
    /// Event description
    pub description: String,
    /// When the event takes place
    pub date: DateTime<Utc>,
    /// Where the event takes place
    pub location: String,
    /// Advisory attendance cap
    pub max_attendees: Option<u32>,
    /// Whether the event is public
    pub is_public: bool,
}

impl EventForm {
    /// Validate the form.
    ///
    /// Rules are checked in order: title, description, date, location,
    /// max attendees. Visibility never fails.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::Validation`] carrying the message of the
    /// first rule that fails.
    pub fn validate(&self) -> Result<EventDraft, PlannerError> {
        let title = required(self.title.as_deref(), "Title is required")?;
        let description = required(self.description.as_deref(), "Description is required")?;
        let date = required(self.date.as_deref(), "Date is required")?;
        let date = parse_date(&date).ok_or_else(|| invalid("Date is invalid"))?;
        let location = required(self.location.as_deref(), "Location is required")?;
        let max_attendees = parse_capacity(self.max_attendees.as_deref())?;

        Ok(EventDraft {
            title,
            description,
            date,
            location,
            max_attendees,
            is_public: is_checked(self.is_public.as_deref()),
        })
    }
}

/// Scalar accepted where the form expects text.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// JSON clients send numbers and booleans; HTML forms send text.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(s) => s,
        Scalar::Int(n) => n.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Bool(b) => b.to_string(),
    }))
}

fn invalid(message: &str) -> PlannerError {
    PlannerError::Validation(message.to_string())
}

fn required(value: Option<&str>, message: &str) -> Result<String, PlannerError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(invalid(message)),
    }
}

/// Accepts RFC 3339, the `datetime-local` input format, or a bare date.
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_capacity(raw: Option<&str>) -> Result<Option<u32>, PlannerError> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    let n: i64 = raw
        .parse()
        .map_err(|_| invalid("Max attendees must be a number"))?;
    u32::try_from(n)
        .ok()
        .filter(|n| *n >= 1)
        .map(Some)
        .ok_or_else(|| invalid("Max attendees must be a positive number"))
}

fn is_checked(marker: Option<&str>) -> bool {
    marker.is_some_and(|m| {
        let m = m.trim();
        m.eq_ignore_ascii_case("on") || m.eq_ignore_ascii_case("true")
    })
}
