//! Local-calendar normalization
//!
//! Dates arrive as plain `YYYY-MM-DD` strings, RFC 3339 instants or naive
//! date-times. Comparisons always happen on the calendar of the operator's
//! time zone, never on a UTC range.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::schemas::{EntryStatus, EventType, Extensions};
use crate::types::{CrmError, Result};

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];
const TIME_FORMATS: [&str; 4] = ["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"];

/// Local date-time of a date string.
///
/// A bare date is local midnight; an instant with an offset is converted
/// into `tz`; a naive date-time is taken as already local.
pub fn parse_local_datetime<Tz: TimeZone>(s: &str, tz: &Tz) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
        return Some(instant.with_timezone(tz).naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Local calendar day of a date string
pub fn parse_local_date<Tz: TimeZone>(s: &str, tz: &Tz) -> Option<NaiveDate> {
    parse_local_datetime(s, tz).map(|dt| dt.date())
}

/// Zero-padded `HH:MM`, so string order matches chronological order
pub fn normalize_time(s: &str) -> Option<String> {
    let s = s.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
        .map(|t| t.format("%H:%M").to_string())
}

/// Event or showing in the shape the calendar and dashboard display
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub date: NaiveDate,
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub status: EntryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    #[serde(flatten)]
    pub extra: Extensions,
}

/// Loose input shape shared by stored events, lead showings and mirror items
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    #[serde(rename = "_id", default)]
    storage_id: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(rename = "type", default)]
    event_type: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    property: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    lead_name: Option<String>,
    #[serde(default)]
    lead_id: Option<String>,
    #[serde(flatten)]
    extra: Extensions,
}

/// Identifier in string form; mirrors hold numeric timestamps too
fn identity(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Empty strings mean "not set" throughout the calendar shape
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn parse_enum<T: serde::de::DeserializeOwned + Default>(
    field: &str,
    value: Option<String>,
) -> Result<T> {
    match non_empty(value) {
        None => Ok(T::default()),
        Some(s) => serde_json::from_value(Value::String(s.clone()))
            .map_err(|_| CrmError::Validation(format!("unknown {} '{}'", field, s))),
    }
}

impl CalendarEntry {
    /// Normalize one raw item into the calendar shape.
    ///
    /// Status defaults to scheduled, type to viewing; `location` and
    /// `property` name the same address and fill each other in. Without
    /// an explicit time the local time of `date` is used.
    pub fn normalize<Tz: TimeZone>(value: Value, tz: &Tz) -> Result<Self> {
        if !value.is_object() {
            return Err(CrmError::Validation("calendar entry is not an object".into()));
        }
        let raw: RawEntry = serde_json::from_value(value)
            .map_err(|e| CrmError::Validation(format!("malformed calendar entry: {}", e)))?;

        let id = identity(raw.storage_id).or_else(|| identity(raw.id));

        let date_str = non_empty(raw.date)
            .ok_or_else(|| CrmError::Validation("calendar entry has no date".into()))?;
        let local = parse_local_datetime(&date_str, tz)
            .ok_or_else(|| CrmError::Validation(format!("unparseable date '{}'", date_str)))?;

        let time = match non_empty(raw.time) {
            Some(t) => normalize_time(&t)
                .ok_or_else(|| CrmError::Validation(format!("unparseable time '{}'", t)))?,
            None => local.format("%H:%M").to_string(),
        };

        // location wins when both are given
        let address = non_empty(raw.location).or(non_empty(raw.property));

        Ok(Self {
            id,
            date: local.date(),
            time,
            title: raw.title,
            event_type: parse_enum("type", raw.event_type)?,
            status: parse_enum("status", raw.status)?,
            description: raw.description,
            location: address.clone(),
            property: address,
            notes: raw.notes,
            lead_name: raw.lead_name,
            lead_id: raw.lead_id,
            extra: raw.extra,
        })
    }

    /// Local date-time of the entry
    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        normalize_time(&self.time)
            .and_then(|t| NaiveTime::parse_from_str(&t, "%H:%M").ok())
            .map(|t| self.date.and_time(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};
    use serde_json::json;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600 + 1800).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_only_is_local_midnight() {
        let dt = parse_local_datetime("2024-01-25", &ist()).unwrap();
        assert_eq!(dt, day(2024, 1, 25).and_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn test_instant_converts_to_local_day() {
        // local midnight in UTC+05:30, serialized as UTC
        assert_eq!(
            parse_local_date("2024-01-24T18:30:00.000Z", &ist()),
            Some(day(2024, 1, 25))
        );
        assert_eq!(
            parse_local_date("2024-01-24T18:30:00.000Z", &Utc),
            Some(day(2024, 1, 24))
        );
    }

    #[test]
    fn test_naive_datetime_is_already_local() {
        let dt = parse_local_datetime("2024-01-25T14:30:00", &ist()).unwrap();
        assert_eq!(dt, day(2024, 1, 25).and_hms_opt(14, 30, 0).unwrap());
        assert!(parse_local_datetime("next tuesday", &Utc).is_none());
    }

    #[test]
    fn test_normalize_time_pads() {
        assert_eq!(normalize_time("9:05").as_deref(), Some("09:05"));
        assert_eq!(normalize_time("14:30:00").as_deref(), Some("14:30"));
        assert_eq!(normalize_time("2:30 PM").as_deref(), Some("14:30"));
        assert_eq!(normalize_time("25:00"), None);
    }

    #[test]
    fn test_normalize_defaults_and_aliases() {
        let entry = CalendarEntry::normalize(
            json!({ "_id": "abc", "date": "2024-01-25", "time": "9:00", "location": "1 Elm St" }),
            &Utc,
        )
        .unwrap();

        assert_eq!(entry.id.as_deref(), Some("abc"));
        assert_eq!(entry.time, "09:00");
        assert_eq!(entry.status, EntryStatus::Scheduled);
        assert_eq!(entry.event_type, EventType::Viewing);
        assert_eq!(entry.property.as_deref(), Some("1 Elm St"));
        assert_eq!(entry.location.as_deref(), Some("1 Elm St"));
    }

    #[test]
    fn test_normalize_numeric_id_and_implicit_time() {
        let entry = CalendarEntry::normalize(
            json!({ "id": 1706171400000u64, "date": "2024-01-25T10:15:00Z", "property": "2 Oak" }),
            &Utc,
        )
        .unwrap();

        assert_eq!(entry.id.as_deref(), Some("1706171400000"));
        assert_eq!(entry.time, "10:15");
        assert_eq!(entry.location.as_deref(), Some("2 Oak"));
    }

    #[test]
    fn test_location_wins_over_property() {
        let entry = CalendarEntry::normalize(
            json!({
                "id": "s-9",
                "date": "2024-01-25",
                "time": "13:00",
                "location": "12 Harbor View",
                "property": "Harbor View listing"
            }),
            &Utc,
        )
        .unwrap();

        assert_eq!(entry.location.as_deref(), Some("12 Harbor View"));
        assert_eq!(entry.property.as_deref(), Some("12 Harbor View"));
    }

    #[test]
    fn test_normalize_rejects_malformed() {
        for bad in [
            json!("just a string"),
            json!({ "id": "1", "time": "09:00" }),
            json!({ "id": "1", "date": "someday" }),
            json!({ "id": "1", "date": "2024-01-25", "status": "postponed" }),
            json!({ "id": "1", "date": "2024-01-25", "type": "party" }),
            json!({ "id": "1", "date": "2024-01-25", "time": "noon" }),
        ] {
            assert!(CalendarEntry::normalize(bad.clone(), &Utc).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_entry_serializes_plain_date() {
        let entry =
            CalendarEntry::normalize(json!({ "id": "1", "date": "2024-01-25", "time": "08:00" }), &Utc)
                .unwrap();
        let out = serde_json::to_value(&entry).unwrap();
        assert_eq!(out["date"], json!("2024-01-25"));
        assert_eq!(out["type"], json!("viewing"));
        assert_eq!(out["status"], json!("scheduled"));
    }
}
