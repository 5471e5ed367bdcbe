//! Calendar event schema

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::lead::Extensions;
use crate::db::mongo::IntoIndexes;

/// Collection name for events
pub const EVENT_COLLECTION: &str = "events";

/// Kind of calendar entry
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    #[default]
    Viewing,
    Meeting,
    OpenHouse,
    FollowUp,
    Call,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Viewing => "viewing",
            EventType::Meeting => "meeting",
            EventType::OpenHouse => "open-house",
            EventType::FollowUp => "follow-up",
            EventType::Call => "call",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of an event or showing
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

/// Event document at the REST boundary.
///
/// Every known field is optional so the same type validates both full
/// creation bodies and partial updates.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// ISO-8601 date or date-time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// `HH:MM`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EntryStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extensions,
}

impl IntoIndexes for CalendarEvent {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "date": 1, "time": 1 },
            Some(
                IndexOptions::builder()
                    .name("date_time_index".to_string())
                    .build(),
            ),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_type_wire_names() {
        let types: Vec<EventType> =
            serde_json::from_value(json!(["viewing", "meeting", "open-house", "follow-up", "call"]))
                .unwrap();
        assert_eq!(types[2], EventType::OpenHouse);
        assert_eq!(types[3].to_string(), "follow-up");
        assert!(serde_json::from_value::<EventType>(json!("party")).is_err());
    }

    #[test]
    fn test_event_keeps_extension_fields() {
        let input = json!({
            "_id": "65b1f0c2a4e5d6c7b8a9f010",
            "title": "Open house",
            "date": "2024-01-27",
            "time": "13:00",
            "type": "open-house",
            "attendees": ["a", "b"]
        });

        let event: CalendarEvent = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(event.event_type, Some(EventType::OpenHouse));
        assert_eq!(event.status, None);
        assert_eq!(serde_json::to_value(&event).unwrap(), input);
    }

    #[test]
    fn test_partial_event_parses() {
        let patch: CalendarEvent = serde_json::from_value(json!({ "status": "completed" })).unwrap();
        assert_eq!(patch.status, Some(EntryStatus::Completed));
        assert!(patch.title.is_none());
    }
}
