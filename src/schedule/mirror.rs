//! Client-side calendar mirror
//!
//! The mirror is a JSON array of calendar items stored under the
//! `calendar_events` key. It is never authoritative: it does not assign
//! store identifiers and loses every identifier collision in
//! [`reconcile`](super::reconcile::reconcile).

use chrono::{TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::calendar::{normalize_time, parse_local_date, CalendarEntry};
use crate::db::schemas::{EntryStatus, EventType, Extensions};
use crate::types::{CrmError, Result};

/// Storage key of the mirror
pub const MIRROR_KEY: &str = "calendar_events";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalendarMirror {
    items: Vec<Value>,
}

impl CalendarMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<Value>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Value> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// File holding the mirror inside `dir`
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(format!("{}.json", MIRROR_KEY))
    }

    /// Load the mirror from `dir`.
    ///
    /// A missing file is an empty mirror. Content that is not a JSON array
    /// is discarded with a warning; a corrupt cache never blocks the
    /// calendar.
    pub async fn load(dir: &Path) -> Result<Self> {
        let path = Self::path_in(dir);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<Vec<Value>>(&bytes) {
            Ok(items) => {
                debug!(path = %path.display(), count = items.len(), "Loaded calendar mirror");
                Ok(Self { items })
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Discarding unreadable calendar mirror");
                Ok(Self::new())
            }
        }
    }

    /// Write the mirror to `dir`, creating the directory if needed
    pub async fn save(&self, dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(dir).await?;
        let bytes = serde_json::to_vec(&self.items)
            .map_err(|e| CrmError::Internal(format!("Failed to encode calendar mirror: {}", e)))?;
        tokio::fs::write(Self::path_in(dir), bytes).await?;
        Ok(())
    }

    /// Append an entry immediately, ahead of any server confirmation
    pub fn append(&mut self, entry: &CalendarEntry) -> Result<()> {
        let value = serde_json::to_value(entry)
            .map_err(|e| CrmError::Internal(format!("Failed to encode calendar entry: {}", e)))?;
        self.items.push(value);
        Ok(())
    }
}

/// Showing as entered by the operator, before it has an identifier
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ShowingDraft {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub property: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(rename = "type", default)]
    pub event_type: Option<EventType>,
    #[serde(default)]
    pub lead_name: Option<String>,
    #[serde(default)]
    pub lead_id: Option<String>,
}

fn required(field: &str, value: Option<String>) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| CrmError::Validation(format!("Missing required field: {}", field)))
}

impl ShowingDraft {
    /// Turn the draft into a scheduled calendar entry with a locally
    /// generated millisecond-timestamp identifier
    pub fn into_entry<Tz: TimeZone>(self, tz: &Tz) -> Result<CalendarEntry> {
        let date = required("date", self.date)?;
        let time = required("time", self.time)?;
        let property = required("property", self.property)?;

        let date = parse_local_date(&date, tz)
            .ok_or_else(|| CrmError::Validation(format!("Invalid date: {}", date)))?;
        let time = normalize_time(&time)
            .ok_or_else(|| CrmError::Validation(format!("Invalid time: {}", time)))?;

        Ok(CalendarEntry {
            id: Some(Utc::now().timestamp_millis().to_string()),
            date,
            time,
            title: Some(format!("Showing: {}", property)),
            event_type: self.event_type.unwrap_or_default(),
            status: EntryStatus::Scheduled,
            description: Some(self.notes.clone().unwrap_or_default()),
            location: Some(property.clone()),
            property: Some(property),
            notes: self.notes,
            lead_name: self.lead_name,
            lead_id: self.lead_id,
            extra: Extensions::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::reconcile::reconcile;
    use chrono::NaiveDate;
    use serde_json::json;

    fn draft() -> ShowingDraft {
        ShowingDraft {
            date: Some("2024-01-25".into()),
            time: Some("9:30".into()),
            property: Some("123 Maple Avenue".into()),
            notes: Some("Bring disclosures".into()),
            ..Default::default()
        }
    }

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("openhouse-mirror-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_draft_into_entry() {
        let entry = draft().into_entry(&Utc).unwrap();

        assert!(entry.id.as_deref().is_some_and(|id| id.parse::<i64>().is_ok()));
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 1, 25).unwrap());
        assert_eq!(entry.time, "09:30");
        assert_eq!(entry.title.as_deref(), Some("Showing: 123 Maple Avenue"));
        assert_eq!(entry.location.as_deref(), Some("123 Maple Avenue"));
        assert_eq!(entry.description.as_deref(), Some("Bring disclosures"));
        assert_eq!(entry.status, EntryStatus::Scheduled);
        assert_eq!(entry.event_type, EventType::Viewing);
    }

    #[test]
    fn test_draft_requires_fields() {
        for draft in [
            ShowingDraft { date: None, ..draft() },
            ShowingDraft { time: Some(" ".into()), ..draft() },
            ShowingDraft { property: None, ..draft() },
            ShowingDraft { time: Some("teatime".into()), ..draft() },
        ] {
            assert!(matches!(
                draft.into_entry(&Utc).unwrap_err(),
                CrmError::Validation(_)
            ));
        }
    }

    #[test]
    fn test_append_is_visible_in_merge() {
        let mut mirror = CalendarMirror::from_items(vec![json!({
            "id": "old", "date": "2024-01-25", "time": "08:00"
        })]);
        let entry = draft().into_entry(&Utc).unwrap();
        mirror.append(&entry).unwrap();

        assert_eq!(mirror.len(), 2);
        let merged = reconcile(vec![], mirror.into_items(), &Utc);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1], entry);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = scratch_dir();
        let mut mirror = CalendarMirror::new();
        mirror.append(&draft().into_entry(&Utc).unwrap()).unwrap();

        mirror.save(&dir).await.unwrap();
        let loaded = CalendarMirror::load(&dir).await.unwrap();
        assert_eq!(loaded, mirror);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_load_missing_or_corrupt_is_empty() {
        let dir = scratch_dir();
        assert!(CalendarMirror::load(&dir).await.unwrap().is_empty());

        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(CalendarMirror::path_in(&dir), b"{not json")
            .await
            .unwrap();
        assert!(CalendarMirror::load(&dir).await.unwrap().is_empty());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
