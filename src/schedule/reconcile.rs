//! Merge of server-held calendar items with the client-cached mirror
//!
//! Precedence: every authoritative item is kept; a cached item is added only
//! when no item already merged carries its identifier. Items are never
//! compared by content, so the same showing cached under a different id
//! shows up twice.

use chrono::TimeZone;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

use super::calendar::CalendarEntry;
use crate::db::schemas::Lead;

/// Identifier of a raw item, before any normalization
fn raw_identity(value: &Value) -> Option<String> {
    ["_id", "id"].iter().find_map(|key| match value.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Merge authoritative and cached items into one calendar, sorted by local
/// date then `HH:MM` time (stable).
///
/// Malformed items are logged and skipped. A malformed authoritative item
/// still reserves its identifier, so a stale cached copy cannot take its
/// place.
pub fn reconcile<Tz: TimeZone>(
    authoritative: Vec<Value>,
    cached: Vec<Value>,
    tz: &Tz,
) -> Vec<CalendarEntry> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged: Vec<CalendarEntry> = Vec::with_capacity(authoritative.len() + cached.len());

    for item in authoritative {
        let id = raw_identity(&item);
        match CalendarEntry::normalize(item, tz) {
            Ok(entry) => {
                if let Some(id) = &entry.id {
                    seen.insert(id.clone());
                }
                merged.push(entry);
            }
            Err(e) => {
                warn!(id = ?id, error = %e, "Skipping malformed authoritative calendar item");
                if let Some(id) = id {
                    seen.insert(id);
                }
            }
        }
    }

    let authoritative_count = merged.len();
    for item in cached {
        let entry = match CalendarEntry::normalize(item, tz) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping malformed cached calendar item");
                continue;
            }
        };
        match &entry.id {
            Some(id) if seen.contains(id) => {
                debug!(id = %id, "Cached calendar item already present");
                continue;
            }
            Some(id) => {
                seen.insert(id.clone());
            }
            None => {}
        }
        merged.push(entry);
    }

    debug!(
        authoritative = authoritative_count,
        cached = merged.len() - authoritative_count,
        "Reconciled calendar"
    );

    merged.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.time.cmp(&b.time)));
    merged
}

/// Showings embedded in leads, as raw calendar items tagged with their lead
pub fn lead_showings(leads: &[Lead]) -> Vec<Value> {
    leads
        .iter()
        .flat_map(|lead| {
            lead.showings().iter().filter_map(move |showing| {
                let mut value = serde_json::to_value(showing).ok()?;
                let item = value.as_object_mut()?;
                if let (Some(name), false) = (&lead.name, item.contains_key("leadName")) {
                    item.insert("leadName".into(), Value::from(name.clone()));
                }
                if let (Some(id), false) = (&lead.id, item.contains_key("leadId")) {
                    item.insert("leadId".into(), Value::from(id.clone()));
                }
                Some(value)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate, Utc};
    use serde_json::json;

    fn ids(entries: &[CalendarEntry]) -> Vec<&str> {
        entries.iter().filter_map(|e| e.id.as_deref()).collect()
    }

    #[test]
    fn test_cached_duplicate_loses() {
        let merged = reconcile(
            vec![json!({ "_id": "1", "date": "2024-01-25", "time": "09:00", "title": "server" })],
            vec![
                json!({ "id": "1", "date": "2024-01-25", "time": "09:00", "title": "cache" }),
                json!({ "id": "2", "date": "2024-01-25", "time": "08:00" }),
            ],
            &Utc,
        );

        assert_eq!(ids(&merged), vec!["2", "1"]);
        assert_eq!(merged[1].time, "09:00");
        assert_eq!(merged[1].title.as_deref(), Some("server"));
    }

    #[test]
    fn test_content_equal_items_are_not_merged() {
        let merged = reconcile(
            vec![json!({ "_id": "a", "date": "2024-01-25", "time": "10:00", "property": "1 Elm" })],
            vec![json!({ "id": "b", "date": "2024-01-25", "time": "10:00", "property": "1 Elm" })],
            &Utc,
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_cached_without_id_always_included() {
        let merged = reconcile(
            vec![json!({ "_id": "1", "date": "2024-01-25", "time": "09:00" })],
            vec![
                json!({ "date": "2024-01-25", "time": "09:00" }),
                json!({ "date": "2024-01-25", "time": "09:00" }),
            ],
            &Utc,
        );
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_repeated_cached_id_kept_once() {
        let merged = reconcile(
            vec![],
            vec![
                json!({ "id": "7", "date": "2024-01-26", "time": "11:00", "title": "first" }),
                json!({ "id": "7", "date": "2024-01-26", "time": "12:00", "title": "second" }),
            ],
            &Utc,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title.as_deref(), Some("first"));
    }

    #[test]
    fn test_malformed_items_skipped() {
        let merged = reconcile(
            vec![
                json!({ "_id": "1", "date": "not a date" }),
                json!(42),
                json!({ "_id": "2", "date": "2024-01-25", "time": "09:00" }),
            ],
            vec![
                json!({ "id": "1", "date": "2024-01-25", "time": "07:00" }),
                json!({ "id": "3", "date": "2024-01-25", "status": "maybe" }),
            ],
            &Utc,
        );
        assert_eq!(ids(&merged), vec!["2"]);
    }

    #[test]
    fn test_sorted_by_local_date_then_time() {
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let merged = reconcile(
            vec![
                json!({ "_id": "late", "date": "2024-01-26", "time": "08:00" }),
                json!({ "_id": "pm", "date": "2024-01-25", "time": "14:00" }),
            ],
            // 18:30Z on the 24th is midnight of the 25th in UTC+05:30
            vec![json!({ "id": "am", "date": "2024-01-24T18:30:00.000Z", "time": "09:30" })],
            &ist,
        );

        assert_eq!(ids(&merged), vec!["am", "pm", "late"]);
        assert_eq!(merged[0].date, NaiveDate::from_ymd_opt(2024, 1, 25).unwrap());
    }

    #[test]
    fn test_lead_showings_tagged_with_lead() {
        let lead: Lead = serde_json::from_value(json!({
            "_id": "65b1f0c2a4e5d6c7b8a9f001",
            "name": "Sarah Johnson",
            "showings": [
                { "id": "s1", "date": "2024-01-25", "time": "10:00", "property": "123 Maple Avenue" },
                { "id": "s2", "date": "2024-01-26", "time": "10:00", "property": "9 Birch", "leadName": "Kept" }
            ]
        }))
        .unwrap();

        let items = lead_showings(&[lead]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["leadName"], json!("Sarah Johnson"));
        assert_eq!(items[0]["leadId"], json!("65b1f0c2a4e5d6c7b8a9f001"));
        assert_eq!(items[1]["leadName"], json!("Kept"));
    }
}
