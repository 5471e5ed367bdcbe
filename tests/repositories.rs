//! Repositories over the in-memory store, feeding the scheduling core

use serde_json::{json, Map, Value};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use openhouse::db::schemas::Lead;
use openhouse::db::{DocumentStore, MemoryStore};
use openhouse::repo::{EventRepository, LeadFilter, LeadRepository};
use openhouse::schedule::{bucket_by_date, lead_showings, reconcile};
use openhouse::CrmError;
use tokio_test::{assert_err, assert_ok};

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

fn store() -> Arc<dyn DocumentStore> {
    Arc::new(MemoryStore::new())
}

#[tokio::test]
async fn lead_create_update_delete() {
    let leads = LeadRepository::new(store());

    let input: Lead = serde_json::from_value(json!({
        "name": "David Thompson",
        "email": "david.t@example.com",
        "phone": "+917981847657",
        "property": "321 Birch Lane",
        "status": "Sell",
        "offers": [{
            "propertyAddress": "321 Birch Lane",
            "offerAmount": 850000,
            "offerDate": "2024-01-28",
            "status": "pending",
            "conditions": ["inspection"]
        }]
    }))
    .unwrap();

    let created = assert_ok!(leads.create_lead(input).await);
    let id = created.id.clone().unwrap();

    let updated = leads
        .update_lead(&id, object(json!({ "status": "Sold", "religion": "none" })))
        .await
        .unwrap();
    assert_eq!(updated.status.as_deref(), Some("Sold"));
    assert_eq!(updated.offers, created.offers);
    assert_eq!(updated.extra["religion"], json!("none"));

    let err = assert_err!(
        leads
            .update_lead("missing-id", object(json!({ "status": "Lost" })))
            .await
    );
    assert!(matches!(err, CrmError::NotFound(_)));

    assert_ok!(leads.delete_lead(&id).await);
    assert!(leads
        .list_leads(&LeadFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn missing_required_field_never_writes() {
    let store = Arc::new(MemoryStore::new());
    let leads = LeadRepository::new(store.clone());

    let input: Lead = serde_json::from_value(json!({
        "name": "Lisa Martinez",
        "email": "lisa.m@example.com",
        "phone": "",
        "property": "654 Cedar Court"
    }))
    .unwrap();

    assert!(matches!(
        leads.create_lead(input).await.unwrap_err(),
        CrmError::Validation(_)
    ));
    assert!(store.is_empty("leads"));
}

#[tokio::test]
async fn stored_events_and_showings_reconcile_with_mirror() {
    let store = store();
    let events = EventRepository::new(Arc::clone(&store));
    let leads = LeadRepository::new(Arc::clone(&store));

    let event = events
        .create_event(object(json!({
            "title": "Team meeting",
            "date": "2024-01-25",
            "time": "11:00",
            "type": "meeting"
        })))
        .await
        .unwrap();
    let event_id = event.id.clone().unwrap();

    let lead: Lead = serde_json::from_value(json!({
        "name": "Michael Chen",
        "email": "mchen@example.com",
        "phone": "+917981847657",
        "property": "456 Oak Street",
        "showings": [
            { "id": "s-1", "date": "2024-01-25", "time": "09:30", "property": "456 Oak Street" }
        ]
    }))
    .unwrap();
    leads.create_lead(lead).await.unwrap();

    let mut authoritative: Vec<Value> = events
        .list_events()
        .await
        .unwrap()
        .iter()
        .map(|e| serde_json::to_value(e).unwrap())
        .collect();
    authoritative.extend(lead_showings(
        &leads.list_leads(&LeadFilter::default()).await.unwrap(),
    ));

    let cached = vec![
        // stale copy of the stored event
        json!({ "id": event_id, "date": "2024-01-25", "time": "07:00", "title": "stale" }),
        json!({ "id": "1706169600000", "date": "2024-01-25", "time": "16:00", "property": "9 Elm" }),
        json!({ "id": "other-day", "date": "2024-01-26", "time": "10:00" }),
    ];

    let merged = reconcile(authoritative, cached, &Utc);
    let day = bucket_by_date(&merged, NaiveDate::from_ymd_opt(2024, 1, 25).unwrap());

    let titles: Vec<_> = day.iter().map(|e| (e.time.as_str(), e.id.as_deref())).collect();
    assert_eq!(
        titles,
        vec![
            ("09:30", Some("s-1")),
            ("11:00", Some(event_id.as_str())),
            ("16:00", Some("1706169600000")),
        ]
    );
    assert_eq!(day[0].lead_name.as_deref(), Some("Michael Chen"));
    assert_eq!(day[1].title.as_deref(), Some("Team meeting"));
    assert_eq!(merged.len(), 4);
}

#[tokio::test]
async fn deleting_an_event_twice() {
    let events = EventRepository::new(store());
    let id = events
        .create_event(object(json!({ "title": "Call", "date": "2024-01-25", "type": "call" })))
        .await
        .unwrap()
        .id
        .unwrap();

    assert_ok!(events.delete_event(&id).await);
    let err = assert_err!(events.delete_event(&id).await);
    assert!(matches!(err, CrmError::NotFound(_)));
}
