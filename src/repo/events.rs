//! Event repository

use bson::{DateTime, Document};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

use super::{decode, decode_all, target_id};
use crate::db::schemas::{CalendarEvent, EVENT_COLLECTION};
use crate::db::{internalize, to_storage_id, DocumentStore};
use crate::types::{CrmError, Result};

/// Fields the server owns on create
const SERVER_FIELDS: [&str; 3] = ["_id", "createdAt", "updatedAt"];

pub struct EventRepository {
    store: Arc<dyn DocumentStore>,
}

impl EventRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Every stored event
    pub async fn list_events(&self) -> Result<Vec<CalendarEvent>> {
        let docs = self.store.find(EVENT_COLLECTION, Document::new()).await?;
        debug!(count = docs.len(), "Listed events");
        Ok(decode_all(EVENT_COLLECTION, docs))
    }

    /// Insert an event, defaulting its status and stamping `createdAt`
    pub async fn create_event(&self, mut input: Map<String, Value>) -> Result<CalendarEvent> {
        for field in SERVER_FIELDS {
            input.remove(field);
        }
        let status_missing = match input.get("status") {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        };
        if status_missing {
            input.insert("status".into(), Value::from("scheduled"));
        }
        validate(&input)?;

        let mut doc = internalize(input)?;
        doc.insert("createdAt", DateTime::now());

        let id = self.store.insert_one(EVENT_COLLECTION, doc.clone()).await?;
        info!(event_id = %id, "Created event");

        doc.insert("_id", id);
        stored_event(doc)
    }

    /// `$set` every supplied field except `_id` and stamp `updatedAt`.
    ///
    /// Returns the identifier, the supplied fields and the new timestamp;
    /// fields not supplied are not read back.
    pub async fn update_event(&self, mut input: Map<String, Value>) -> Result<CalendarEvent> {
        let id = match input.remove("_id") {
            Some(Value::String(id)) => id,
            _ => return Err(CrmError::NotFound("Event not found: missing _id".into())),
        };
        let storage_id = target_id(&id, "Event")?;
        validate(&input)?;

        let mut fields = internalize(input)?;
        fields.insert("updatedAt", DateTime::now());

        let matched = self
            .store
            .set_fields(EVENT_COLLECTION, storage_id, fields.clone())
            .await?;
        if matched == 0 {
            return Err(CrmError::NotFound(format!("Event not found: {}", id)));
        }
        info!(event_id = %storage_id, "Updated event");

        fields.insert("_id", storage_id);
        stored_event(fields)
    }

    /// Remove one event. An identifier the store cannot address is a
    /// server-side failure here, unlike on update.
    pub async fn delete_event(&self, id: &str) -> Result<()> {
        let storage_id = to_storage_id(id)
            .map_err(|_| CrmError::Internal(format!("Cannot address event id: {}", id)))?;
        let deleted = self.store.delete_one(EVENT_COLLECTION, storage_id).await?;
        if deleted == 0 {
            return Err(CrmError::NotFound(format!("Event not found: {}", id)));
        }
        info!(event_id = %storage_id, "Deleted event");
        Ok(())
    }
}

/// Known fields must carry the model's types
fn validate(fields: &Map<String, Value>) -> Result<()> {
    serde_json::from_value::<CalendarEvent>(Value::Object(fields.clone()))
        .map(|_| ())
        .map_err(|e| CrmError::Validation(format!("Invalid event fields: {}", e)))
}

fn stored_event(doc: Document) -> Result<CalendarEvent> {
    decode(doc).map_err(|e| CrmError::Internal(format!("Event did not round-trip: {}", e)))
}
