//! Lead repository
//!
//! Leads are written with a shallow `$set`: top-level fields overwrite,
//! nested objects are replaced whole, unknown fields are accepted.

use bson::{doc, Bson, Document};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

use super::{decode, decode_all, target_id};
use crate::db::schemas::{Lead, LEAD_COLLECTION};
use crate::db::{internalize, to_external_id, to_storage_id, DocumentStore};
use crate::types::{CrmError, Result};

const ASSIGNED_TO: &str = "assignedTo";

/// Query parameters for listing leads
#[derive(Debug, Clone, Default)]
pub struct LeadFilter {
    pub assigned_to: Option<String>,
}

impl LeadFilter {
    pub fn assigned_to(agent: impl Into<String>) -> Self {
        Self {
            assigned_to: Some(agent.into()),
        }
    }

    /// Store filter. Leads written by this service hold `assignedTo` as an
    /// ObjectId; older documents may hold the plain string, so both match.
    fn to_document(&self) -> Document {
        match self.assigned_to.as_deref().map(str::trim) {
            None | Some("") => doc! {},
            Some(agent) => match to_storage_id(agent) {
                Ok(oid) => doc! { "assignedTo": { "$in": [Bson::from(oid), agent] } },
                Err(_) => doc! { "assignedTo": agent },
            },
        }
    }
}

pub struct LeadRepository {
    store: Arc<dyn DocumentStore>,
}

impl LeadRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// All leads matching the filter; empty when nothing matches
    pub async fn list_leads(&self, filter: &LeadFilter) -> Result<Vec<Lead>> {
        let docs = self
            .store
            .find(LEAD_COLLECTION, filter.to_document())
            .await?;
        debug!(count = docs.len(), "Listed leads");
        Ok(decode_all(LEAD_COLLECTION, docs))
    }

    /// Insert a new lead and return it with its assigned identifier
    pub async fn create_lead(&self, mut lead: Lead) -> Result<Lead> {
        let missing = lead.missing_required();
        if !missing.is_empty() {
            return Err(CrmError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        lead.id = None;
        let mut fields = match serde_json::to_value(&lead)? {
            Value::Object(map) => map,
            _ => return Err(CrmError::Internal("Lead did not serialize to an object".into())),
        };
        let assigned = take_assigned_to(&mut fields)?;

        let mut doc = internalize(fields)?;
        if let Some(agent) = assigned {
            doc.insert(ASSIGNED_TO, agent);
        }

        let id = self.store.insert_one(LEAD_COLLECTION, doc).await?;
        info!(lead_id = %id, "Created lead");

        lead.id = Some(to_external_id(&id));
        Ok(lead)
    }

    /// Overwrite the supplied top-level fields and return the updated lead
    pub async fn update_lead(&self, id: &str, mut partial: Map<String, Value>) -> Result<Lead> {
        let storage_id = target_id(id, "Lead")?;

        partial.remove("_id");
        serde_json::from_value::<Lead>(Value::Object(partial.clone()))
            .map_err(|e| CrmError::Validation(format!("Invalid lead fields: {}", e)))?;

        let assigned = take_assigned_to(&mut partial)?;
        let mut fields = internalize(partial)?;
        if let Some(agent) = assigned {
            fields.insert(ASSIGNED_TO, agent);
        }

        let updated = if fields.is_empty() {
            self.store.find_by_id(LEAD_COLLECTION, storage_id).await?
        } else {
            self.store
                .set_fields_returning(LEAD_COLLECTION, storage_id, fields)
                .await?
        };

        let doc = updated.ok_or_else(|| CrmError::NotFound(format!("Lead not found: {}", id)))?;
        info!(lead_id = %storage_id, "Updated lead");

        decode(doc).map_err(|e| CrmError::Internal(format!("Stored lead {} is malformed: {}", id, e)))
    }

    pub async fn delete_lead(&self, id: &str) -> Result<()> {
        let storage_id = target_id(id, "Lead")?;
        let deleted = self.store.delete_one(LEAD_COLLECTION, storage_id).await?;
        if deleted == 0 {
            return Err(CrmError::NotFound(format!("Lead not found: {}", id)));
        }
        info!(lead_id = %storage_id, "Deleted lead");
        Ok(())
    }
}

/// Pull `assignedTo` out of the fields, converted to its stored form.
///
/// A non-empty string must be a valid identifier; other values (null, the
/// empty string) are stored as given.
fn take_assigned_to(fields: &mut Map<String, Value>) -> Result<Option<Bson>> {
    match fields.remove(ASSIGNED_TO) {
        None => Ok(None),
        Some(Value::String(agent)) if !agent.trim().is_empty() => {
            Ok(Some(to_storage_id(&agent)?.into()))
        }
        Some(Value::String(agent)) => Ok(Some(Bson::String(agent))),
        Some(Value::Null) => Ok(Some(Bson::Null)),
        Some(other) => Err(CrmError::InvalidIdentifier(format!(
            "assignedTo must be a string identifier, got {}",
            other
        ))),
    }
}
