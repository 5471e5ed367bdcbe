//! Repositories over the CRM collections
//!
//! Repositories own the translation between boundary JSON and stored
//! documents. Identifiers leave as strings; store errors surface only as
//! [`CrmError::StoreUnavailable`].

pub mod events;
pub mod leads;

pub use events::EventRepository;
pub use leads::{LeadFilter, LeadRepository};

use bson::Document;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::db::{externalize, to_storage_id, StorageId};
use crate::types::{CrmError, Result};

/// Resolve the identifier of the document a write targets.
///
/// A string that is not a well-formed identifier cannot name any stored
/// document, so it is reported the same way as an unknown one.
pub(crate) fn target_id(id: &str, what: &str) -> Result<StorageId> {
    to_storage_id(id).map_err(|_| CrmError::NotFound(format!("{} not found: {}", what, id)))
}

/// Decode a stored document into its typed boundary model
pub(crate) fn decode<T: DeserializeOwned>(doc: Document) -> serde_json::Result<T> {
    serde_json::from_value(Value::Object(externalize(doc)))
}

/// Decode every document, skipping (and logging) the ones that no longer fit
pub(crate) fn decode_all<T: DeserializeOwned>(collection: &str, docs: Vec<Document>) -> Vec<T> {
    docs.into_iter()
        .filter_map(|doc| {
            let id = doc.get_object_id("_id").map(|oid| oid.to_hex()).ok();
            match decode(doc) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!(collection, id = ?id, error = %e, "Skipping malformed document");
                    None
                }
            }
        })
        .collect()
}
