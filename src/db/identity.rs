//! Identity normalization between the store and the REST boundary
//!
//! MongoDB addresses documents by `ObjectId`; everything above the
//! repositories speaks plain strings. Conversion happens here exactly once
//! in each direction, together with the rest of the document shape
//! (BSON dates become ISO-8601 strings on the way out).

use bson::{oid::ObjectId, Bson, Document};
use chrono::SecondsFormat;
use serde_json::{Map, Number, Value};
use std::fmt;

use crate::types::{CrmError, Result};

/// Store-native document identifier.
///
/// Only the store gateway and the repositories hold one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageId(ObjectId);

impl StorageId {
    /// Fresh identifier, as the store would assign on insert
    pub fn generate() -> Self {
        Self(ObjectId::new())
    }

    pub(crate) fn from_object_id(oid: ObjectId) -> Self {
        Self(oid)
    }

    pub(crate) fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl fmt::Display for StorageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

impl From<StorageId> for Bson {
    fn from(id: StorageId) -> Self {
        Bson::ObjectId(id.0)
    }
}

/// Parse a boundary identifier into the store's native type
pub fn to_storage_id(s: &str) -> Result<StorageId> {
    ObjectId::parse_str(s.trim())
        .map(StorageId)
        .map_err(|_| CrmError::InvalidIdentifier(format!("Invalid identifier: {}", s)))
}

/// Render a store identifier for the boundary
pub fn to_external_id(id: &StorageId) -> String {
    id.0.to_hex()
}

/// Convert a stored document into its boundary JSON shape
pub fn externalize(doc: Document) -> Map<String, Value> {
    doc.into_iter()
        .map(|(key, value)| (key, bson_to_json(value)))
        .collect()
}

fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => Value::String(
            dt.to_chrono()
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        ),
        Bson::Document(doc) => Value::Object(externalize(doc)),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        Bson::String(s) => Value::String(s),
        Bson::Boolean(b) => Value::Bool(b),
        Bson::Int32(i) => Value::from(i),
        Bson::Int64(i) => Value::from(i),
        Bson::Double(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        Bson::Null | Bson::Undefined => Value::Null,
        other => other.into_relaxed_extjson(),
    }
}

/// Convert boundary JSON into a storable document
pub fn internalize(fields: Map<String, Value>) -> Result<Document> {
    bson::to_document(&fields)
        .map_err(|e| CrmError::Validation(format!("Unstorable document: {}", e)))
}
