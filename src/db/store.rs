//! Document store gateway
//!
//! Collection-scoped find/insert/update/delete over schema-less documents.
//! [`MongoClient`](super::MongoClient) is the production implementation;
//! [`MemoryStore`] backs development mode and tests.

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use dashmap::DashMap;
use tracing::debug;

use super::identity::StorageId;
use crate::types::Result;

/// Collection-scoped access to a document store.
///
/// Every call is atomic at single-document granularity; nothing here spans
/// more than one document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents matching `filter` (top-level equality and `$in`)
    async fn find(&self, collection: &str, filter: Document) -> Result<Vec<Document>>;

    /// One document by identifier
    async fn find_by_id(&self, collection: &str, id: StorageId) -> Result<Option<Document>>;

    /// Insert a document, returning the store-assigned identifier
    async fn insert_one(&self, collection: &str, doc: Document) -> Result<StorageId>;

    /// `$set` top-level fields on one document, returning the matched count
    async fn set_fields(&self, collection: &str, id: StorageId, fields: Document) -> Result<u64>;

    /// `$set` top-level fields and return the post-update document
    async fn set_fields_returning(
        &self,
        collection: &str,
        id: StorageId,
        fields: Document,
    ) -> Result<Option<Document>>;

    /// Delete one document, returning the deleted count
    async fn delete_one(&self, collection: &str, id: StorageId) -> Result<u64>;

    /// Health check
    async fn ping(&self) -> Result<()>;

    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;
}

/// In-memory document store.
///
/// Documents keep insertion order per collection. Field keys are treated
/// literally (no dotted-path updates).
#[derive(Default)]
pub struct MemoryStore {
    collections: DashMap<String, Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

fn id_matches(doc: &Document, id: StorageId) -> bool {
    matches!(doc.get("_id"), Some(Bson::ObjectId(oid)) if *oid == id.object_id())
}

/// Evaluate the filter subset the repositories use
fn filter_matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, condition)| {
        let value = doc.get(key);
        match condition {
            Bson::Document(op) if op.contains_key("$in") => match op.get_array("$in") {
                Ok(candidates) => value.is_some_and(|v| candidates.contains(v)),
                Err(_) => false,
            },
            expected => value == Some(expected),
        }
    })
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, collection: &str, filter: Document) -> Result<Vec<Document>> {
        let docs = self
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| filter_matches(d, &filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(docs)
    }

    async fn find_by_id(&self, collection: &str, id: StorageId) -> Result<Option<Document>> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| id_matches(d, id)).cloned()))
    }

    async fn insert_one(&self, collection: &str, mut doc: Document) -> Result<StorageId> {
        let id = StorageId::generate();
        doc.insert("_id", id);
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(doc);
        debug!(collection, id = %id, "Inserted document (memory)");
        Ok(id)
    }

    async fn set_fields(&self, collection: &str, id: StorageId, fields: Document) -> Result<u64> {
        Ok(self
            .set_fields_returning(collection, id, fields)
            .await?
            .map_or(0, |_| 1))
    }

    async fn set_fields_returning(
        &self,
        collection: &str,
        id: StorageId,
        fields: Document,
    ) -> Result<Option<Document>> {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(doc) = docs.iter_mut().find(|d| id_matches(d, id)) else {
            return Ok(None);
        };
        for (key, value) in fields {
            doc.insert(key, value);
        }
        Ok(Some(doc.clone()))
    }

    async fn delete_one(&self, collection: &str, id: StorageId) -> Result<u64> {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|d| !id_matches(d, id));
        Ok((before - docs.len()) as u64)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Filter selecting one document by identifier
pub fn id_filter(id: StorageId) -> Document {
    doc! { "_id": id }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_assigns_id() {
        let store = MemoryStore::new();
        let id = store
            .insert_one("events", doc! { "title": "Open house" })
            .await
            .unwrap();

        let found = store.find_by_id("events", id).await.unwrap().unwrap();
        assert_eq!(found.get_str("title").unwrap(), "Open house");
        assert_eq!(store.len("events"), 1);
    }

    #[tokio::test]
    async fn test_find_filters_by_equality_and_in() {
        let store = MemoryStore::new();
        store.insert_one("leads", doc! { "agent": "a" }).await.unwrap();
        store.insert_one("leads", doc! { "agent": "b" }).await.unwrap();
        store.insert_one("leads", doc! { "other": 1 }).await.unwrap();

        assert_eq!(store.find("leads", doc! {}).await.unwrap().len(), 3);
        assert_eq!(
            store.find("leads", doc! { "agent": "a" }).await.unwrap().len(),
            1
        );
        assert_eq!(
            store
                .find("leads", doc! { "agent": { "$in": ["a", "b"] } })
                .await
                .unwrap()
                .len(),
            2
        );
        assert!(store.find("missing", doc! {}).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_fields_overwrites_top_level() {
        let store = MemoryStore::new();
        let id = store
            .insert_one("leads", doc! { "prefs": { "min": 1, "max": 2 }, "keep": true })
            .await
            .unwrap();

        let updated = store
            .set_fields_returning("leads", id, doc! { "prefs": { "min": 5 } })
            .await
            .unwrap()
            .unwrap();

        let prefs = updated.get_document("prefs").unwrap();
        assert_eq!(prefs.get_i32("min").unwrap(), 5);
        assert!(!prefs.contains_key("max"));
        assert!(updated.get_bool("keep").unwrap());
    }

    #[tokio::test]
    async fn test_unknown_id_matches_nothing() {
        let store = MemoryStore::new();
        store.insert_one("events", doc! {}).await.unwrap();
        let stranger = StorageId::generate();

        assert_eq!(store.set_fields("events", stranger, doc! { "a": 1 }).await.unwrap(), 0);
        assert_eq!(store.delete_one("events", stranger).await.unwrap(), 0);
        assert_eq!(store.len("events"), 1);
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let store = MemoryStore::new();
        let id = store.insert_one("events", doc! {}).await.unwrap();
        assert_eq!(store.delete_one("events", id).await.unwrap(), 1);
        assert_eq!(store.delete_one("events", id).await.unwrap(), 0);
        assert!(store.is_empty("events"));
    }
}
