//! MongoDB client and store gateway
//!
//! One client is created at startup, verified with `ping`, shared through
//! `AppState` and shut down when the server stops.

use async_trait::async_trait;
use bson::{doc, Document};
use futures_util::StreamExt;
use mongodb::{
    options::{IndexOptions, ReturnDocument},
    Client, Collection, IndexModel,
};
use tracing::{error, info, warn};

use super::identity::StorageId;
use super::store::{id_filter, DocumentStore};
use crate::types::{CrmError, Result};

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and verify the connection.
    ///
    /// Server selection and connect timeouts are capped so an unreachable
    /// MongoDB fails fast instead of hanging startup.
    pub async fn new(uri: &str, db_name: &str, timeout_ms: u64) -> Result<Self> {
        info!("Connecting to MongoDB at {}", uri);

        let separator = if uri.contains('?') { '&' } else { '?' };
        let timeout_uri = format!(
            "{}{}serverSelectionTimeoutMS={}&connectTimeoutMS={}",
            uri, separator, timeout_ms, timeout_ms
        );

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| CrmError::StoreUnavailable(format!("Failed to connect to MongoDB: {}", e)))?;

        let mongo = Self {
            client,
            db_name: db_name.to_string(),
        };
        mongo.ping().await?;

        info!("Connected to MongoDB database '{}'", db_name);
        Ok(mongo)
    }

    /// Get a raw document collection
    pub fn collection(&self, name: &str) -> Collection<Document> {
        self.client.database(&self.db_name).collection(name)
    }

    /// Apply schema-defined indexes to a collection
    pub async fn ensure_indexes<T: IntoIndexes>(&self, collection: &str) -> Result<()> {
        let indices: Vec<IndexModel> = T::into_indices()
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        if indices.is_empty() {
            return Ok(());
        }

        self.collection(collection)
            .create_indexes(indices)
            .await
            .map_err(|e| CrmError::StoreUnavailable(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Close connection pools and end server sessions
    pub async fn shutdown(self) {
        info!("Shutting down MongoDB client");
        self.client.shutdown().await;
    }
}

/// Log the driver error and hide it behind a generic store failure
fn store_error(op: &str, collection: &str, err: mongodb::error::Error) -> CrmError {
    error!(op, collection, error = %err, "MongoDB operation failed");
    CrmError::StoreUnavailable(format!("{} failed on '{}': {}", op, collection, err))
}

#[async_trait]
impl DocumentStore for MongoClient {
    async fn find(&self, collection: &str, filter: Document) -> Result<Vec<Document>> {
        let cursor = self
            .collection(collection)
            .find(filter)
            .await
            .map_err(|e| store_error("find", collection, e))?;

        let results: Vec<Document> = cursor
            .filter_map(|doc| async {
                match doc {
                    Ok(d) => Some(d),
                    Err(e) => {
                        warn!(collection, "Error reading document: {}", e);
                        None
                    }
                }
            })
            .collect()
            .await;

        Ok(results)
    }

    async fn find_by_id(&self, collection: &str, id: StorageId) -> Result<Option<Document>> {
        self.collection(collection)
            .find_one(id_filter(id))
            .await
            .map_err(|e| store_error("find_one", collection, e))
    }

    async fn insert_one(&self, collection: &str, doc: Document) -> Result<StorageId> {
        let result = self
            .collection(collection)
            .insert_one(doc)
            .await
            .map_err(|e| store_error("insert_one", collection, e))?;

        result
            .inserted_id
            .as_object_id()
            .map(StorageId::from_object_id)
            .ok_or_else(|| CrmError::StoreUnavailable("Failed to get inserted ID".into()))
    }

    async fn set_fields(&self, collection: &str, id: StorageId, fields: Document) -> Result<u64> {
        let result = self
            .collection(collection)
            .update_one(id_filter(id), doc! { "$set": fields })
            .await
            .map_err(|e| store_error("update_one", collection, e))?;

        Ok(result.matched_count)
    }

    async fn set_fields_returning(
        &self,
        collection: &str,
        id: StorageId,
        fields: Document,
    ) -> Result<Option<Document>> {
        self.collection(collection)
            .find_one_and_update(id_filter(id), doc! { "$set": fields })
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| store_error("find_one_and_update", collection, e))
    }

    async fn delete_one(&self, collection: &str, id: StorageId) -> Result<u64> {
        let result = self
            .collection(collection)
            .delete_one(id_filter(id))
            .await
            .map_err(|e| store_error("delete_one", collection, e))?;

        Ok(result.deleted_count)
    }

    async fn ping(&self) -> Result<()> {
        self.client
            .database(&self.db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| CrmError::StoreUnavailable(format!("MongoDB ping failed: {}", e)))?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}
