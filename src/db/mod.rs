//! Database layer for openhouse
//!
//! Provides the document store gateway (MongoDB, or in-memory for
//! development), identity normalization and the typed collection models.

pub mod identity;
pub mod mongo;
pub mod schemas;
pub mod store;

pub use identity::{externalize, internalize, to_external_id, to_storage_id, StorageId};
pub use mongo::{IntoIndexes, MongoClient};
pub use store::{DocumentStore, MemoryStore};
