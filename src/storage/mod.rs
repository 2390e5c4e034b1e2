//! Document storage
//!
//! Records live in named collections as JSON documents with a store-managed
//! version counter. Two backends are provided: process memory and a SeaORM
//! database table.

pub mod database;
pub mod memory;
pub mod patch;

pub use database::SeaOrmDocumentStore;
pub use memory::MemoryDocumentStore;
pub use patch::{FieldPatch, PatchOp};

use crate::config::{StorageBackend, StorageConfig};
use crate::utils::error::{DashboardError, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Named collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Users,
    Clients,
    Regions,
    Plants,
    Credentials,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Users,
        Collection::Clients,
        Collection::Regions,
        Collection::Plants,
        Collection::Credentials,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Clients => "clients",
            Collection::Regions => "regions",
            Collection::Plants => "plants",
            Collection::Credentials => "credentials",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
    /// Incremented on every successful update
    pub version: i64,
}

impl Document {
    /// Decode into a record type; the document id wins over any `id` in the body
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        let mut data = self.data.clone();
        data.insert("id".to_string(), Value::String(self.id.clone()));
        Ok(serde_json::from_value(Value::Object(data))?)
    }
}

/// Serialize a record into a document body
pub fn to_document_data<T: Serialize>(record: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        _ => Err(DashboardError::internal("Record did not serialize to an object")),
    }
}

/// Asynchronous, fallible document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document; fails with `Conflict` if the id is taken
    async fn create(
        &self,
        collection: Collection,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document>;

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>>;

    async fn exists(&self, collection: Collection, id: &str) -> Result<bool> {
        Ok(self.get(collection, id).await?.is_some())
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>>;

    /// Merge a patch into an existing document.
    ///
    /// Fails with `NotFound` for a missing document and with `Conflict` when
    /// `expected_version` is given and does not match.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: &FieldPatch,
        expected_version: Option<i64>,
    ) -> Result<Document>;

    /// Remove a document; returns whether it existed
    async fn delete(&self, collection: Collection, id: &str) -> Result<bool>;

    async fn health_check(&self) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}

pub(crate) fn version_conflict(collection: Collection, id: &str) -> DashboardError {
    DashboardError::conflict(format!(
        "{} '{}' was modified by someone else, reload and try again",
        collection, id
    ))
}

pub(crate) fn already_exists(collection: Collection, id: &str) -> DashboardError {
    DashboardError::conflict(format!("Document {}/{} already exists", collection, id))
}

/// Build the configured store
pub async fn create_store(config: &StorageConfig) -> Result<Arc<dyn DocumentStore>> {
    match config.backend {
        StorageBackend::Memory => {
            info!("Using in-memory document store");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
        StorageBackend::Database => {
            let store = SeaOrmDocumentStore::connect(&config.database).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
    }
}
