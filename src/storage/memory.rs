//! In-memory document store

use super::{Collection, Document, DocumentStore, FieldPatch, already_exists, version_conflict};
use crate::utils::error::{DashboardError, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Documents held in process memory
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<Collection, BTreeMap<String, Document>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    pub fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .get(&collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(
        &self,
        collection: Collection,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document> {
        let mut collections = self.collections.write();
        let docs = collections.entry(collection).or_default();
        if docs.contains_key(id) {
            return Err(already_exists(collection, id));
        }

        let doc = Document {
            id: id.to_string(),
            data,
            version: 1,
        };
        docs.insert(id.to_string(), doc.clone());
        debug!("Created {}/{}", collection, id);
        Ok(doc)
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
        Ok(self
            .collections
            .read()
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>> {
        Ok(self
            .collections
            .read()
            .get(&collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: &FieldPatch,
        expected_version: Option<i64>,
    ) -> Result<Document> {
        let mut collections = self.collections.write();
        let doc = collections
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| DashboardError::not_found(format!("{}/{} not found", collection, id)))?;

        if expected_version.is_some_and(|expected| expected != doc.version) {
            return Err(version_conflict(collection, id));
        }

        let mut data = doc.data.clone();
        patch.apply(&mut data)?;
        doc.data = data;
        doc.version += 1;
        debug!("Updated {}/{} to version {}", collection, id, doc.version);
        Ok(doc.clone())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool> {
        let removed = self
            .collections
            .write()
            .get_mut(&collection)
            .and_then(|docs| docs.remove(id))
            .is_some();
        debug!("Deleted {}/{}: {}", collection, id, removed);
        Ok(removed)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
