//! Test fixtures
//!
//! Records are written directly into the store, bypassing the services, so
//! tests can start from any state including ones the API would refuse.

use async_trait::async_trait;
use roplant_admin::core::models::{
    Client, Plant, Region, ResourceAccess, SUPER_ADMIN_ACC, User, UserProfile,
};
use roplant_admin::storage::{
    Collection, Document, DocumentStore, FieldPatch, MemoryDocumentStore, to_document_data,
};
use roplant_admin::utils::error::{DashboardError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub fn memory_store() -> Arc<dyn DocumentStore> {
    Arc::new(MemoryDocumentStore::new())
}

/// Write `record` under `id`, as the services would
pub async fn seed<T: Serialize>(
    store: &dyn DocumentStore,
    collection: Collection,
    id: &str,
    record: &T,
) {
    let mut data = to_document_data(record).unwrap();
    data.remove("id");
    store.create(collection, id, data).await.unwrap();
}

pub fn user(id: &str, email: &str) -> User {
    User {
        id: id.to_string(),
        email: email.to_string(),
        profile: UserProfile {
            name: "Test User".to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn super_admin(id: &str) -> User {
    User {
        acc: Some(SUPER_ADMIN_ACC.to_string()),
        ..user(id, &format!("{}@plant.io", id))
    }
}

/// A user holding the given `(region, read, write)` grants
pub fn region_admin(id: &str, grants: &[(&str, bool, bool)]) -> User {
    let mut record = user(id, &format!("{}@plant.io", id));
    for (region, read, write) in grants {
        record
            .region_access
            .insert(region.to_string(), ResourceAccess::new(*read, *write));
    }
    record
}

pub fn region(id: &str, name: &str) -> Region {
    Region {
        id: id.to_string(),
        name: name.to_string(),
        ..Default::default()
    }
}

pub fn client(id: &str, name: &str) -> Client {
    Client {
        id: id.to_string(),
        name: name.to_string(),
        ..Default::default()
    }
}

pub fn plant(id: &str, name: &str, region_id: Option<&str>, client_id: Option<&str>) -> Plant {
    Plant {
        id: id.to_string(),
        name: name.to_string(),
        capacity: 500.0,
        region_id: region_id.map(str::to_string),
        client_id: client_id.map(str::to_string),
        ..Default::default()
    }
}

/// Memory store whose reads fail while switched off
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryDocumentStore,
    fail_reads: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_reads.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(DashboardError::unavailable("store offline"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn create(
        &self,
        collection: Collection,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document> {
        self.inner.create(collection, id, data).await
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
        self.check()?;
        self.inner.get(collection, id).await
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>> {
        self.check()?;
        self.inner.list(collection).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: &FieldPatch,
        expected_version: Option<i64>,
    ) -> Result<Document> {
        self.inner
            .update(collection, id, patch, expected_version)
            .await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool> {
        self.inner.delete(collection, id).await
    }

    async fn health_check(&self) -> Result<()> {
        self.check()
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}
