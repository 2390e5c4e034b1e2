//! Regions, clients and plants
//!
//! One generic service covers the three directories. Per-record behaviour
//! (validation, which fields are editable, how access is evaluated) comes
//! from [`DirectoryRecord`].

use super::cache::{CacheLoader, Cacheable};
use super::{Listing, Versioned, merge_changes};
use crate::auth::rbac::{self, AccessEvaluation, Principal};
use crate::core::ids::IdGenerator;
use crate::core::models::{
    Action, AuditFields, Capability, Client, Module, Plant, Region, ResourceKind,
};
use crate::storage::{DocumentStore, to_document_data};
use crate::utils::error::{DashboardError, Result};
use crate::utils::time::now_millis;
use crate::utils::validation::Validator;
use serde::Serialize;
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{info, warn};

/// A record managed by [`DirectoryService`]
pub trait DirectoryRecord: Cacheable + Serialize {
    /// Singular label used in messages, e.g. `Region`
    const LABEL: &'static str;
    const MODULE: Module;
    /// Fields accepted by `update`
    const EDITABLE: &'static [&'static str];

    fn set_id(&mut self, id: String);

    fn audit_mut(&mut self) -> &mut AuditFields;

    /// Field-level validation
    fn validate(&self) -> Result<()>;

    fn access_for(&self, principal: &Principal) -> AccessEvaluation;

    /// Checked on `create` after the capability gate
    fn may_create(&self, _principal: &Principal) -> bool {
        true
    }
}

const CONTACT_FIELDS: &[&str] = &["name", "phone", "email", "notes"];

fn validate_contact(name: &str, phone: &str, email: &str, notes: &str) -> Validator {
    let mut v = Validator::new();
    v.name("name", name, 2, 100)
        .phone("phone", phone)
        .optional_email("email", email)
        .notes("notes", notes);
    v
}

impl DirectoryRecord for Region {
    const LABEL: &'static str = "Region";
    const MODULE: Module = Module::Regions;
    const EDITABLE: &'static [&'static str] = CONTACT_FIELDS;

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }

    fn validate(&self) -> Result<()> {
        validate_contact(&self.name, &self.phone, &self.email, &self.notes).finish()
    }

    fn access_for(&self, principal: &Principal) -> AccessEvaluation {
        rbac::evaluate_access(principal, &self.id, ResourceKind::Region)
    }
}

impl DirectoryRecord for Client {
    const LABEL: &'static str = "Client";
    const MODULE: Module = Module::Clients;
    const EDITABLE: &'static [&'static str] = CONTACT_FIELDS;

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }

    fn validate(&self) -> Result<()> {
        validate_contact(&self.name, &self.phone, &self.email, &self.notes).finish()
    }

    fn access_for(&self, principal: &Principal) -> AccessEvaluation {
        rbac::evaluate_access(principal, &self.id, ResourceKind::Client)
    }
}

impl DirectoryRecord for Plant {
    const LABEL: &'static str = "Plant";
    const MODULE: Module = Module::Plants;
    const EDITABLE: &'static [&'static str] = &[
        "name", "phone", "email", "notes", "capacity", "status", "clientId", "regionId",
    ];

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }

    fn validate(&self) -> Result<()> {
        validate_contact(&self.name, &self.phone, &self.email, &self.notes)
            .capacity("capacity", self.capacity)
            .finish()
    }

    fn access_for(&self, principal: &Principal) -> AccessEvaluation {
        rbac::evaluate_plant_access(principal, self)
    }

    /// Attaching a new plant needs the same write access an edit would
    fn may_create(&self, principal: &Principal) -> bool {
        let attached = self.region_id.is_some() || self.client_id.is_some();
        !attached || self.access_for(principal).can_write()
    }
}

/// CRUD over one directory
pub struct DirectoryService<T> {
    store: Arc<dyn DocumentStore>,
    loader: CacheLoader,
    ids: Arc<IdGenerator>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for DirectoryService<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            loader: self.loader.clone(),
            ids: self.ids.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: DirectoryRecord> DirectoryService<T> {
    pub fn new(store: Arc<dyn DocumentStore>, loader: CacheLoader, ids: Arc<IdGenerator>) -> Self {
        Self {
            store,
            loader,
            ids,
            _record: PhantomData,
        }
    }

    /// Records the principal may read.
    ///
    /// When the store cannot be read, the last good snapshot is returned and
    /// marked stale.
    pub async fn list(&self, principal: &Principal) -> Result<Listing<T>> {
        let refreshed = self.loader.refresh::<T>().await;
        let cached = T::cached(self.loader.cache());
        let status = cached.status();

        if refreshed.is_err() && !status.loaded {
            return Err(DashboardError::unavailable(format!(
                "Could not load {}",
                T::COLLECTION
            )));
        }

        let items = cached
            .snapshot()
            .values()
            .filter(|record| record.access_for(principal).can_read())
            .cloned()
            .collect();

        Ok(Listing {
            items,
            stale: status.stale,
            error: status.error,
        })
    }

    /// One record with its version; requires read access
    pub async fn get(&self, principal: &Principal, id: &str) -> Result<Versioned<T>> {
        let doc = self
            .store
            .get(T::COLLECTION, id)
            .await?
            .ok_or_else(|| DashboardError::not_found(format!("{} not found", T::LABEL)))?;
        let record = T::from_document(&doc)?;

        if !record.access_for(principal).can_read() {
            return Err(DashboardError::access_denied());
        }
        Ok(Versioned {
            record,
            version: doc.version,
        })
    }

    /// Access the principal holds on one record
    pub async fn access(&self, principal: &Principal, id: &str) -> Result<AccessEvaluation> {
        let doc = self
            .store
            .get(T::COLLECTION, id)
            .await?
            .ok_or_else(|| DashboardError::not_found(format!("{} not found", T::LABEL)))?;
        let record = T::from_document(&doc)?;
        Ok(record.access_for(principal))
    }

    /// Create a record.
    ///
    /// With `requested_id` the id must be free; otherwise one is generated.
    pub async fn create(
        &self,
        principal: &Principal,
        mut record: T,
        requested_id: Option<String>,
    ) -> Result<T> {
        if !rbac::can(principal, Capability::new(T::MODULE, Action::Create)) {
            return Err(DashboardError::access_denied());
        }

        let requested_id = requested_id.filter(|id| !id.trim().is_empty());
        if let Some(id) = &requested_id {
            Validator::new().record_id("id", id).finish()?;
        }
        record.validate()?;
        if !record.may_create(principal) {
            return Err(DashboardError::access_denied());
        }
        *record.audit_mut() = AuditFields::created(principal.actor(), now_millis());

        let record = match requested_id {
            Some(id) => {
                if self.store.exists(T::COLLECTION, &id).await? {
                    return Err(self.id_taken());
                }
                record.set_id(id);
                self.insert(&record).await.map_err(|e| match e {
                    DashboardError::Conflict(_) => self.id_taken(),
                    other => other,
                })?;
                record
            }
            None => self.insert_with_generated_id(record).await?,
        };

        T::cached(self.loader.cache()).upsert(record.clone());
        info!("Created {} {} by {}", T::LABEL, record.key(), principal.actor());
        Ok(record)
    }

    async fn insert_with_generated_id(&self, mut record: T) -> Result<T> {
        let generated = self.ids.generate(self.store.as_ref(), T::COLLECTION).await?;
        record.set_id(generated.id);
        match self.insert(&record).await {
            Err(DashboardError::Conflict(_)) => {
                // Lost the race between the existence check and the insert
                warn!("Generated {} id {} was taken concurrently", T::LABEL, record.key());
                let generated = self.ids.generate(self.store.as_ref(), T::COLLECTION).await?;
                record.set_id(generated.id);
                self.insert(&record).await?;
                Ok(record)
            }
            Err(e) => Err(e),
            Ok(()) => Ok(record),
        }
    }

    async fn insert(&self, record: &T) -> Result<()> {
        let mut data = to_document_data(record)?;
        data.remove("id");
        self.store.create(T::COLLECTION, record.key(), data).await?;
        Ok(())
    }

    fn id_taken(&self) -> DashboardError {
        DashboardError::conflict(format!("{} ID already exists", T::LABEL))
    }

    /// Field-level update; requires write access before and after the change
    pub async fn update(
        &self,
        principal: &Principal,
        id: &str,
        changes: &Map<String, Value>,
        expected_version: Option<i64>,
    ) -> Result<Versioned<T>> {
        let current = self.get(principal, id).await?;
        if !current.record.access_for(principal).can_write() {
            return Err(DashboardError::access_denied());
        }

        let (merged, patch) = merge_changes(&current.record, changes, T::EDITABLE)?;
        merged.validate()?;
        if !merged.access_for(principal).can_write() {
            return Err(DashboardError::access_denied());
        }

        let now = now_millis();
        let patch = patch
            .set("updatedAt", now)?
            .set("updatedBy", principal.actor())?;
        let doc = self
            .store
            .update(T::COLLECTION, id, &patch, expected_version)
            .await?;
        let record = T::from_document(&doc)?;

        T::cached(self.loader.cache()).upsert(record.clone());
        info!("Updated {} {} by {}", T::LABEL, id, principal.actor());
        Ok(Versioned {
            record,
            version: doc.version,
        })
    }

    /// Delete a record. Plants referencing a deleted region or client keep
    /// the dangling reference.
    pub async fn delete(&self, principal: &Principal, id: &str) -> Result<()> {
        if !rbac::can(principal, Capability::new(T::MODULE, Action::Delete)) {
            return Err(DashboardError::access_denied());
        }

        if !self.store.delete(T::COLLECTION, id).await? {
            return Err(DashboardError::not_found(format!("{} not found", T::LABEL)));
        }

        T::cached(self.loader.cache()).remove(id);
        info!("Deleted {} {} by {}", T::LABEL, id, principal.actor());
        Ok(())
    }
}
