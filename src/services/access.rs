//! Editing a user's region and client access maps
//!
//! Every change is a patch of a single map entry, optionally guarded by the
//! version of the user document the caller last saw. Concurrent edits of
//! different entries both land; a stale version is rejected with `Conflict`.

use super::cache::{CacheLoader, Cacheable};
use crate::auth::rbac::{self, Principal};
use crate::core::models::{Client, Region, ResourceAccess, ResourceKind, User};
use crate::storage::{Collection, DocumentStore, FieldPatch};
use crate::utils::error::{DashboardError, Result};
use crate::utils::time::now_millis;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// One granted resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessEntry {
    pub resource_id: String,
    /// `None` when the resource no longer exists
    pub name: Option<String>,
    pub read: bool,
    pub write: bool,
}

/// A user's grants of one kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessListing {
    pub entries: Vec<AccessEntry>,
    /// User document version to send back with the next change
    pub version: i64,
}

/// A resource that can still be granted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceOption {
    pub id: String,
    pub name: String,
}

fn collection_for(kind: ResourceKind) -> Collection {
    match kind {
        ResourceKind::Region => Collection::Regions,
        ResourceKind::Client => Collection::Clients,
    }
}

/// Access-map editor
#[derive(Clone)]
pub struct AccessStore {
    store: Arc<dyn DocumentStore>,
    loader: CacheLoader,
}

impl AccessStore {
    pub fn new(store: Arc<dyn DocumentStore>, loader: CacheLoader) -> Self {
        Self { store, loader }
    }

    fn require_user_admin(principal: &Principal) -> Result<()> {
        if rbac::can_access_users(principal) {
            Ok(())
        } else {
            Err(DashboardError::access_denied())
        }
    }

    async fn load_user(&self, user_id: &str) -> Result<(User, i64)> {
        let doc = self
            .store
            .get(Collection::Users, user_id)
            .await?
            .ok_or_else(|| DashboardError::not_found("User not found"))?;
        Ok((User::from_document(&doc)?, doc.version))
    }

    async fn refresh_names(&self, kind: ResourceKind) -> Result<()> {
        match kind {
            ResourceKind::Region => self.loader.refresh::<Region>().await,
            ResourceKind::Client => self.loader.refresh::<Client>().await,
        }
    }

    /// Cached `(id, name)` pairs of one kind of resource
    fn names(&self, kind: ResourceKind) -> Vec<(String, String)> {
        let cache = self.loader.cache();
        match kind {
            ResourceKind::Region => cache
                .regions
                .snapshot()
                .values()
                .map(|r| (r.id.clone(), r.name.clone()))
                .collect(),
            ResourceKind::Client => cache
                .clients
                .snapshot()
                .values()
                .map(|c| (c.id.clone(), c.name.clone()))
                .collect(),
        }
    }

    fn listing(&self, user: &User, kind: ResourceKind, version: i64) -> AccessListing {
        let cache = self.loader.cache();
        let entries = user
            .access_map(kind)
            .iter()
            .map(|(id, access)| AccessEntry {
                resource_id: id.clone(),
                name: match kind {
                    ResourceKind::Region => cache.region_name(id),
                    ResourceKind::Client => cache.client_name(id),
                },
                read: access.read,
                write: access.write,
            })
            .collect();
        AccessListing { entries, version }
    }

    /// Granted entries joined with resource names
    pub async fn list(
        &self,
        principal: &Principal,
        user_id: &str,
        kind: ResourceKind,
    ) -> Result<AccessListing> {
        Self::require_user_admin(principal)?;
        let (user, version) = self.load_user(user_id).await?;
        self.refresh_names(kind).await?;
        Ok(self.listing(&user, kind, version))
    }

    /// Resources not yet granted, filtered by a case-insensitive name search
    pub async fn available(
        &self,
        principal: &Principal,
        user_id: &str,
        kind: ResourceKind,
        search: Option<&str>,
    ) -> Result<Vec<ResourceOption>> {
        Self::require_user_admin(principal)?;
        let (user, _) = self.load_user(user_id).await?;
        let granted = user.access_map(kind);
        let needle = search.map(|s| s.trim().to_lowercase()).unwrap_or_default();

        self.refresh_names(kind).await?;
        let mut options: Vec<ResourceOption> = self
            .names(kind)
            .into_iter()
            .filter(|(id, _)| !granted.contains_key(id))
            .filter(|(_, name)| needle.is_empty() || name.to_lowercase().contains(&needle))
            .map(|(id, name)| ResourceOption { id, name })
            .collect();
        options.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(options)
    }

    async fn write_entry(
        &self,
        principal: &Principal,
        user_id: &str,
        kind: ResourceKind,
        patch: FieldPatch,
        expected_version: Option<i64>,
    ) -> Result<AccessListing> {
        let patch = patch
            .set("updatedAt", now_millis())?
            .set("updatedBy", principal.actor())?;
        let doc = self
            .store
            .update(Collection::Users, user_id, &patch, expected_version)
            .await?;

        let user = User::from_document(&doc)?;
        // The write is stored; names in the reply are best effort
        if let Err(e) = self.refresh_names(kind).await {
            warn!("Serving cached {} names: {}", kind, e);
        }
        let listing = self.listing(&user, kind, doc.version);
        self.loader.cache().users.upsert(user);
        Ok(listing)
    }

    /// Add a new entry; fails if the resource is already granted
    pub async fn grant(
        &self,
        principal: &Principal,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &str,
        access: ResourceAccess,
        expected_version: Option<i64>,
    ) -> Result<AccessListing> {
        Self::require_user_admin(principal)?;
        let (user, _) = self.load_user(user_id).await?;

        if !self.store.exists(collection_for(kind), resource_id).await? {
            return Err(DashboardError::not_found(format!("{} not found", kind.label())));
        }
        if user.access_map(kind).contains_key(resource_id) {
            return Err(DashboardError::conflict(format!(
                "{} access already granted",
                kind.label()
            )));
        }

        let patch = FieldPatch::new().set_path(&[kind.access_field(), resource_id], access)?;
        let listing = self
            .write_entry(principal, user_id, kind, patch, expected_version)
            .await?;
        info!(
            "Granted {} {} {:?} to user {} by {}",
            kind, resource_id, access, user_id, principal.actor()
        );
        Ok(listing)
    }

    /// Change an existing entry
    pub async fn update(
        &self,
        principal: &Principal,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &str,
        access: ResourceAccess,
        expected_version: Option<i64>,
    ) -> Result<AccessListing> {
        Self::require_user_admin(principal)?;
        let (user, _) = self.load_user(user_id).await?;
        if !user.access_map(kind).contains_key(resource_id) {
            return Err(DashboardError::not_found(format!(
                "No {} access entry for {}",
                kind, resource_id
            )));
        }

        let patch = FieldPatch::new().set_path(&[kind.access_field(), resource_id], access)?;
        let listing = self
            .write_entry(principal, user_id, kind, patch, expected_version)
            .await?;
        info!(
            "Changed {} {} to {:?} for user {} by {}",
            kind, resource_id, access, user_id, principal.actor()
        );
        Ok(listing)
    }

    /// Remove an entry
    pub async fn revoke(
        &self,
        principal: &Principal,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &str,
        expected_version: Option<i64>,
    ) -> Result<AccessListing> {
        Self::require_user_admin(principal)?;
        let (user, _) = self.load_user(user_id).await?;
        if !user.access_map(kind).contains_key(resource_id) {
            return Err(DashboardError::not_found(format!(
                "No {} access entry for {}",
                kind, resource_id
            )));
        }

        let patch = FieldPatch::new().remove_path(&[kind.access_field(), resource_id])?;
        let listing = self
            .write_entry(principal, user_id, kind, patch, expected_version)
            .await?;
        info!(
            "Revoked {} {} from user {} by {}",
            kind, resource_id, user_id, principal.actor()
        );
        Ok(listing)
    }
}
