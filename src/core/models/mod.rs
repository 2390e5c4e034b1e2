//! Core data models
//!
//! Wire shapes of the stored records. Field names follow the stored
//! documents (camelCase, with a few snake_case legacy keys).

pub mod access;
pub mod capability;
pub mod directory;
pub mod user;

pub use access::{AccessMap, ResourceAccess, ResourceKind};
pub use capability::{Action, Capability, CapabilityFlags, Module};
pub use directory::{Client, Plant, PlantStatus, Region};
pub use user::{SUPER_ADMIN_ACC, User, UserProfile};

use serde::{Deserialize, Deserializer, Serialize};

/// Who created and last touched a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    /// Older user records carry `lastUpdatedAt`
    #[serde(default, rename = "lastUpdatedAt", skip_serializing)]
    legacy_updated_at: Option<i64>,
    #[serde(default, rename = "lastUpdatedBy", skip_serializing)]
    legacy_updated_by: Option<String>,
}

impl AuditFields {
    /// Stamps for a freshly created record
    pub fn created(actor: &str, now: i64) -> Self {
        Self {
            created_at: Some(now),
            created_by: Some(actor.to_string()),
            updated_at: Some(now),
            updated_by: Some(actor.to_string()),
            ..Default::default()
        }
    }

    pub fn touch(&mut self, actor: &str, now: i64) {
        self.updated_at = Some(now);
        self.updated_by = Some(actor.to_string());
    }

    /// Last update time, falling back to the legacy key
    pub fn last_updated_at(&self) -> Option<i64> {
        self.updated_at.or(self.legacy_updated_at)
    }

    pub fn last_updated_by(&self) -> Option<&str> {
        self.updated_by
            .as_deref()
            .or(self.legacy_updated_by.as_deref())
    }

    /// Fold legacy keys into the current ones
    pub fn normalize(&mut self) {
        if self.updated_at.is_none() {
            self.updated_at = self.legacy_updated_at.take();
        }
        if self.updated_by.is_none() {
            self.updated_by = self.legacy_updated_by.take();
        }
    }
}

/// Treat `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Treat `null` and `""` as no reference
pub(crate) fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.trim().is_empty()))
}
