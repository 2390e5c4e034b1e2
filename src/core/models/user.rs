//! Dashboard user records

use super::access::{AccessMap, ResourceKind};
use super::capability::CapabilityFlags;
use super::{AuditFields, null_as_default};
use serde::{Deserialize, Serialize};

/// Value of `acc` marking a super-admin
pub const SUPER_ADMIN_ACC: &str = "super_admin";

/// Editable profile fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub zipcode: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub receive_notification: bool,
}

impl UserProfile {
    /// Field names a user may change on their own profile
    pub const FIELDS: &'static [&'static str] = &[
        "name",
        "phone",
        "address",
        "zipcode",
        "country",
        "state",
        "city",
        "notes",
        "receive_notification",
    ];
}

/// A dashboard user. The record id equals the auth identity's uid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(flatten)]
    pub profile: UserProfile,
    /// Role discriminator; only `super_admin` is meaningful
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acc: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "AccessMap::is_empty"
    )]
    pub region_access: AccessMap,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "AccessMap::is_empty"
    )]
    pub client_access: AccessMap,
    #[serde(flatten)]
    pub capabilities: CapabilityFlags,
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl User {
    pub fn is_super_admin(&self) -> bool {
        self.acc.as_deref() == Some(SUPER_ADMIN_ACC)
    }

    pub fn access_map(&self, kind: ResourceKind) -> &AccessMap {
        match kind {
            ResourceKind::Region => &self.region_access,
            ResourceKind::Client => &self.client_access,
        }
    }

    pub fn access_map_mut(&mut self, kind: ResourceKind) -> &mut AccessMap {
        match kind {
            ResourceKind::Region => &mut self.region_access,
            ResourceKind::Client => &mut self.client_access,
        }
    }

    /// Name if set, otherwise email
    pub fn display_name(&self) -> &str {
        if self.profile.name.trim().is_empty() {
            &self.email
        } else {
            &self.profile.name
        }
    }
}
