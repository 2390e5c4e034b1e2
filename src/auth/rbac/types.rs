//! RBAC type definitions

use crate::core::models::{ResourceAccess, User};
use crate::utils::error::DashboardError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The subject of a permission check
#[derive(Debug, Clone, PartialEq)]
pub enum Principal {
    /// No session
    Anonymous,
    /// Signed in, but the user record could not be loaded or decoded
    Unreadable(String),
    /// Signed in with a readable user record
    Known(User),
}

impl Principal {
    /// Build from a user lookup; errors and missing records become `Unreadable`
    pub fn from_lookup(uid: &str, lookup: Result<Option<User>, DashboardError>) -> Self {
        match lookup {
            Ok(Some(user)) => Principal::Known(user),
            Ok(None) => Principal::Unreadable(format!("no user record for {}", uid)),
            Err(e) => Principal::Unreadable(e.to_string()),
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Principal::Known(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_super_admin(&self) -> bool {
        self.user().is_some_and(User::is_super_admin)
    }

    /// Email for audit stamps
    pub fn actor(&self) -> &str {
        match self.user() {
            Some(user) if !user.email.is_empty() => &user.email,
            _ => "unknown",
        }
    }
}

impl From<User> for Principal {
    fn from(user: User) -> Self {
        Principal::Known(user)
    }
}

impl From<Option<User>> for Principal {
    fn from(user: Option<User>) -> Self {
        user.map_or(Principal::Anonymous, Principal::Known)
    }
}

/// Dashboard role label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    ClientAdmin,
    RegionAdmin,
    Default,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::ClientAdmin => "client_admin",
            Role::RegionAdmin => "region_admin",
            Role::Default => "default",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What granted an access or capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantSource {
    SuperAdmin,
    AccessMap,
    CapabilityFlag,
}

/// Why something was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    Unauthenticated,
    UnreadableUser,
    /// No access-map entry for the resource
    NoEntry,
    /// An entry exists with both flags off
    NoGrant,
    /// Capability flag absent or false
    FlagNotSet,
    /// Super-admin only
    NotSuperAdmin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "cause")]
pub enum AccessDecision {
    Granted(GrantSource),
    Denied(DenialReason),
}

/// Result of evaluating a principal against one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessEvaluation {
    #[serde(flatten)]
    pub access: ResourceAccess,
    pub decision: AccessDecision,
}

impl AccessEvaluation {
    pub fn granted(access: ResourceAccess, source: GrantSource) -> Self {
        Self {
            access,
            decision: AccessDecision::Granted(source),
        }
    }

    pub fn denied(reason: DenialReason) -> Self {
        Self {
            access: ResourceAccess::NONE,
            decision: AccessDecision::Denied(reason),
        }
    }

    /// May view the resource (either flag)
    pub fn can_read(&self) -> bool {
        self.access.allows_read()
    }

    pub fn can_write(&self) -> bool {
        self.access.write
    }
}

/// Result of a capability gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allowed(GrantSource),
    Denied(DenialReason),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allowed(_))
    }
}
