//! Per-resource access grants

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Read/write grant on one region or client.
///
/// The two flags are stored independently; a write-only entry round-trips
/// unchanged. Use [`ResourceAccess::allows_read`] when deciding visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceAccess {
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
}

impl ResourceAccess {
    pub const NONE: Self = Self {
        read: false,
        write: false,
    };
    pub const FULL: Self = Self {
        read: true,
        write: true,
    };

    pub fn new(read: bool, write: bool) -> Self {
        Self { read, write }
    }

    /// Viewing is allowed by either flag
    pub fn allows_read(&self) -> bool {
        self.read || self.write
    }

    pub fn is_none(&self) -> bool {
        !self.read && !self.write
    }

    /// Union of two grants
    pub fn union(self, other: Self) -> Self {
        Self {
            read: self.read || other.read,
            write: self.write || other.write,
        }
    }
}

/// Map of resource id to grant, as stored on the user record
pub type AccessMap = BTreeMap<String, ResourceAccess>;

/// Which access map a resource id lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Region,
    Client,
}

impl ResourceKind {
    /// Field name of the map on the user record
    pub fn access_field(&self) -> &'static str {
        match self {
            ResourceKind::Region => "regionAccess",
            ResourceKind::Client => "clientAccess",
        }
    }

    /// Human label used in messages
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Region => "Region",
            ResourceKind::Client => "Client",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Region => write!(f, "region"),
            ResourceKind::Client => write!(f, "client"),
        }
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    /// Accepts singular and plural forms as used in routes
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "region" | "regions" => Ok(Self::Region),
            "client" | "clients" => Ok(Self::Client),
            other => Err(format!("Unknown resource type: {}", other)),
        }
    }
}
