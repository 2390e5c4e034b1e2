//! Business services
//!
//! Services check permissions, validate input, persist through the
//! document store and then update the directory cache.

pub mod access;
pub mod cache;
pub mod directory;
pub mod plant_view;
pub mod search;
pub mod users;

pub use access::{AccessEntry, AccessListing, AccessStore, ResourceOption};
pub use cache::{CacheLoader, CacheStatus, CachedCollection, DirectoryCache};
pub use directory::{DirectoryRecord, DirectoryService};
pub use plant_view::PlantDetail;
pub use search::{FieldMatch, SearchHit, SearchService};
pub use users::{NewUser, UserService};

use crate::storage::{FieldPatch, to_document_data};
use crate::utils::error::{DashboardError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A list result, possibly served from an older snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub stale: bool,
    pub error: Option<String>,
}

impl<T> Listing<T> {
    pub fn fresh(items: Vec<T>) -> Self {
        Self {
            items,
            stale: false,
            error: None,
        }
    }
}

/// A record together with its store version
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Versioned<T> {
    #[serde(flatten)]
    pub record: T,
    pub version: i64,
}

/// Merge field changes into a record.
///
/// Only `allowed` keys may appear in `changes`. Returns the merged record
/// and a patch holding the changed fields as they serialize after the merge;
/// a field that no longer serializes is removed.
pub(crate) fn merge_changes<T>(
    current: &T,
    changes: &Map<String, Value>,
    allowed: &[&str],
) -> Result<(T, FieldPatch)>
where
    T: Serialize + DeserializeOwned,
{
    if let Some(field) = changes.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(DashboardError::bad_request(format!(
            "Field '{}' cannot be changed",
            field
        )));
    }

    let mut data = to_document_data(current)?;
    for (key, value) in changes {
        data.insert(key.clone(), value.clone());
    }
    let merged: T = serde_json::from_value(Value::Object(data))
        .map_err(|e| DashboardError::bad_request(format!("Invalid field value: {}", e)))?;

    let normalized = to_document_data(&merged)?;
    let mut patch = FieldPatch::new();
    for key in changes.keys() {
        patch = match normalized.get(key) {
            Some(value) => patch.set(key, value)?,
            None => patch.remove(key)?,
        };
    }
    Ok((merged, patch))
}
