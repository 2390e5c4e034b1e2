//! Plant detail with resolved names

use super::cache::DirectoryCache;
use crate::core::models::Plant;
use serde::Serialize;

/// Shown for a missing or dangling reference
pub const NOT_AVAILABLE: &str = "N/A";

/// A plant with its client and region names
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantDetail {
    #[serde(flatten)]
    pub plant: Plant,
    pub client_name: String,
    pub region_name: String,
}

impl PlantDetail {
    /// Resolve names from the cache; never fails
    pub fn resolve(plant: Plant, cache: &DirectoryCache) -> Self {
        let client_name = plant
            .client_id
            .as_deref()
            .and_then(|id| cache.client_name(id))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let region_name = plant
            .region_id
            .as_deref()
            .and_then(|id| cache.region_name(id))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Self {
            plant,
            client_name,
            region_name,
        }
    }
}
