//! HTTP route modules
//!
//! This module contains all HTTP route handlers organized by functionality.

pub mod access;
pub mod auth;
pub mod dashboard;
pub mod directory;
pub mod health;
pub mod profile;
pub mod search;
pub mod users;

use crate::services::Listing;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};

/// Prefix of every JSON API route
pub const API_PREFIX: &str = "/api/v1";

/// Register every route, pages last
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::configure_routes)
        .service(
            web::scope(API_PREFIX)
                .configure(auth::configure_routes)
                .configure(profile::configure_routes)
                .configure(users::configure_routes)
                .configure(directory::configure_routes)
                .configure(search::configure_routes),
        )
        .configure(dashboard::configure_routes);
}

/// Standard API response structure
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (if successful)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Additional metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: None,
        }
    }

    /// Create a successful response with metadata
    pub fn success_with_meta(data: T, meta: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: Some(meta),
        }
    }
}

impl ApiResponse<()> {
    /// Success without a payload
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            meta: None,
        }
    }
}

/// Listing metadata; `stale` is set when the items come from an older snapshot
#[derive(Debug, Clone, Serialize)]
pub struct ListMeta {
    pub count: usize,
    pub stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 200 response for a listing, with stale-snapshot metadata
pub fn listing_response<T: Serialize>(listing: Listing<T>) -> HttpResponse {
    let meta = ListMeta {
        count: listing.items.len(),
        stale: listing.stale,
        error: listing.error,
    };
    let meta = serde_json::to_value(meta).unwrap_or_default();
    HttpResponse::Ok().json(ApiResponse::success_with_meta(listing.items, meta))
}

/// `?expectedVersion=` on routes without a body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionQuery {
    pub expected_version: Option<i64>,
}

/// Split `expectedVersion` off a JSON change set
pub(crate) fn take_expected_version(
    body: &mut serde_json::Map<String, serde_json::Value>,
) -> crate::utils::error::Result<Option<i64>> {
    match body.remove("expectedVersion") {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => value.as_i64().map(Some).ok_or_else(|| {
            crate::utils::error::DashboardError::bad_request(
                "expectedVersion must be an integer",
            )
        }),
    }
}
