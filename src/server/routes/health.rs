//! Health check and version endpoints

use crate::server::routes::ApiResponse;
use crate::server::state::AppState;
use crate::services::CacheStatus;
use actix_web::{HttpResponse, Result as ActixResult, web};
use serde::Serialize;
use std::borrow::Cow;
use tracing::{debug, error};

/// Configure health check routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/health")
            .route("", web::get().to(health_check))
            .route("/detailed", web::get().to(detailed_health_check)),
    )
    .route("/version", web::get().to(version_info));
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: Cow<'static, str>,
    timestamp: chrono::DateTime<chrono::Utc>,
    version: Cow<'static, str>,
}

#[derive(Debug, Serialize)]
struct StoreHealth {
    backend: &'static str,
    healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct CollectionHealth {
    records: usize,
    #[serde(flatten)]
    status: CacheStatus,
}

#[derive(Debug, Serialize)]
struct DetailedHealthStatus {
    status: Cow<'static, str>,
    timestamp: chrono::DateTime<chrono::Utc>,
    version: Cow<'static, str>,
    uptime_seconds: u64,
    store: StoreHealth,
    users: CollectionHealth,
    regions: CollectionHealth,
    clients: CollectionHealth,
    plants: CollectionHealth,
}

#[derive(Debug, Serialize)]
struct VersionInfo {
    version: Cow<'static, str>,
    build_time: Cow<'static, str>,
    git_hash: Cow<'static, str>,
}

/// Liveness check; does not touch the store
pub async fn health_check() -> HttpResponse {
    debug!("Health check requested");

    HttpResponse::Ok().json(ApiResponse::success(HealthStatus {
        status: Cow::Borrowed("healthy"),
        timestamp: chrono::Utc::now(),
        version: Cow::Borrowed(env!("CARGO_PKG_VERSION")),
    }))
}

/// Store reachability plus the state of every cached collection.
///
/// Answers `503` while the store is unreachable.
async fn detailed_health_check(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    debug!("Detailed health check requested");

    let store = match state.store.health_check().await {
        Ok(()) => StoreHealth {
            backend: state.store.backend_name(),
            healthy: true,
            error: None,
        },
        Err(e) => {
            error!("Store health check failed: {}", e);
            StoreHealth {
                backend: state.store.backend_name(),
                healthy: false,
                error: Some(e.to_string()),
            }
        }
    };

    let cache = &state.cache;
    let healthy = store.healthy;
    let detailed = DetailedHealthStatus {
        status: if healthy {
            Cow::Borrowed("healthy")
        } else {
            Cow::Borrowed("degraded")
        },
        timestamp: chrono::Utc::now(),
        version: Cow::Borrowed(env!("CARGO_PKG_VERSION")),
        uptime_seconds: state.uptime_seconds(),
        store,
        users: CollectionHealth {
            records: cache.users.len(),
            status: cache.users.status(),
        },
        regions: CollectionHealth {
            records: cache.regions.len(),
            status: cache.regions.status(),
        },
        clients: CollectionHealth {
            records: cache.clients.len(),
            status: cache.clients.status(),
        },
        plants: CollectionHealth {
            records: cache.plants.len(),
            status: cache.plants.status(),
        },
    };

    let response = ApiResponse::success(detailed);
    if healthy {
        Ok(HttpResponse::Ok().json(response))
    } else {
        Ok(HttpResponse::ServiceUnavailable().json(response))
    }
}

/// Version and build information
async fn version_info() -> HttpResponse {
    debug!("Version info requested");

    HttpResponse::Ok().json(ApiResponse::success(VersionInfo {
        version: Cow::Borrowed(env!("CARGO_PKG_VERSION")),
        build_time: Cow::Borrowed(env!("BUILD_TIME")),
        git_hash: Cow::Borrowed(env!("GIT_HASH")),
    }))
}
