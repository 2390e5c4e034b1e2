//! Editing the region and client access maps of a user

use crate::core::models::{ResourceAccess, ResourceKind};
use crate::server::extract::Authenticated;
use crate::server::routes::{ApiResponse, VersionQuery};
use crate::server::state::AppState;
use crate::utils::error::DashboardError;
use actix_web::{HttpResponse, Result as ActixResult, web};
use serde::Deserialize;

/// Routes below `/users`
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/{id}/access/{kind}")
            .route(web::get().to(list_access))
            .route(web::post().to(grant_access)),
    )
    .route("/{id}/access/{kind}/available", web::get().to(available))
    .service(
        web::resource("/{id}/access/{kind}/{resource_id}")
            .route(web::put().to(update_access))
            .route(web::delete().to(revoke_access)),
    );
}

/// New grant
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantRequest {
    pub resource_id: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Replacement flags for an existing grant
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessChange {
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

fn parse_kind(kind: &str) -> Result<ResourceKind, DashboardError> {
    kind.parse().map_err(DashboardError::BadRequest)
}

async fn list_access(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<(String, String)>,
) -> ActixResult<HttpResponse> {
    let (user_id, kind) = path.into_inner();
    let listing = state
        .access
        .list(&auth.principal, &user_id, parse_kind(&kind)?)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(listing)))
}

/// Resources not yet granted, optionally filtered by name
async fn available(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<(String, String)>,
    query: web::Query<SearchQuery>,
) -> ActixResult<HttpResponse> {
    let (user_id, kind) = path.into_inner();
    let options = state
        .access
        .available(
            &auth.principal,
            &user_id,
            parse_kind(&kind)?,
            query.search.as_deref(),
        )
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(options)))
}

async fn grant_access(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<(String, String)>,
    request: web::Json<GrantRequest>,
) -> ActixResult<HttpResponse> {
    let (user_id, kind) = path.into_inner();
    let listing = state
        .access
        .grant(
            &auth.principal,
            &user_id,
            parse_kind(&kind)?,
            &request.resource_id,
            ResourceAccess::new(request.read, request.write),
            request.expected_version,
        )
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(listing)))
}

async fn update_access(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<(String, String, String)>,
    request: web::Json<AccessChange>,
) -> ActixResult<HttpResponse> {
    let (user_id, kind, resource_id) = path.into_inner();
    let listing = state
        .access
        .update(
            &auth.principal,
            &user_id,
            parse_kind(&kind)?,
            &resource_id,
            ResourceAccess::new(request.read, request.write),
            request.expected_version,
        )
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(listing)))
}

async fn revoke_access(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<(String, String, String)>,
    query: web::Query<VersionQuery>,
) -> ActixResult<HttpResponse> {
    let (user_id, kind, resource_id) = path.into_inner();
    let listing = state
        .access
        .revoke(
            &auth.principal,
            &user_id,
            parse_kind(&kind)?,
            &resource_id,
            query.expected_version,
        )
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(listing)))
}
