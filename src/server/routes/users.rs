//! User management endpoints

use crate::server::extract::Authenticated;
use crate::server::routes::{ApiResponse, listing_response, take_expected_version};
use crate::server::state::AppState;
use crate::services::NewUser;
use actix_web::{HttpResponse, Result as ActixResult, web};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Configure user routes, including the access-map editor
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .service(
                web::resource("")
                    .route(web::get().to(list_users))
                    .route(web::post().to(create_user)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_user))
                    .route(web::put().to(update_user))
                    .route(web::delete().to(delete_user)),
            )
            .route("/{id}/capabilities", web::put().to(set_capabilities))
            .configure(super::access::configure_routes),
    );
}

/// Capability flag changes; `null` clears a flag
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityChanges {
    pub capabilities: BTreeMap<String, Option<bool>>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

async fn list_users(
    state: web::Data<AppState>,
    auth: Authenticated,
) -> ActixResult<HttpResponse> {
    let listing = state.users.list(&auth.principal).await?;
    Ok(listing_response(listing))
}

async fn create_user(
    state: web::Data<AppState>,
    auth: Authenticated,
    request: web::Json<NewUser>,
) -> ActixResult<HttpResponse> {
    let user = state
        .users
        .create(&auth.principal, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(user)))
}

async fn get_user(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let user = state.users.get(&auth.principal, &path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(user)))
}

async fn update_user(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<String>,
    body: web::Json<Map<String, Value>>,
) -> ActixResult<HttpResponse> {
    let mut changes = body.into_inner();
    let expected_version = take_expected_version(&mut changes)?;

    let user = state
        .users
        .update(&auth.principal, &path, &changes, expected_version)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(user)))
}

async fn delete_user(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    state.users.delete(&auth.principal, &path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok()))
}

async fn set_capabilities(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<String>,
    request: web::Json<CapabilityChanges>,
) -> ActixResult<HttpResponse> {
    let user = state
        .users
        .set_capabilities(
            &auth.principal,
            &path,
            &request.capabilities,
            request.expected_version,
        )
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(user)))
}
