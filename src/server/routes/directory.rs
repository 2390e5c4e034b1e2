//! Regions, clients and plants
//!
//! The three directories share one set of generic handlers; the record type
//! picks the service out of [`AppState`].

use crate::core::models::{Client, Plant, Region};
use crate::server::extract::Authenticated;
use crate::server::routes::{ApiResponse, listing_response, take_expected_version};
use crate::server::state::AppState;
use crate::services::{DirectoryRecord, DirectoryService, PlantDetail};
use crate::utils::error::DashboardError;
use actix_web::{HttpResponse, Result as ActixResult, web};
use serde_json::{Map, Value};
use tracing::warn;

/// A directory record served over HTTP
pub trait DirectoryRoute: DirectoryRecord {
    /// Collection segment of the route, e.g. `/regions`
    const PATH: &'static str;

    fn service(state: &AppState) -> &DirectoryService<Self>;
}

impl DirectoryRoute for Region {
    const PATH: &'static str = "/regions";

    fn service(state: &AppState) -> &DirectoryService<Self> {
        &state.regions
    }
}

impl DirectoryRoute for Client {
    const PATH: &'static str = "/clients";

    fn service(state: &AppState) -> &DirectoryService<Self> {
        &state.clients
    }
}

impl DirectoryRoute for Plant {
    const PATH: &'static str = "/plants";

    fn service(state: &AppState) -> &DirectoryService<Self> {
        &state.plants
    }
}

/// Configure directory routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        directory_scope::<Region>().route("/{id}/access", web::get().to(record_access::<Region>)),
    )
    .service(
        directory_scope::<Client>().route("/{id}/access", web::get().to(record_access::<Client>)),
    )
    .service(directory_scope::<Plant>().route("/{id}/detail", web::get().to(plant_detail)));
}

fn directory_scope<T: DirectoryRoute>() -> actix_web::Scope {
    web::scope(T::PATH)
        .service(
            web::resource("")
                .route(web::get().to(list_records::<T>))
                .route(web::post().to(create_record::<T>)),
        )
        .service(
            web::resource("/{id}")
                .route(web::get().to(get_record::<T>))
                .route(web::put().to(update_record::<T>))
                .route(web::delete().to(delete_record::<T>)),
        )
}

async fn list_records<T: DirectoryRoute>(
    state: web::Data<AppState>,
    auth: Authenticated,
) -> ActixResult<HttpResponse> {
    let listing = T::service(&state).list(&auth.principal).await?;
    Ok(listing_response(listing))
}

/// Create from a JSON body; an `id` field requests a specific id
async fn create_record<T: DirectoryRoute>(
    state: web::Data<AppState>,
    auth: Authenticated,
    body: web::Json<Map<String, Value>>,
) -> ActixResult<HttpResponse> {
    let mut body = body.into_inner();
    let requested_id = match body.remove("id") {
        None | Some(Value::Null) => None,
        Some(Value::String(id)) => Some(id),
        Some(_) => return Err(DashboardError::invalid_field("id", "ID must be a string").into()),
    };
    let record: T = serde_json::from_value(Value::Object(body)).map_err(|e| {
        DashboardError::bad_request(format!("Invalid {} data: {}", T::LABEL.to_lowercase(), e))
    })?;

    let created = T::service(&state)
        .create(&auth.principal, record, requested_id)
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(created)))
}

async fn get_record<T: DirectoryRoute>(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let record = T::service(&state).get(&auth.principal, &path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(record)))
}

async fn update_record<T: DirectoryRoute>(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<String>,
    body: web::Json<Map<String, Value>>,
) -> ActixResult<HttpResponse> {
    let mut changes = body.into_inner();
    let expected_version = take_expected_version(&mut changes)?;

    let record = T::service(&state)
        .update(&auth.principal, &path, &changes, expected_version)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(record)))
}

async fn delete_record<T: DirectoryRoute>(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    T::service(&state).delete(&auth.principal, &path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok()))
}

/// The caller's effective access to one record
async fn record_access<T: DirectoryRoute>(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let access = T::service(&state).access(&auth.principal, &path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(access)))
}

/// A plant with its client and region names resolved
async fn plant_detail(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let plant = state.plants.get(&auth.principal, &path).await?;

    if let Err(e) = state.loader.refresh::<Region>().await {
        warn!("Showing plant {} with cached region names: {}", plant.record.id, e);
    }
    if let Err(e) = state.loader.refresh::<Client>().await {
        warn!("Showing plant {} with cached client names: {}", plant.record.id, e);
    }

    let detail = PlantDetail::resolve(plant.record, &state.cache);
    Ok(HttpResponse::Ok().json(ApiResponse::success_with_meta(
        detail,
        serde_json::json!({ "version": plant.version }),
    )))
}
