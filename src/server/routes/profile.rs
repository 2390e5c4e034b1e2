//! The signed-in user's own record

use crate::auth::rbac::CapabilitySummary;
use crate::core::models::User;
use crate::server::extract::Authenticated;
use crate::server::routes::ApiResponse;
use crate::server::state::AppState;
use crate::services::Versioned;
use actix_web::{HttpResponse, Result as ActixResult, web};
use serde::Serialize;
use serde_json::{Map, Value};

/// Configure profile routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/me", web::get().to(me))
        .service(
            web::resource("/profile")
                .route(web::get().to(get_profile))
                .route(web::put().to(update_profile)),
        );
}

/// Caller's record together with what the pages may offer them
#[derive(Debug, Serialize)]
struct MeResponse {
    user: Versioned<User>,
    #[serde(flatten)]
    permissions: CapabilitySummary,
}

async fn me(state: web::Data<AppState>, auth: Authenticated) -> ActixResult<HttpResponse> {
    let user = state.users.me(&auth.principal).await?;
    let permissions = CapabilitySummary::for_principal(&auth.principal);

    Ok(HttpResponse::Ok().json(ApiResponse::success(MeResponse { user, permissions })))
}

async fn get_profile(
    state: web::Data<AppState>,
    auth: Authenticated,
) -> ActixResult<HttpResponse> {
    let user = state.users.me(&auth.principal).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(user)))
}

/// Edit name, phone and notes of the caller's own record
async fn update_profile(
    state: web::Data<AppState>,
    auth: Authenticated,
    changes: web::Json<Map<String, Value>>,
) -> ActixResult<HttpResponse> {
    let user = state
        .users
        .update_profile(&auth.principal, &changes)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(user)))
}
