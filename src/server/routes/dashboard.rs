//! Dashboard pages served from the built single-page bundle
//!
//! Page routes all return `index.html`; the bundle renders the page for the
//! path, including its not-found page. Session checks for `/dashboard`
//! happen in [`DashboardGuard`](crate::server::middleware::DashboardGuard).

use crate::server::state::AppState;
use crate::utils::error::DashboardError;
use actix_files::{Files, NamedFile};
use actix_web::dev::{ServiceRequest, ServiceResponse, fn_service};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result as ActixResult, web};
use std::path::{Path, PathBuf};
use tracing::error;

/// Landing page after sign-in
pub const HOME_PAGE: &str = "/dashboard/home";

/// Configure page routes and static assets
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(redirect_home))
        .route("/dashboard", web::get().to(redirect_home))
        .route("/dashboard/{tail:.*}", web::get().to(page))
        .route("/auth/sign-in", web::get().to(page));
}

/// Static assets of the bundle; unknown paths fall back to the page shell
pub fn static_files(static_dir: &str) -> Files {
    let dir = PathBuf::from(static_dir);
    Files::new("/", static_dir).default_handler(fn_service(move |req: ServiceRequest| {
        let index = dir.join("index.html");
        async move {
            let (req, _) = req.into_parts();
            let response = match NamedFile::open_async(&index).await {
                Ok(file) => file.into_response(&req),
                Err(e) => bundle_missing(&index, e).error_response(),
            };
            Ok::<_, actix_web::Error>(ServiceResponse::new(req, response))
        }
    }))
}

async fn redirect_home() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, HOME_PAGE))
        .finish()
}

async fn page(state: web::Data<AppState>, req: HttpRequest) -> ActixResult<HttpResponse> {
    let index = Path::new(&state.config.server().static_dir).join("index.html");
    let file = NamedFile::open_async(&index)
        .await
        .map_err(|e| bundle_missing(&index, e))?;
    Ok(file.into_response(&req))
}

fn bundle_missing(index: &Path, e: std::io::Error) -> DashboardError {
    error!("Dashboard bundle not readable at {:?}: {}", index, e);
    DashboardError::not_found("Dashboard page not found")
}
