//! Redirects unauthenticated page requests to the sign-in page

use crate::server::AppState;
use crate::server::extract::extract_session_token;
use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::header;
use actix_web::{HttpResponse, web};
use futures::future::{Ready, ready};
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

/// Guard for `/dashboard` page routes.
///
/// API routes are not touched; they answer `401` through the extractors.
pub struct DashboardGuard;

impl<S, B> Transform<S, ServiceRequest> for DashboardGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = DashboardGuardService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(DashboardGuardService { service }))
    }
}

/// Service implementation for the dashboard guard
pub struct DashboardGuardService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for DashboardGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if is_dashboard_path(req.path()) && !has_valid_session(&req) {
            let original = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/dashboard")
                .to_string();
            debug!("Redirecting unauthenticated request for {} to sign-in", original);

            let response = HttpResponse::Found()
                .insert_header((header::LOCATION, sign_in_redirect(&original)))
                .finish()
                .map_into_right_body();
            return Box::pin(async move { Ok(req.into_response(response)) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}

/// `/dashboard` itself and everything below it
pub fn is_dashboard_path(path: &str) -> bool {
    path == "/dashboard" || path.starts_with("/dashboard/")
}

/// Sign-in location that returns to `original` afterwards
pub fn sign_in_redirect(original: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(original.as_bytes()).collect();
    format!("/auth/sign-in?redirect={}", encoded)
}

fn has_valid_session(req: &ServiceRequest) -> bool {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        return false;
    };
    extract_session_token(req.headers())
        .is_some_and(|token| state.auth.verify_session_token(&token).is_ok())
}
