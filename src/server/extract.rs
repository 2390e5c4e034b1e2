//! Request extractors for signed-in callers

use crate::auth::Claims;
use crate::auth::rbac::Principal;
use crate::server::state::AppState;
use crate::utils::error::{DashboardError, Result};
use actix_web::dev::Payload;
use actix_web::http::header::{self, HeaderMap};
use actix_web::{FromRequest, HttpRequest, web};
use futures::future::{LocalBoxFuture, Ready, ready};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// Session token from the `Authorization: Bearer` header or the session cookie
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                let token = token.trim();
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }

    for cookie_header in headers.get_all(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                if let Some((name, value)) = cookie.trim().split_once('=') {
                    if name == SESSION_COOKIE && !value.is_empty() {
                        return Some(value.to_string());
                    }
                }
            }
        }
    }

    None
}

/// Identifier used for sign-in lockout tracking
pub fn client_identifier(req: &HttpRequest) -> String {
    req.connection_info()
        .peer_addr()
        .unwrap_or("unknown")
        .to_string()
}

fn app_state(req: &HttpRequest) -> Result<web::Data<AppState>> {
    req.app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| DashboardError::internal("Application state is not configured"))
}

/// A verified session token
#[derive(Debug, Clone)]
pub struct Session {
    pub claims: Claims,
}

fn verify_session(req: &HttpRequest) -> Result<Session> {
    let state = app_state(req)?;
    let token =
        extract_session_token(req.headers()).ok_or_else(|| DashboardError::auth("Not signed in"))?;
    let claims = state.auth.verify_session_token(&token)?;
    Ok(Session { claims })
}

impl FromRequest for Session {
    type Error = actix_web::Error;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(verify_session(req).map_err(Into::into))
    }
}

/// A verified session together with the caller's user record.
///
/// The record is looked up on every request so that access changes apply
/// without signing in again.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub claims: Claims,
    pub principal: Principal,
}

impl FromRequest for Authenticated {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let session = verify_session(req);
        let state = app_state(req);

        Box::pin(async move {
            let Session { claims } = session?;
            let state = state?;
            let principal = state.users.principal(&claims.sub).await;
            Ok(Self { claims, principal })
        })
    }
}
