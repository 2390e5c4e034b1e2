//! Sign-in, sign-out and session endpoints

use crate::server::extract::{SESSION_COOKIE, Session, client_identifier};
use crate::server::routes::ApiResponse;
use crate::server::state::AppState;
use actix_web::cookie::time::Duration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use serde::Deserialize;
use tracing::{debug, info};

/// Configure authentication routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/sign-in", web::post().to(sign_in))
            .route("/sign-out", web::post().to(sign_out))
            .route("/session", web::get().to(session))
            .route("/change-password", web::post().to(change_password)),
    );
}

/// Sign-in request
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Change password request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.auth().secure_cookies)
        .max_age(Duration::seconds(state.config.auth().jwt_expiration as i64))
        .finish()
}

fn removal_cookie(state: &AppState) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.auth().secure_cookies)
        .max_age(Duration::ZERO)
        .finish()
}

/// Check credentials, set the session cookie and return the token
async fn sign_in(
    state: web::Data<AppState>,
    req: HttpRequest,
    request: web::Json<SignInRequest>,
) -> ActixResult<HttpResponse> {
    let client_id = client_identifier(&req);
    debug!("Sign-in attempt from {}", client_id);

    let result = state
        .auth
        .sign_in(&request.email, &request.password, &client_id)
        .await?;

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&state, result.token.clone()))
        .json(ApiResponse::success(result)))
}

/// Revoke the current session, if any, and clear the cookie
async fn sign_out(
    state: web::Data<AppState>,
    session: Option<Session>,
) -> ActixResult<HttpResponse> {
    match session {
        Some(session) => state.auth.sign_out(&session.claims),
        None => info!("Sign-out without a valid session"),
    }

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie(&state))
        .json(ApiResponse::ok()))
}

/// Current session details
async fn session(state: web::Data<AppState>, session: Session) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        state.auth.session_info(&session.claims),
    )))
}

async fn change_password(
    state: web::Data<AppState>,
    session: Session,
    request: web::Json<ChangePasswordRequest>,
) -> ActixResult<HttpResponse> {
    state
        .auth
        .change_password(
            &session.claims,
            &request.current_password,
            &request.new_password,
        )
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok()))
}
