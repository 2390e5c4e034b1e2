//! Session types returned to clients

use super::jwt::Claims;
use crate::utils::time::minutes_since;
use serde::Serialize;

/// Session introspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub uid: String,
    pub email: String,
    /// Epoch seconds
    pub issued_at: u64,
    /// Epoch seconds
    pub expires_at: u64,
    /// Minutes since sign-in
    pub active_minutes: u64,
}

impl From<&Claims> for SessionInfo {
    fn from(claims: &Claims) -> Self {
        Self {
            uid: claims.sub.clone(),
            email: claims.email.clone(),
            issued_at: claims.iat,
            expires_at: claims.exp,
            active_minutes: minutes_since(claims.iat),
        }
    }
}

/// Successful sign-in
#[derive(Debug, Clone, Serialize)]
pub struct SignInResult {
    pub token: String,
    pub session: SessionInfo,
}
