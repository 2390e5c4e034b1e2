//! Core authentication system implementation

use super::credentials::{AccountProvisioner, CredentialStore};
use super::jwt::{Claims, JwtHandler};
use super::rate_limiter::AuthRateLimiter;
use super::types::{SessionInfo, SignInResult};
use crate::config::AuthConfig;
use crate::storage::DocumentStore;
use crate::utils::error::{DashboardError, Result};
use crate::utils::time::now_secs;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Sign-in, session verification and sign-out
#[derive(Debug)]
pub struct AuthSystem {
    jwt: JwtHandler,
    credentials: Arc<CredentialStore>,
    /// Signed-out token ids and their expiry
    revoked: DashMap<String, u64>,
    limiter: AuthRateLimiter,
}

impl AuthSystem {
    pub fn new(config: &AuthConfig, store: Arc<dyn DocumentStore>) -> Self {
        info!("Initializing authentication system");
        Self {
            jwt: JwtHandler::new(config),
            credentials: Arc::new(CredentialStore::new(store)),
            revoked: DashMap::new(),
            limiter: AuthRateLimiter::from_limits(&config.sign_in),
        }
    }

    pub fn credentials(&self) -> Arc<CredentialStore> {
        self.credentials.clone()
    }

    /// Identity provisioning used by user management
    pub fn provisioner(&self) -> Arc<dyn AccountProvisioner> {
        self.credentials.clone()
    }

    pub fn rate_limiter(&self) -> &AuthRateLimiter {
        &self.limiter
    }

    /// Check credentials and issue a session token.
    ///
    /// `client_id` identifies the caller for lockout tracking.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
        client_id: &str,
    ) -> Result<SignInResult> {
        self.limiter
            .check_allowed(client_id)
            .map_err(|retry_after| DashboardError::RateLimit { retry_after })?;

        let credential = match self.credentials.authenticate(email, password).await {
            Ok(credential) => credential,
            Err(DashboardError::Auth(message)) => {
                warn!("Failed sign-in for {} from {}", email, client_id);
                if let Some(retry_after) = self.limiter.record_failure(client_id) {
                    return Err(DashboardError::RateLimit { retry_after });
                }
                return Err(DashboardError::Auth(message));
            }
            Err(e) => return Err(e),
        };
        self.limiter.record_success(client_id);

        let (token, claims) = self
            .jwt
            .create_session_token(&credential.uid, &credential.email)?;
        info!("User {} signed in", credential.uid);

        Ok(SignInResult {
            token,
            session: SessionInfo::from(&claims),
        })
    }

    /// Verify a token and reject signed-out sessions
    pub fn verify_session_token(&self, token: &str) -> Result<Claims> {
        let claims = self.jwt.verify_token(token)?;
        if self.revoked.contains_key(&claims.jti) {
            return Err(DashboardError::auth("Session has been signed out"));
        }
        Ok(claims)
    }

    /// Revoke the session until it would have expired anyway
    pub fn sign_out(&self, claims: &Claims) {
        self.revoked.insert(claims.jti.clone(), claims.exp);
        self.purge_revoked();
        info!("User {} signed out", claims.sub);
    }

    pub fn session_info(&self, claims: &Claims) -> SessionInfo {
        SessionInfo::from(claims)
    }

    pub async fn change_password(&self, claims: &Claims, current: &str, new: &str) -> Result<()> {
        self.credentials
            .change_password(&claims.sub, current, new)
            .await
    }

    fn purge_revoked(&self) {
        let now = now_secs();
        self.revoked.retain(|_, exp| *exp > now);
    }

    /// Periodic housekeeping
    pub fn cleanup(&self) {
        self.purge_revoked();
        self.limiter.cleanup_old_entries();
    }
}
