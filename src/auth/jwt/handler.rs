//! Core JWT handler implementation

use super::types::{AUDIENCE, Claims, ISSUER, JwtHandler};
use crate::config::AuthConfig;
use crate::utils::error::{DashboardError, Result};
use crate::utils::time::now_secs;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{debug, warn};
use uuid::Uuid;

impl JwtHandler {
    /// Create a new JWT handler
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            expiration: config.jwt_expiration,
        }
    }

    pub fn expiration(&self) -> u64 {
        self.expiration
    }

    /// Issue a session token for an auth identity
    pub fn create_session_token(&self, uid: &str, email: &str) -> Result<(String, Claims)> {
        let now = now_secs();
        let claims = Claims {
            sub: uid.to_string(),
            email: email.to_string(),
            iat: now,
            exp: now + self.expiration,
            iss: ISSUER.to_string(),
            aud: AUDIENCE.to_string(),
            jti: Uuid::new_v4().to_string(),
        };

        let header = Header::new(self.algorithm);
        let token = encode(&header, &claims, &self.encoding_key).map_err(DashboardError::Jwt)?;

        debug!("Created session token for user: {}", uid);
        Ok((token, claims))
    }

    /// Verify and decode a token
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[ISSUER]);
        validation.set_audience(&[AUDIENCE]);
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            warn!("JWT verification failed: {}", e);
            DashboardError::Jwt(e)
        })?;

        debug!("Token verified for user: {}", token_data.claims.sub);
        Ok(token_data.claims)
    }
}
