//! JWT types and data structures

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use serde::{Deserialize, Serialize};

/// Issuer written into every session token
pub const ISSUER: &str = "roplant-admin";

/// Audience of dashboard session tokens
pub const AUDIENCE: &str = "dashboard";

/// JWT handler for token operations
#[derive(Clone)]
pub struct JwtHandler {
    pub(super) encoding_key: EncodingKey,
    pub(super) decoding_key: DecodingKey,
    pub(super) algorithm: Algorithm,
    /// Token lifetime in seconds
    pub(super) expiration: u64,
}

impl std::fmt::Debug for JwtHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtHandler")
            .field("algorithm", &self.algorithm)
            .field("expiration", &self.expiration)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

/// Session token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Auth identity uid, equal to the user record id
    pub sub: String,
    pub email: String,
    /// Issued at, epoch seconds
    pub iat: u64,
    /// Expiry, epoch seconds
    pub exp: u64,
    pub iss: String,
    pub aud: String,
    /// Token id, used for sign-out
    pub jti: String,
}
