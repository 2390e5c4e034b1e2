//! Authentication configuration

use super::*;
use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use serde::{Deserialize, Serialize};
use tracing::warn;

const PLACEHOLDER_SECRETS: &[&str] = &["your-secret-key", "change-me", "changeme"];

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// JWT signing secret
    #[serde(default)]
    pub jwt_secret: String,
    /// JWT expiration in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration: u64,
    /// Mark the session cookie `Secure`
    #[serde(default)]
    pub secure_cookies: bool,
    /// Sign-in brute force protection
    #[serde(default)]
    pub sign_in: SignInLimits,
    /// Super-admin provisioned when no users exist yet
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: generate_secure_jwt_secret(),
            jwt_expiration: default_jwt_expiration(),
            secure_cookies: false,
            sign_in: SignInLimits::default(),
            bootstrap_admin: None,
        }
    }
}

impl AuthConfig {
    /// Merge auth configurations
    pub fn merge(mut self, other: Self) -> Self {
        if !other.jwt_secret.is_empty() && !PLACEHOLDER_SECRETS.contains(&other.jwt_secret.as_str())
        {
            self.jwt_secret = other.jwt_secret;
        }
        if other.jwt_expiration != default_jwt_expiration() {
            self.jwt_expiration = other.jwt_expiration;
        }
        if other.secure_cookies {
            self.secure_cookies = true;
        }
        self.sign_in = self.sign_in.merge(other.sign_in);
        if other.bootstrap_admin.is_some() {
            self.bootstrap_admin = other.bootstrap_admin;
        }
        self
    }

    /// Fill in a random secret when none was configured
    pub fn ensure_secret(&mut self) {
        if self.jwt_secret.is_empty() {
            warn!("No JWT secret configured; sessions will not survive restarts");
            self.jwt_secret = generate_secure_jwt_secret();
        }
    }

    /// Validate authentication configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.jwt_secret.len() < 32 {
            return Err("JWT secret must be at least 32 characters long for security".to_string());
        }

        if PLACEHOLDER_SECRETS.contains(&self.jwt_secret.as_str()) {
            return Err(
                "JWT secret must not use default values. Please generate a secure random secret."
                    .to_string(),
            );
        }

        if self.jwt_expiration < 300 {
            return Err("JWT expiration should be at least 5 minutes (300 seconds)".to_string());
        }

        if self.jwt_expiration > 86400 * 30 {
            return Err("JWT expiration should not exceed 30 days for security reasons".to_string());
        }

        self.sign_in.validate()?;

        if let Some(admin) = &self.bootstrap_admin {
            admin.validate()?;
        }

        Ok(())
    }
}

/// Sign-in lockout settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInLimits {
    /// Failed attempts before lockout
    #[serde(default = "default_sign_in_attempts")]
    pub max_attempts: u32,
    /// Window for counting failures, in seconds
    #[serde(default = "default_sign_in_window")]
    pub window_secs: u64,
    /// First lockout duration, doubled on every repeat
    #[serde(default = "default_sign_in_lockout")]
    pub lockout_secs: u64,
}

impl Default for SignInLimits {
    fn default() -> Self {
        Self {
            max_attempts: default_sign_in_attempts(),
            window_secs: default_sign_in_window(),
            lockout_secs: default_sign_in_lockout(),
        }
    }
}

impl SignInLimits {
    pub fn merge(self, other: Self) -> Self {
        if other != Self::default() { other } else { self }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("sign_in.max_attempts must be greater than 0".to_string());
        }
        if self.window_secs == 0 {
            return Err("sign_in.window_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Initial super-admin account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    #[serde(default = "default_admin_name")]
    pub name: String,
}

impl BootstrapAdmin {
    pub fn validate(&self) -> Result<(), String> {
        if !crate::utils::validation::is_valid_email(&self.email) {
            return Err("bootstrap_admin.email is not a valid email address".to_string());
        }
        if self.password.len() < crate::utils::validation::MIN_PASSWORD_LEN {
            return Err("bootstrap_admin.password is too short".to_string());
        }
        Ok(())
    }
}

fn default_sign_in_attempts() -> u32 {
    5
}

fn default_sign_in_window() -> u64 {
    300
}

fn default_sign_in_lockout() -> u64 {
    60
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

/// Generate a secure random JWT secret
fn generate_secure_jwt_secret() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}
