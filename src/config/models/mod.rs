//! Configuration data models
//!
//! This module defines all configuration structures used by the dashboard backend.

pub mod auth;
pub mod dashboard;
pub mod server;
pub mod storage;

pub use auth::*;
pub use dashboard::*;
pub use server::*;
pub use storage::*;

/// Default bind host
pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default server port
pub fn default_port() -> u16 {
    8080
}

/// Default request timeout in seconds
pub fn default_timeout() -> u64 {
    30
}

/// Default directory holding the built dashboard bundle
pub fn default_static_dir() -> String {
    "web/dist".to_string()
}

/// Default JWT expiration (1 day)
pub fn default_jwt_expiration() -> u64 {
    86400
}

/// Default database pool size
pub fn default_max_connections() -> u32 {
    10
}

/// Default connection timeout in seconds
pub fn default_connection_timeout() -> u64 {
    5
}

/// Default attempts when generating a fresh record id
pub fn default_id_max_attempts() -> u32 {
    16
}

pub fn default_true() -> bool {
    true
}
