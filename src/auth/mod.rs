//! Authentication and authorization
//!
//! Authentication covers email/password identities, JWT sessions and
//! sign-in lockout. Authorization lives in [`rbac`].

pub mod credentials;
pub mod jwt;
pub mod password;
pub mod rate_limiter;
pub mod rbac;
mod system;
mod types;

pub use credentials::{AccountProvisioner, Credential, CredentialStore};
pub use jwt::{Claims, JwtHandler};
pub use rate_limiter::AuthRateLimiter;
pub use system::AuthSystem;
pub use types::{SessionInfo, SignInResult};
