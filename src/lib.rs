//! # roplant-admin
//!
//! Administrative backend for RO water-treatment plant dashboards.
//!
//! Administrators manage users, clients, regions and plants. What each user
//! may see or change is decided by a small permission model:
//!
//! - a **role** resolved from the user record (`super_admin`, `client_admin`,
//!   `region_admin` or `default`),
//! - per-resource **access maps** granting read and write on individual
//!   regions and clients,
//! - boolean **capability flags** gating create and delete per module.
//!
//! ## Running
//!
//! ```rust,no_run
//! use roplant_admin::{Config, Dashboard};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config/dashboard.yaml").await?;
//!     Dashboard::new(config).await?.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Checking access
//!
//! ```rust
//! use roplant_admin::auth::rbac::{Principal, evaluate_access};
//! use roplant_admin::core::models::{ResourceAccess, ResourceKind, User};
//!
//! let mut user = User::default();
//! user.region_access.insert("R1".to_string(), ResourceAccess::new(true, false));
//! let principal = Principal::from(user);
//!
//! let evaluation = evaluate_access(&principal, "R1", ResourceKind::Region);
//! assert!(evaluation.can_read());
//! assert!(!evaluation.can_write());
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod auth;
pub mod config;
pub mod core;
pub mod server;
pub mod services;
pub mod storage;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use utils::error::{DashboardError, Result};

use tracing::info;

/// The dashboard backend: configuration plus a ready HTTP server
pub struct Dashboard {
    config: Config,
    server: server::HttpServer,
}

impl Dashboard {
    /// Open the store and prepare the server
    pub async fn new(config: Config) -> Result<Self> {
        info!("Creating dashboard instance");
        let server = server::HttpServer::new(&config).await?;
        Ok(Self { config, server })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Serve until shutdown
    pub async fn run(self) -> Result<()> {
        info!(
            "Serving dashboard on {} with {:?} storage",
            self.config.server().address(),
            self.config.storage().backend
        );
        self.server.start().await
    }
}

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Build information
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Version number
    pub version: &'static str,
    /// Build time, epoch seconds
    pub build_time: &'static str,
    /// Git commit hash
    pub git_hash: &'static str,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: VERSION,
            build_time: env!("BUILD_TIME"),
            git_hash: env!("GIT_HASH"),
        }
    }
}

/// Build information of this binary
pub fn build_info() -> BuildInfo {
    BuildInfo::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_info() {
        let info = build_info();
        assert!(!info.version.is_empty());
        assert_eq!(info.version, VERSION);
        assert!(!info.git_hash.is_empty());
    }

    #[test]
    fn test_constants() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
        assert_eq!(NAME, env!("CARGO_PKG_NAME"));
        assert_eq!(DESCRIPTION, env!("CARGO_PKG_DESCRIPTION"));
    }
}
