//! Top-level dashboard configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// All configuration sections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// HTTP server
    #[serde(default)]
    pub server: ServerConfig,
    /// Sessions and credentials
    #[serde(default)]
    pub auth: AuthConfig,
    /// Document store
    #[serde(default)]
    pub storage: StorageConfig,
}

impl DashboardConfig {
    /// Build configuration from defaults plus environment overrides
    pub fn from_env() -> crate::utils::error::Result<Self> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        let mut config = Self::default();
        config.apply_overrides(&vars)?;
        Ok(config)
    }

    /// Apply `DASHBOARD_*`-style overrides from a variable map
    pub fn apply_overrides(
        &mut self,
        vars: &HashMap<String, String>,
    ) -> crate::utils::error::Result<()> {
        use crate::utils::error::DashboardError;

        if let Some(host) = vars.get("DASHBOARD_HOST") {
            self.server.host = host.clone();
        }
        if let Some(port) = vars.get("DASHBOARD_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| DashboardError::config(format!("Invalid DASHBOARD_PORT: {}", port)))?;
        }
        if let Some(dir) = vars.get("STATIC_DIR") {
            self.server.static_dir = dir.clone();
        }
        if let Some(secret) = vars.get("JWT_SECRET") {
            self.auth.jwt_secret = secret.clone();
        }
        if let Some(url) = vars.get("DATABASE_URL") {
            self.storage.database.url = url.clone();
        }
        if let Some(backend) = vars.get("STORAGE_BACKEND") {
            self.storage.backend = backend.parse().map_err(DashboardError::Config)?;
        }
        Ok(())
    }

    /// Merge two configurations, with other taking precedence
    pub fn merge(mut self, other: Self) -> Self {
        self.server = self.server.merge(other.server);
        self.auth = self.auth.merge(other.auth);
        self.storage = self.storage.merge(other.storage);
        self
    }
}
