//! Configuration management for the dashboard backend
//!
//! This module handles loading, validation, and management of all configuration.

pub mod models;

pub use models::*;

use crate::utils::error::{DashboardError, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Main configuration struct
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Dashboard configuration
    pub dashboard: DashboardConfig,
}

impl Config {
    /// Load configuration from file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DashboardError::Config(format!("Failed to read config file: {}", e)))?;

        let mut dashboard: DashboardConfig = serde_yaml::from_str(&content)
            .map_err(|e| DashboardError::Config(format!("Failed to parse config: {}", e)))?;
        dashboard.auth.ensure_secret();

        let config = Self { dashboard };
        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let config = Self {
            dashboard: DashboardConfig::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// File if present, otherwise defaults; environment overrides win either way
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut dashboard = if tokio::fs::try_exists(path).await.unwrap_or(false) {
            Self::from_file(path).await?.dashboard
        } else {
            warn!(
                "Configuration file {:?} not found, using default configuration",
                path
            );
            DashboardConfig::default()
        };

        let vars: HashMap<String, String> = std::env::vars().collect();
        dashboard.apply_overrides(&vars)?;
        dashboard.auth.ensure_secret();

        let config = Self { dashboard };
        config.validate()?;
        Ok(config)
    }

    /// Get server configuration
    pub fn server(&self) -> &ServerConfig {
        &self.dashboard.server
    }

    /// Get auth configuration
    pub fn auth(&self) -> &AuthConfig {
        &self.dashboard.auth
    }

    /// Get storage configuration
    pub fn storage(&self) -> &StorageConfig {
        &self.dashboard.storage
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        self.dashboard
            .server
            .validate()
            .map_err(|e| DashboardError::Config(format!("Server config error: {}", e)))?;

        self.dashboard
            .server
            .cors
            .validate()
            .map_err(|e| DashboardError::Config(format!("CORS config error: {}", e)))?;

        self.dashboard
            .auth
            .validate()
            .map_err(|e| DashboardError::Config(format!("Auth config error: {}", e)))?;

        self.dashboard
            .storage
            .validate()
            .map_err(|e| DashboardError::Config(format!("Storage config error: {}", e)))?;

        debug!("Configuration validation completed");
        Ok(())
    }

    /// Merge with another configuration (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        self.dashboard = self.dashboard.merge(other.dashboard);
        self
    }

    /// Convert to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.dashboard).map_err(|e| {
            DashboardError::Config(format!("Failed to serialize config to YAML: {}", e))
        })
    }
}
