//! The application wired over an in-memory store

use roplant_admin::auth::rbac::Principal;
use roplant_admin::config::{BootstrapAdmin, Config, StorageConfig};
use roplant_admin::core::models::UserProfile;
use roplant_admin::server::{AppState, HttpServer};
use roplant_admin::services::NewUser;
use roplant_admin::storage::DocumentStore;
use actix_web::web;
use std::sync::Arc;
use tempfile::TempDir;

pub const ADMIN_EMAIL: &str = "root@plant.io";
pub const ADMIN_PASSWORD: &str = "changeit1";
pub const INDEX_HTML: &str = "<!doctype html><title>RO Plant Admin</title>";

/// A bootstrapped application and its static bundle directory
pub struct TestApp {
    pub state: web::Data<AppState>,
    pub admin_uid: String,
    _static_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_store(super::memory_store()).await
    }

    /// Bootstrap over `store` with a super-admin and an empty bundle
    pub async fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        let static_dir = tempfile::tempdir().unwrap();
        std::fs::write(static_dir.path().join("index.html"), INDEX_HTML).unwrap();

        let mut config = Config::default();
        config.dashboard.storage = StorageConfig::memory();
        config.dashboard.server.static_dir = static_dir.path().to_string_lossy().into_owned();
        config.dashboard.auth.bootstrap_admin = Some(BootstrapAdmin {
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
            name: "Root".to_string(),
        });

        let server = HttpServer::with_store(&config, store).await.unwrap();
        let state = web::Data::new(server.state().clone());
        let admin_uid = state
            .auth
            .credentials()
            .find_by_email(ADMIN_EMAIL)
            .await
            .unwrap()
            .unwrap()
            .uid;

        Self {
            state,
            admin_uid,
            _static_dir: static_dir,
        }
    }

    pub async fn principal(&self, uid: &str) -> Principal {
        self.state.users.principal(uid).await
    }

    pub async fn admin(&self) -> Principal {
        self.principal(&self.admin_uid).await
    }

    /// Session token for an existing account
    pub async fn token(&self, email: &str, password: &str) -> String {
        self.state
            .auth
            .sign_in(email, password, "test-client")
            .await
            .unwrap()
            .token
    }

    pub async fn admin_token(&self) -> String {
        self.token(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Create a regular user through the admin and return its uid
    pub async fn create_user(&self, email: &str, password: &str) -> String {
        let admin = self.admin().await;
        self.state
            .users
            .create(
                &admin,
                NewUser {
                    email: email.to_string(),
                    password: password.to_string(),
                    profile: UserProfile {
                        name: "Operator".to_string(),
                        ..Default::default()
                    },
                    super_admin: false,
                },
            )
            .await
            .unwrap()
            .id
    }
}
