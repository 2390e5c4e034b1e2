//! HTTP server core implementation
//!
//! This module provides the HttpServer struct and its core methods.

use crate::config::{Config, ServerConfig};
use crate::server::middleware::DashboardGuard;
use crate::server::routes;
use crate::server::state::AppState;
use crate::storage::{DocumentStore, create_store};
use crate::utils::error::{DashboardError, Result};
use actix_cors::Cors;
use actix_web::{App, HttpServer as ActixHttpServer, middleware::DefaultHeaders, web};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;

/// How often expired sign-out and lockout entries are purged
const AUTH_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// HTTP server
pub struct HttpServer {
    /// Server configuration
    config: ServerConfig,
    /// Application state
    state: AppState,
}

impl HttpServer {
    /// Open the configured store and prepare the application state
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Creating HTTP server");

        let store = create_store(config.storage()).await?;
        Self::with_store(config, store).await
    }

    /// Build the server over an already opened store.
    ///
    /// Provisions the bootstrap administrator when no users exist and warms
    /// the directory cache. A failed warm-up is logged; listings retry it.
    pub async fn with_store(config: &Config, store: Arc<dyn DocumentStore>) -> Result<Self> {
        info!("Using {} document store", store.backend_name());
        let state = AppState::new(config.clone(), store);

        if let Some(admin) = &config.auth().bootstrap_admin {
            if state.users.ensure_bootstrap_admin(admin).await? {
                info!("Provisioned bootstrap administrator {}", admin.email);
            }
        }

        if let Err(e) = state.loader.refresh_all().await {
            warn!("Initial directory load failed: {}", e);
        }

        Ok(Self {
            config: config.server().clone(),
            state,
        })
    }

    fn cors(config: &ServerConfig) -> Cors {
        let cors_config = &config.cors;
        if !cors_config.enabled {
            return Cors::default();
        }

        let mut cors = Cors::default()
            .allow_any_method()
            .allow_any_header()
            .max_age(cors_config.max_age as usize);

        if cors_config.allows_all_origins() {
            cors = cors.allow_any_origin();
        } else {
            for origin in &cors_config.allowed_origins {
                cors = cors.allowed_origin(origin);
            }
        }

        if cors_config.allow_credentials {
            cors = cors.supports_credentials();
        }
        cors
    }

    /// Create the Actix-web application
    pub fn create_app(
        state: web::Data<AppState>,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let server_config = state.config.server().clone();

        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            DashboardError::bad_request(format!("Invalid JSON body: {}", err)).into()
        });
        let query_config = web::QueryConfig::default().error_handler(|err, _req| {
            DashboardError::bad_request(format!("Invalid query string: {}", err)).into()
        });

        App::new()
            .app_data(state)
            .app_data(json_config)
            .app_data(query_config)
            .wrap(DashboardGuard)
            .wrap(Self::cors(&server_config))
            .wrap(TracingLogger::default())
            .wrap(DefaultHeaders::new().add(("Server", "roplant-admin")))
            .configure(routes::configure_routes)
            .service(routes::dashboard::static_files(&server_config.static_dir))
    }

    /// Start the HTTP server
    pub async fn start(self) -> Result<()> {
        let bind_addr = self.config.address();

        info!("Starting HTTP server on {}", bind_addr);

        let state = web::Data::new(self.state);
        let cleanup_state = state.clone();
        let cleanup = tokio::spawn(async move {
            let mut interval = tokio::time::interval(AUTH_CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                cleanup_state.auth.cleanup();
            }
        });

        let mut server = ActixHttpServer::new(move || Self::create_app(state.clone()))
            .client_request_timeout(Duration::from_secs(self.config.timeout));
        if let Some(workers) = self.config.workers {
            server = server.workers(workers);
        }

        let server = server
            .bind(&bind_addr)
            .map_err(|e| DashboardError::config(format!("Failed to bind {}: {}", bind_addr, e)))?
            .run();

        info!("HTTP server listening on {}", bind_addr);

        let result = server
            .await
            .map_err(|e| DashboardError::internal(format!("Server error: {}", e)));
        cleanup.abort();

        info!("HTTP server stopped");
        result
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}
