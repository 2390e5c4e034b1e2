//! Loading configuration and starting the server

use crate::config::Config;
use crate::server::server::HttpServer;
use crate::utils::error::Result;
use std::path::Path;
use tracing::info;

/// Load configuration from `config_path` (defaults plus environment
/// overrides when the file is absent) and serve until shutdown
pub async fn run_server<P: AsRef<Path>>(config_path: P) -> Result<()> {
    info!("Starting RO plant admin dashboard v{}", crate::VERSION);

    let config = Config::load(config_path).await?;
    let server = HttpServer::new(&config).await?;

    info!(
        "Dashboard available at http://{}/dashboard",
        config.server().address()
    );
    info!("API available at http://{}/api/v1", config.server().address());

    server.start().await
}
