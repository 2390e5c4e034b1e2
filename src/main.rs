//! roplant-admin - RO plant admin dashboard backend

#![allow(missing_docs)]

use clap::Parser;
use roplant_admin::server;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Command line options
#[derive(Debug, Parser)]
#[command(name = "roplant-admin", version, about)]
struct Cli {
    /// Configuration file; defaults and environment overrides apply when absent
    #[arg(short, long, env = "DASHBOARD_CONFIG", default_value = "config/dashboard.yaml")]
    config: PathBuf,

    /// Log filter, e.g. `info` or `roplant_admin=debug,sea_orm=warn`
    #[arg(long, env = "DASHBOARD_LOG", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "DASHBOARD_LOG_JSON")]
    log_json: bool,
}

fn init_tracing(cli: &Cli) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&cli.log_level)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false);

    if cli.log_json {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;
    } else {
        builder.try_init().map_err(|e| anyhow::anyhow!(e))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = init_tracing(&cli) {
        eprintln!("Error: invalid logging setup: {}", e);
        return ExitCode::FAILURE;
    }

    match server::run_server(&cli.config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
