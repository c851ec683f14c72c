//! CLI command definitions and dispatch.

pub mod migrate;
pub mod server;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use deviceadm_client::HttpDevAuthClient;
use deviceadm_core::config::AppConfig;
use deviceadm_core::error::AppError;
use deviceadm_service::AdmissionService;

/// Device admission service
#[derive(Debug, Parser)]
#[command(name = "deviceadm", version, about, long_about = None)]
pub struct Cli {
    /// Base configuration file (extension optional)
    #[arg(short, long, default_value = "config/default")]
    pub config: String,

    /// Environment overlay, read from `config/<env>.toml` when present
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Server(server::ServerArgs),
    /// Bring auth-set storage up to the latest schema version
    Migrate(migrate::MigrateArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Server(args) => server::execute(args, config).await,
            Commands::Migrate(args) => migrate::execute(args, config).await,
        }
    }
}

/// Helper: wire the admission engine from configuration
pub(crate) async fn build_admission(config: &AppConfig) -> Result<AdmissionService, AppError> {
    tracing::info!("Connecting to auth-set store...");
    let store = deviceadm_database::connect(&config.database).await?;
    let devauth = HttpDevAuthClient::new(&config.devauth)?;
    tracing::info!(url = %config.devauth.url, "Device authentication client ready");
    Ok(AdmissionService::new(store, Arc::new(devauth)))
}
