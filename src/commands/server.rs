//! `server` command.

use clap::Args;

use deviceadm_api::AppState;
use deviceadm_core::RequestContext;
use deviceadm_core::config::AppConfig;
use deviceadm_core::error::AppError;

/// Arguments of the `server` command
#[derive(Debug, Args)]
pub struct ServerArgs {
    /// Migrate every namespace before accepting requests
    #[arg(long)]
    pub automigrate: bool,
}

/// Start the HTTP server
pub async fn execute(args: &ServerArgs, config: AppConfig) -> Result<(), AppError> {
    let admission = super::build_admission(&config).await?;

    if args.automigrate || config.database.automigrate {
        tracing::info!("Running automatic migrations...");
        admission
            .migrate(&RequestContext::generated(), None)
            .await?;
        tracing::info!("Automatic migrations complete");
    }

    deviceadm_api::run_server(AppState::new(config, admission)).await
}
