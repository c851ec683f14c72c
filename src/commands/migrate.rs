//! `migrate` command.

use clap::Args;

use deviceadm_core::RequestContext;
use deviceadm_core::config::AppConfig;
use deviceadm_core::error::AppError;

/// Arguments of the `migrate` command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migrate only this tenant; defaults to the default namespace and
    /// every known tenant
    #[arg(long)]
    pub tenant: Option<String>,
}

/// Run pending migrations and print what was applied
pub async fn execute(args: &MigrateArgs, config: AppConfig) -> Result<(), AppError> {
    let admission = super::build_admission(&config).await?;

    let results = admission
        .migrate(&RequestContext::generated(), args.tenant.as_deref())
        .await?;

    for (tenant, reports) in results {
        let tenant = tenant.as_deref().unwrap_or("(default)");
        if reports.is_empty() {
            println!("{tenant}: up to date");
        }
        for report in reports {
            println!(
                "{tenant}: applied {} ({} -> {} records)",
                report.version, report.records_before, report.records_after
            );
        }
    }

    Ok(())
}
