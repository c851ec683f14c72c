//! Opening the configured auth-set store.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::info;

use deviceadm_core::config::DatabaseConfig;
use deviceadm_core::error::{AppError, ErrorKind};
use deviceadm_core::result::AppResult;

use crate::memory::MemoryAuthSetStore;
use crate::repositories::PgAuthSetStore;
use crate::store::AuthSetStore;

/// Reported to PostgreSQL in `pg_stat_activity`.
const APPLICATION_NAME: &str = "deviceadm";

/// Open the store selected by `config.url`: the in-process store for
/// `memory://`, PostgreSQL otherwise.
pub async fn connect(config: &DatabaseConfig) -> AppResult<Arc<dyn AuthSetStore>> {
    if config.is_memory() {
        info!("Using in-memory auth-set store");
        return Ok(Arc::new(MemoryAuthSetStore::new()));
    }

    let pool = pg_pool(config).await?;
    Ok(Arc::new(PgAuthSetStore::new(pool)))
}

/// Connection options parsed from `config.url`.
fn connect_options(config: &DatabaseConfig) -> AppResult<PgConnectOptions> {
    let options = PgConnectOptions::from_str(&config.url).map_err(|e| {
        AppError::with_source(ErrorKind::Configuration, "invalid database url", e)
    })?;
    Ok(options.application_name(APPLICATION_NAME))
}

async fn pg_pool(config: &DatabaseConfig) -> AppResult<PgPool> {
    let options = connect_options(config)?;
    info!(
        host = options.get_host(),
        port = options.get_port(),
        database = options.get_database().unwrap_or_default(),
        max_connections = config.max_connections,
        "Connecting to PostgreSQL"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
        .connect_with(options)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "failed to connect to database", e))?;

    ping(&pool).await?;
    Ok(pool)
}

/// Round-trip a trivial query.
pub(crate) async fn ping(pool: &PgPool) -> AppResult<()> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map(|_| ())
        .map_err(|e| AppError::with_source(ErrorKind::Database, "database unreachable", e))
}
