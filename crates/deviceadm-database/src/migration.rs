//! Versioned, per-namespace schema migrations.
//!
//! Steps are applied in order, each inside its own transaction, and
//! recorded in the namespace's `migration_info` table together with the
//! record counts before and after the step. Re-running a migration skips
//! recorded steps, so an interrupted run resumes where it stopped.
//!
//! | Version | Effect |
//! |---------|--------|
//! | `1.0.0` | creates the `devices` table |
//! | `1.1.0` | backfills `device_id` from `id`, unique index `uniqueDeviceIdIndex` on `id` |
//! | `1.2.0` | unique index `uniqueIdentityKeyIndex` on `(device_identity, key)` |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;

use deviceadm_core::error::{AppError, ErrorKind};
use deviceadm_core::result::AppResult;

use crate::namespace::Namespace;

/// Known migration versions, oldest first.
pub static MIGRATION_VERSIONS: [&str; 3] = ["1.0.0", "1.1.0", "1.2.0"];

/// The version a fully migrated namespace is at.
pub const LATEST_VERSION: &str = "1.2.0";

/// Outcome of one applied migration step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Version of the applied step.
    pub version: String,
    /// Number of records before the step.
    pub records_before: u64,
    /// Number of records after the step.
    pub records_after: u64,
    /// When the step was applied.
    pub applied_at: DateTime<Utc>,
}

/// Resolve `target` to the steps it includes.
pub fn steps_up_to(target: &str) -> AppResult<&'static [&'static str]> {
    MIGRATION_VERSIONS
        .iter()
        .position(|v| *v == target)
        .map(|idx| &MIGRATION_VERSIONS[..=idx])
        .ok_or_else(|| AppError::validation(format!("unknown migration version: '{target}'")))
}

fn db_err(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, message, e)
}

fn statements(version: &str, ns: &Namespace) -> Vec<String> {
    let devices = ns.table("devices");
    match version {
        "1.0.0" => vec![format!(
            "CREATE TABLE IF NOT EXISTS {devices} (
                id TEXT NOT NULL,
                device_id TEXT,
                device_identity TEXT NOT NULL,
                key TEXT NOT NULL,
                status TEXT NOT NULL,
                attributes JSONB NOT NULL DEFAULT '{{}}'::jsonb,
                request_time TIMESTAMPTZ
            )"
        )],
        "1.1.0" => vec![
            format!("UPDATE {devices} SET device_id = id WHERE device_id IS NULL"),
            format!("CREATE UNIQUE INDEX IF NOT EXISTS \"uniqueDeviceIdIndex\" ON {devices} (id)"),
        ],
        "1.2.0" => vec![format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS \"uniqueIdentityKeyIndex\" \
             ON {devices} (md5(device_identity), md5(key))"
        )],
        _ => Vec::new(),
    }
}

async fn count_records(tx: &mut Transaction<'_, Postgres>, ns: &Namespace) -> AppResult<u64> {
    let exists: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
        .bind(ns.table("devices"))
        .fetch_one(&mut **tx)
        .await
        .map_err(db_err("Failed to inspect devices table"))?;
    if !exists {
        return Ok(0);
    }

    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", ns.table("devices")))
        .fetch_one(&mut **tx)
        .await
        .map_err(db_err("Failed to count auth sets"))?;
    Ok(u64::try_from(count).unwrap_or_default())
}

/// Apply every step up to `target` that `ns` has not recorded yet.
pub async fn run_migrations(
    pool: &PgPool,
    ns: &Namespace,
    target: &str,
) -> AppResult<Vec<MigrationReport>> {
    let steps = steps_up_to(target)?;
    info!(namespace = %ns, target_version = target, "Running migrations");

    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", ns.quoted()))
        .execute(pool)
        .await
        .map_err(db_err("Failed to create namespace"))?;
    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {} (
            version TEXT PRIMARY KEY,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            records_before BIGINT NOT NULL,
            records_after BIGINT NOT NULL
        )",
        ns.table("migration_info")
    ))
    .execute(pool)
    .await
    .map_err(db_err("Failed to create migration_info table"))?;

    let mut reports = Vec::new();
    for version in steps {
        let mut tx = pool.begin().await.map_err(db_err("Failed to begin migration"))?;

        // serialize concurrent migrations of the same namespace
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(ns.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_err("Failed to lock namespace"))?;

        let applied: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE version = $1)",
            ns.table("migration_info")
        ))
        .bind(*version)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err("Failed to read migration_info"))?;
        if applied {
            continue;
        }

        let records_before = count_records(&mut tx, ns).await?;
        for statement in statements(version, ns) {
            sqlx::query(&statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Database,
                        format!("Migration {version} failed: {e}"),
                        e,
                    )
                })?;
        }
        let records_after = count_records(&mut tx, ns).await?;

        let applied_at: DateTime<Utc> = sqlx::query_scalar(&format!(
            "INSERT INTO {} (version, records_before, records_after) VALUES ($1, $2, $3) \
             RETURNING applied_at",
            ns.table("migration_info")
        ))
        .bind(*version)
        .bind(i64::try_from(records_before).unwrap_or(i64::MAX))
        .bind(i64::try_from(records_after).unwrap_or(i64::MAX))
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err("Failed to record migration"))?;

        tx.commit().await.map_err(db_err("Failed to commit migration"))?;

        info!(
            namespace = %ns,
            version,
            records_before,
            records_after,
            "Migration applied"
        );
        reports.push(MigrationReport {
            version: version.to_string(),
            records_before,
            records_after,
            applied_at,
        });
    }

    Ok(reports)
}
