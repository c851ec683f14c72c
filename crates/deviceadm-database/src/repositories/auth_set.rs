//! PostgreSQL auth-set store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::debug;

use deviceadm_core::error::{AppError, ErrorKind};
use deviceadm_core::result::AppResult;
use deviceadm_core::types::{AuthId, DeviceId};
use deviceadm_core::RequestContext;
use deviceadm_entity::{
    AuthSet, AuthSetFilter, AuthSetStatus, AuthSetUpdate, DeviceAuthAttributes,
};

use crate::connection;
use crate::migration::{self, MigrationReport};
use crate::namespace::{DEFAULT_NAMESPACE, Namespace};
use crate::store::AuthSetStore;

/// Columns of an auth-set row; legacy rows without a device ID read back
/// their own ID.
const COLUMNS: &str = "id, COALESCE(device_id, id) AS device_id, device_identity, key, \
                       status, attributes, request_time";

/// A `devices` table row.
#[derive(Debug, sqlx::FromRow)]
struct AuthSetRow {
    id: AuthId,
    device_id: DeviceId,
    device_identity: String,
    key: String,
    status: String,
    attributes: Json<BTreeMap<String, String>>,
    request_time: Option<DateTime<Utc>>,
}

impl TryFrom<AuthSetRow> for AuthSet {
    type Error = AppError;

    fn try_from(row: AuthSetRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<AuthSetStatus>().map_err(|_| {
            AppError::database(format!(
                "auth set {} has an invalid stored status '{}'",
                row.id, row.status
            ))
        })?;
        Ok(AuthSet {
            id: row.id,
            device_id: row.device_id,
            device_identity: row.device_identity,
            key: row.key,
            status,
            attributes: DeviceAuthAttributes(row.attributes.0),
            request_time: row.request_time,
        })
    }
}

fn db_err(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, message, e)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|e| e.is_unique_violation())
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Auth-set store keeping each tenant in its own PostgreSQL schema.
#[derive(Debug, Clone)]
pub struct PgAuthSetStore {
    pool: PgPool,
}

impl PgAuthSetStore {
    /// Create a new store on an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Return a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AuthSetStore for PgAuthSetStore {
    async fn list(
        &self,
        ctx: &RequestContext,
        skip: u64,
        limit: u64,
        filter: &AuthSetFilter,
    ) -> AppResult<Vec<AuthSet>> {
        let ns = Namespace::for_context(ctx)?;
        let rows = sqlx::query_as::<_, AuthSetRow>(&format!(
            "SELECT {COLUMNS} FROM {} \
             WHERE ($1::text IS NULL OR status = $1) \
             AND ($2::text IS NULL OR COALESCE(device_id, id) = $2) \
             ORDER BY id LIMIT $3 OFFSET $4",
            ns.table("devices")
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.device_id.as_ref())
        .bind(to_i64(limit))
        .bind(to_i64(skip))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list auth sets"))?;

        rows.into_iter().map(AuthSet::try_from).collect()
    }

    async fn get(&self, ctx: &RequestContext, id: &AuthId) -> AppResult<AuthSet> {
        let ns = Namespace::for_context(ctx)?;
        let row = sqlx::query_as::<_, AuthSetRow>(&format!(
            "SELECT {COLUMNS} FROM {} WHERE id = $1",
            ns.table("devices")
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find auth set"))?;

        row.ok_or_else(|| AppError::not_found("auth set not found"))?
            .try_into()
    }

    async fn put(&self, ctx: &RequestContext, update: &AuthSetUpdate) -> AppResult<()> {
        let ns = Namespace::for_context(ctx)?;
        let status = update.status.map(|s| s.as_str());
        let attributes = update.attributes.as_ref().map(|a| Json(&a.0));

        if update.is_complete() {
            sqlx::query(&format!(
                "INSERT INTO {} AS d \
                 (id, device_id, device_identity, key, status, attributes, request_time) \
                 VALUES ($1, $2, $3, $4, $5, COALESCE($6, '{{}}'::jsonb), $7) \
                 ON CONFLICT (id) DO UPDATE SET \
                 device_id = EXCLUDED.device_id, \
                 device_identity = EXCLUDED.device_identity, \
                 key = EXCLUDED.key, \
                 status = EXCLUDED.status, \
                 attributes = COALESCE($6, d.attributes), \
                 request_time = COALESCE($7, d.request_time)",
                ns.table("devices")
            ))
            .bind(&update.id)
            .bind(update.device_id.as_ref())
            .bind(update.device_identity.as_deref())
            .bind(update.key.as_deref())
            .bind(status)
            .bind(attributes)
            .bind(update.request_time)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::with_source(ErrorKind::Conflict, "auth set conflict", e)
                } else {
                    AppError::with_source(ErrorKind::Database, "Failed to upsert auth set", e)
                }
            })?;
            debug!(auth_id = %update.id, "Auth set upserted");
            return Ok(());
        }

        let result = sqlx::query(&format!(
            "UPDATE {} SET \
             device_id = COALESCE($2, device_id), \
             device_identity = COALESCE($3, device_identity), \
             key = COALESCE($4, key), \
             status = COALESCE($5, status), \
             attributes = COALESCE($6, attributes), \
             request_time = COALESCE($7, request_time) \
             WHERE id = $1",
            ns.table("devices")
        ))
        .bind(&update.id)
        .bind(update.device_id.as_ref())
        .bind(update.device_identity.as_deref())
        .bind(update.key.as_deref())
        .bind(status)
        .bind(attributes)
        .bind(update.request_time)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::with_source(ErrorKind::Conflict, "auth set conflict", e)
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to update auth set", e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("auth set not found"));
        }
        debug!(auth_id = %update.id, "Auth set merged");
        Ok(())
    }

    async fn insert(&self, ctx: &RequestContext, auth: &AuthSet) -> AppResult<()> {
        let ns = Namespace::for_context(ctx)?;
        sqlx::query(&format!(
            "INSERT INTO {} \
             (id, device_id, device_identity, key, status, attributes, request_time) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
            ns.table("devices")
        ))
        .bind(&auth.id)
        .bind(&auth.device_id)
        .bind(&auth.device_identity)
        .bind(&auth.key)
        .bind(auth.status.as_str())
        .bind(Json(&auth.attributes.0))
        .bind(auth.request_time)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::with_source(ErrorKind::Conflict, "auth set conflict", e)
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to insert auth set", e)
            }
        })?;
        Ok(())
    }

    async fn update_strict(&self, ctx: &RequestContext, auth: &AuthSet) -> AppResult<()> {
        let ns = Namespace::for_context(ctx)?;
        let result = sqlx::query(&format!(
            "UPDATE {} SET device_id = $2, device_identity = $3, key = $4, status = $5, \
             attributes = $6, request_time = $7 WHERE id = $1",
            ns.table("devices")
        ))
        .bind(&auth.id)
        .bind(&auth.device_id)
        .bind(&auth.device_identity)
        .bind(&auth.key)
        .bind(auth.status.as_str())
        .bind(Json(&auth.attributes.0))
        .bind(auth.request_time)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to update auth set"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("auth set not found"));
        }
        Ok(())
    }

    async fn delete(&self, ctx: &RequestContext, id: &AuthId) -> AppResult<()> {
        let ns = Namespace::for_context(ctx)?;
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", ns.table("devices")))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to delete auth set"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("auth set not found"));
        }
        Ok(())
    }

    async fn delete_by_device(
        &self,
        ctx: &RequestContext,
        device_id: &DeviceId,
    ) -> AppResult<u64> {
        let ns = Namespace::for_context(ctx)?;
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE COALESCE(device_id, id) = $1",
            ns.table("devices")
        ))
        .bind(device_id)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to delete device auth sets"))?;

        match result.rows_affected() {
            0 => Err(AppError::not_found("auth set not found")),
            n => Ok(n),
        }
    }

    async fn migrate(
        &self,
        ctx: &RequestContext,
        target: &str,
    ) -> AppResult<Vec<MigrationReport>> {
        let ns = Namespace::for_context(ctx)?;
        migration::run_migrations(&self.pool, &ns, target).await
    }

    async fn tenants(&self) -> AppResult<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT schema_name::text FROM information_schema.schemata \
             WHERE schema_name LIKE $1 ORDER BY schema_name",
        )
        .bind(format!("{DEFAULT_NAMESPACE}-%"))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list tenant namespaces"))?;

        Ok(names
            .iter()
            .filter_map(|name| Namespace::tenant_of(name))
            .map(str::to_string)
            .collect())
    }

    async fn ping(&self) -> AppResult<()> {
        connection::ping(&self.pool).await
    }
}
