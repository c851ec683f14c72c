//! In-memory auth-set store.
//!
//! Each namespace holds an ordered map of records, so listing is ordered
//! by ID like the PostgreSQL store. Namespaces are created on first write.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;

use deviceadm_core::error::AppError;
use deviceadm_core::result::AppResult;
use deviceadm_core::types::{AuthId, DeviceId};
use deviceadm_core::RequestContext;
use deviceadm_entity::{AuthSet, AuthSetFilter, AuthSetUpdate};

use crate::migration::{self, MigrationReport};
use crate::namespace::Namespace;
use crate::store::AuthSetStore;

#[derive(Debug, Default)]
struct NamespaceData {
    records: BTreeMap<AuthId, AuthSet>,
    applied: Vec<MigrationReport>,
}

impl NamespaceData {
    /// Whether another record already holds the identity and key of `auth`.
    fn identity_taken(&self, auth: &AuthSet) -> bool {
        self.records.values().any(|other| {
            other.id != auth.id
                && other.device_identity == auth.device_identity
                && other.key == auth.key
        })
    }
}

/// Auth-set store held in process memory.
#[derive(Debug, Default)]
pub struct MemoryAuthSetStore {
    namespaces: DashMap<Namespace, NamespaceData>,
}

impl MemoryAuthSetStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthSetStore for MemoryAuthSetStore {
    async fn list(
        &self,
        ctx: &RequestContext,
        skip: u64,
        limit: u64,
        filter: &AuthSetFilter,
    ) -> AppResult<Vec<AuthSet>> {
        let ns = Namespace::for_context(ctx)?;
        let Some(data) = self.namespaces.get(&ns) else {
            return Ok(Vec::new());
        };

        Ok(data
            .records
            .values()
            .filter(|auth| filter.matches(auth))
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn get(&self, ctx: &RequestContext, id: &AuthId) -> AppResult<AuthSet> {
        let ns = Namespace::for_context(ctx)?;
        self.namespaces
            .get(&ns)
            .and_then(|data| data.records.get(id).cloned())
            .ok_or_else(|| AppError::not_found("auth set not found"))
    }

    async fn put(&self, ctx: &RequestContext, update: &AuthSetUpdate) -> AppResult<()> {
        let ns = Namespace::for_context(ctx)?;
        let mut data = self.namespaces.entry(ns).or_default();

        let merged = match data.records.get(&update.id) {
            Some(existing) => {
                let mut merged = existing.clone();
                update.apply_to(&mut merged);
                merged
            }
            None => update
                .clone()
                .into_record()
                .ok_or_else(|| AppError::not_found("auth set not found"))?,
        };

        if data.identity_taken(&merged) {
            return Err(AppError::conflict("auth set conflict"));
        }
        debug!(auth_id = %merged.id, "Auth set upserted");
        data.records.insert(merged.id.clone(), merged);
        Ok(())
    }

    async fn insert(&self, ctx: &RequestContext, auth: &AuthSet) -> AppResult<()> {
        let ns = Namespace::for_context(ctx)?;
        let mut data = self.namespaces.entry(ns).or_default();

        if data.records.contains_key(&auth.id) || data.identity_taken(auth) {
            return Err(AppError::conflict("auth set conflict"));
        }
        data.records.insert(auth.id.clone(), auth.clone());
        Ok(())
    }

    async fn update_strict(&self, ctx: &RequestContext, auth: &AuthSet) -> AppResult<()> {
        let ns = Namespace::for_context(ctx)?;
        let mut data = self
            .namespaces
            .get_mut(&ns)
            .ok_or_else(|| AppError::not_found("auth set not found"))?;

        if !data.records.contains_key(&auth.id) {
            return Err(AppError::not_found("auth set not found"));
        }
        if data.identity_taken(auth) {
            return Err(AppError::conflict("auth set conflict"));
        }
        data.records.insert(auth.id.clone(), auth.clone());
        Ok(())
    }

    async fn delete(&self, ctx: &RequestContext, id: &AuthId) -> AppResult<()> {
        let ns = Namespace::for_context(ctx)?;
        self.namespaces
            .get_mut(&ns)
            .and_then(|mut data| data.records.remove(id))
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("auth set not found"))
    }

    async fn delete_by_device(
        &self,
        ctx: &RequestContext,
        device_id: &DeviceId,
    ) -> AppResult<u64> {
        let ns = Namespace::for_context(ctx)?;
        let removed = match self.namespaces.get_mut(&ns) {
            Some(mut data) => {
                let before = data.records.len();
                data.records.retain(|_, auth| &auth.device_id != device_id);
                before - data.records.len()
            }
            None => 0,
        };

        match removed {
            0 => Err(AppError::not_found("auth set not found")),
            n => Ok(n as u64),
        }
    }

    async fn migrate(
        &self,
        ctx: &RequestContext,
        target: &str,
    ) -> AppResult<Vec<MigrationReport>> {
        let ns = Namespace::for_context(ctx)?;
        let steps = migration::steps_up_to(target)?;
        let mut data = self.namespaces.entry(ns).or_default();

        let mut reports = Vec::new();
        for version in steps {
            if data.applied.iter().any(|r| r.version == *version) {
                continue;
            }
            let count = data.records.len() as u64;
            let report = MigrationReport {
                version: version.to_string(),
                records_before: count,
                records_after: count,
                applied_at: Utc::now(),
            };
            data.applied.push(report.clone());
            reports.push(report);
        }
        Ok(reports)
    }

    async fn tenants(&self) -> AppResult<Vec<String>> {
        let mut tenants: Vec<String> = self
            .namespaces
            .iter()
            .filter_map(|entry| Namespace::tenant_of(entry.key().as_str()).map(str::to_string))
            .collect();
        tenants.sort();
        Ok(tenants)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
