//! Admission engine.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use deviceadm_client::{DevAuthClient, PreAuthRequest};
use deviceadm_core::error::{AppError, ErrorKind};
use deviceadm_core::types::{AuthId, DeviceId};
use deviceadm_core::{AppResult, RequestContext};
use deviceadm_database::{AuthSetStore, LATEST_VERSION, MigrationReport};
use deviceadm_entity::{AuthSet, AuthSetFilter, AuthSetStatus, AuthSetUpdate};

use super::model::{PreauthorizeDevice, SubmitDeviceAuth};

/// Add context to infrastructure failures; classified errors pass through
/// untouched so their message reaches the caller verbatim.
fn wrap(err: AppError, context: &str) -> AppError {
    match err.kind {
        ErrorKind::NotFound
        | ErrorKind::Validation
        | ErrorKind::Unprocessable
        | ErrorKind::Conflict
        | ErrorKind::NotPreauthorized => err,
        _ => err.context(context),
    }
}

/// Orchestrates the auth-set state machine.
///
/// ```text
/// pending ──accept──▶ accepted
///    └────reject──▶ rejected
/// preauthorized ──accept_device_preauth──▶ accepted
/// ```
///
/// Standard transitions notify the device authentication service first and
/// persist second; a failed notification leaves the stored record as it was.
#[derive(Clone)]
pub struct AdmissionService {
    /// Auth-set storage.
    store: Arc<dyn AuthSetStore>,
    /// Device authentication service.
    devauth: Arc<dyn DevAuthClient>,
}

impl std::fmt::Debug for AdmissionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionService").finish_non_exhaustive()
    }
}

impl AdmissionService {
    /// Creates a new admission service.
    pub fn new(store: Arc<dyn AuthSetStore>, devauth: Arc<dyn DevAuthClient>) -> Self {
        Self { store, devauth }
    }

    /// Lists auth sets ordered by ID.
    pub async fn list_device_auths(
        &self,
        ctx: &RequestContext,
        skip: u64,
        limit: u64,
        filter: &AuthSetFilter,
    ) -> AppResult<Vec<AuthSet>> {
        self.store
            .list(ctx, skip, limit, filter)
            .await
            .map_err(|e| wrap(e, "failed to list device auths"))
    }

    /// Stores a submitted authentication request, stamping its reception
    /// time.
    pub async fn submit_device_auth(
        &self,
        ctx: &RequestContext,
        request: SubmitDeviceAuth,
    ) -> AppResult<()> {
        let mut auth = request.into_auth_set()?;
        auth.request_time = Some(Utc::now());

        self.store
            .put(ctx, &AuthSetUpdate::from(auth.clone()))
            .await
            .map_err(|e| wrap(e, "failed to put device"))?;

        info!(
            tenant = ctx.tenant().unwrap_or_default(),
            request_id = %ctx.request_id,
            auth_id = %auth.id,
            device_id = %auth.device_id,
            status = %auth.status,
            "Auth set submitted"
        );
        Ok(())
    }

    /// Fetches one auth set.
    pub async fn get_device_auth(&self, ctx: &RequestContext, id: &AuthId) -> AppResult<AuthSet> {
        self.store
            .get(ctx, id)
            .await
            .map_err(|e| wrap(e, "failed to fetch auth set"))
    }

    /// Accepts an auth set.
    pub async fn accept_device_auth(&self, ctx: &RequestContext, id: &AuthId) -> AppResult<()> {
        self.update_status(ctx, id, AuthSetStatus::Accepted).await
    }

    /// Rejects an auth set.
    pub async fn reject_device_auth(&self, ctx: &RequestContext, id: &AuthId) -> AppResult<()> {
        self.update_status(ctx, id, AuthSetStatus::Rejected).await
    }

    /// Notify-then-persist status transition out of `pending`.
    ///
    /// A crash between the two steps leaves the device authentication
    /// service ahead of the local record, which is still `pending`;
    /// repeating the operation converges both. Repeating a decision that is
    /// already stored is a no-op.
    async fn update_status(
        &self,
        ctx: &RequestContext,
        id: &AuthId,
        status: AuthSetStatus,
    ) -> AppResult<()> {
        if !status.is_operator_decision() {
            return Err(AppError::validation("incorrect device status"));
        }

        let mut auth = self.get_device_auth(ctx, id).await?;
        let previous = auth.status;
        if previous == status {
            return Ok(());
        }
        if previous != AuthSetStatus::Pending {
            return Err(AppError::conflict(format!(
                "auth set must be in 'pending' state, is '{previous}'"
            )));
        }
        auth.status = status;

        self.devauth
            .update_status(ctx, &auth.id, &auth.device_id, status)
            .await
            .map_err(|e| {
                warn!(
                    request_id = %ctx.request_id,
                    auth_id = %auth.id,
                    %status,
                    error = %e,
                    "Status propagation failed"
                );
                wrap(e, "failed to propagate status update")
            })?;

        self.store
            .put(
                ctx,
                &AuthSetUpdate::status_only(auth.id.clone(), auth.device_id.clone(), status),
            )
            .await
            .map_err(|e| wrap(e, "failed to update device status"))?;

        info!(
            tenant = ctx.tenant().unwrap_or_default(),
            request_id = %ctx.request_id,
            auth_id = %auth.id,
            device_id = %auth.device_id,
            from = %previous,
            to = %status,
            "Auth set status changed"
        );
        Ok(())
    }

    /// Accepts an auth set registered through pre-authorization.
    pub async fn accept_device_preauth(&self, ctx: &RequestContext, id: &AuthId) -> AppResult<()> {
        let mut auth = self.store.get(ctx, id).await.map_err(|e| match e.kind {
            ErrorKind::NotFound => AppError::not_found("auth set not found"),
            _ => e.context("failed to fetch auth set"),
        })?;

        if auth.status != AuthSetStatus::Preauthorized {
            return Err(AppError::not_preauthorized(
                "auth set must be in 'preauthorized' state",
            ));
        }

        auth.status = AuthSetStatus::Accepted;
        self.store
            .update_strict(ctx, &auth)
            .await
            .map_err(|e| match e.kind {
                ErrorKind::NotFound => AppError::not_found("auth set not found"),
                _ => e.context("failed to update auth set"),
            })?;

        info!(
            tenant = ctx.tenant().unwrap_or_default(),
            request_id = %ctx.request_id,
            auth_id = %auth.id,
            device_id = %auth.device_id,
            "Pre-authorized auth set accepted"
        );
        Ok(())
    }

    /// Registers a device out-of-band.
    ///
    /// The record is stored locally first (so duplicates are caught before
    /// the device authentication service is involved) and removed again if
    /// that service refuses it.
    pub async fn preauthorize_device(
        &self,
        ctx: &RequestContext,
        request: PreauthorizeDevice,
        authorization: Option<&str>,
    ) -> AppResult<AuthSet> {
        let auth = request.into_auth_set()?;

        self.store
            .insert(ctx, &auth)
            .await
            .map_err(|e| wrap(e, "failed to insert auth set"))?;

        let preauth = PreAuthRequest {
            device_id: auth.device_id.clone(),
            auth_set_id: auth.id.clone(),
            id_data: auth.device_identity.clone(),
            pubkey: auth.key.clone(),
        };
        if let Err(err) = self.devauth.preauthorize(ctx, &preauth, authorization).await {
            if let Err(cleanup) = self.store.delete(ctx, &auth.id).await {
                warn!(
                    request_id = %ctx.request_id,
                    auth_id = %auth.id,
                    error = %cleanup,
                    "Failed to remove local pre-authorization"
                );
            }
            return Err(wrap(err, "failed to pre-authorize device"));
        }

        info!(
            tenant = ctx.tenant().unwrap_or_default(),
            request_id = %ctx.request_id,
            auth_id = %auth.id,
            device_id = %auth.device_id,
            "Device pre-authorized"
        );
        Ok(auth)
    }

    /// Deletes one auth set.
    pub async fn delete_device_auth(&self, ctx: &RequestContext, id: &AuthId) -> AppResult<()> {
        self.store
            .delete(ctx, id)
            .await
            .map_err(|e| wrap(e, "failed to delete auth set"))?;
        info!(request_id = %ctx.request_id, auth_id = %id, "Auth set deleted");
        Ok(())
    }

    /// Deletes every auth set of a device; `NotFound` when it had none.
    pub async fn delete_device_data(
        &self,
        ctx: &RequestContext,
        device_id: &DeviceId,
    ) -> AppResult<u64> {
        let removed = self
            .store
            .delete_by_device(ctx, device_id)
            .await
            .map_err(|e| wrap(e, "failed to delete device auth sets"))?;
        info!(
            request_id = %ctx.request_id,
            device_id = %device_id,
            removed,
            "Device auth sets deleted"
        );
        Ok(removed)
    }

    /// Initializes (or brings up to date) the storage of a tenant.
    pub async fn provision_tenant(
        &self,
        ctx: &RequestContext,
        tenant_id: &str,
    ) -> AppResult<Vec<MigrationReport>> {
        if tenant_id.trim().is_empty() {
            return Err(AppError::validation("tenant_id must be provided"));
        }

        let tenant_ctx = ctx.clone().with_tenant(tenant_id);
        let reports = self
            .store
            .migrate(&tenant_ctx, LATEST_VERSION)
            .await
            .map_err(|e| wrap(e, "failed to provision tenant"))?;

        info!(
            request_id = %ctx.request_id,
            tenant = tenant_id,
            applied = reports.len(),
            "Tenant provisioned"
        );
        Ok(reports)
    }

    /// Migrates the default namespace and every known tenant, or only
    /// `tenant` when given.
    pub async fn migrate(
        &self,
        ctx: &RequestContext,
        tenant: Option<&str>,
    ) -> AppResult<Vec<(Option<String>, Vec<MigrationReport>)>> {
        let tenants: Vec<Option<String>> = match tenant {
            Some(tenant) => vec![Some(tenant.to_string())],
            None => std::iter::once(None)
                .chain(self.store.tenants().await?.into_iter().map(Some))
                .collect(),
        };

        let mut results = Vec::with_capacity(tenants.len());
        for tenant in tenants {
            let scoped = match &tenant {
                Some(t) => ctx.clone().with_tenant(t.as_str()),
                None => ctx.clone(),
            };
            let reports = self
                .store
                .migrate(&scoped, LATEST_VERSION)
                .await
                .map_err(|e| wrap(e, "failed to migrate namespace"))?;
            info!(
                tenant = tenant.as_deref().unwrap_or_default(),
                applied = reports.len(),
                "Namespace migrated"
            );
            results.push((tenant, reports));
        }
        Ok(results)
    }

    /// Checks that storage answers.
    pub async fn health(&self) -> AppResult<()> {
        self.store.ping().await
    }
}
