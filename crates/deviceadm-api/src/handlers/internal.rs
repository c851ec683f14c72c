//! Internal API handlers, called by other services of the platform.

use axum::extract::{Path, State};
use axum::http::StatusCode;

use deviceadm_core::error::AppError;
use deviceadm_core::types::AuthId;
use deviceadm_entity::AuthSetStatus;

use crate::dto::request::{StatusRequest, SubmitRequest, TenantRequest};
use crate::error::{ApiError, ResultExt};
use crate::extractors::{ApiContext, ValidatedJson};
use crate::state::AppState;

/// PUT /devices/{id}
pub async fn submit_device(
    State(state): State<AppState>,
    ctx: ApiContext,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<SubmitRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .admission
        .submit_device_auth(&ctx, req.into_submission(AuthId::new(id)))
        .await
        .or_api(&ctx)?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /devices/{id}/status
///
/// Only the acceptance of a pre-authorized auth set is possible here.
pub async fn accept_preauthorized(
    State(state): State<AppState>,
    ctx: ApiContext,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<StatusRequest>,
) -> Result<StatusCode, ApiError> {
    if req.status.parse::<AuthSetStatus>().ok() != Some(AuthSetStatus::Accepted) {
        return Err(ApiError::new(
            AppError::validation("status must be 'accepted'"),
            ctx.request_id.clone(),
        ));
    }

    state
        .admission
        .accept_device_preauth(&ctx, &AuthId::new(id))
        .await
        .or_api(&ctx)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /tenants
pub async fn provision_tenant(
    State(state): State<AppState>,
    ctx: ApiContext,
    ValidatedJson(req): ValidatedJson<TenantRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .admission
        .provision_tenant(&ctx, &req.tenant_id)
        .await
        .or_api(&ctx)?;
    Ok(StatusCode::CREATED)
}
