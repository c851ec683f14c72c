//! Management API handlers: listing, inspection, operator decisions,
//! pre-authorization and deletion of auth sets.

use axum::Json;
use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use url::form_urlencoded;

use deviceadm_core::error::{AppError, ErrorKind};
use deviceadm_core::types::{AuthId, DeviceId};
use deviceadm_entity::{AuthSet, AuthSetStatus};

use crate::dto::request::{PreauthRequest, StatusRequest};
use crate::dto::response::StatusResponse;
use crate::error::{ApiError, ResultExt};
use crate::extractors::{ApiContext, ListQuery, ValidatedJson};
use crate::router::MANAGEMENT_BASE;
use crate::state::AppState;

/// GET /devices
pub async fn list_devices(
    State(state): State<AppState>,
    ctx: ApiContext,
    query: ListQuery,
) -> Result<Response, ApiError> {
    let fetched = state
        .admission
        .list_device_auths(
            &ctx,
            query.page.skip(),
            query.page.fetch_limit(),
            &query.filter,
        )
        .await
        .or_api(&ctx)?;
    let page = query.page.paginate(fetched);

    let mut headers = HeaderMap::new();
    for link in query.links(&page) {
        if let Ok(value) = HeaderValue::from_str(&link) {
            headers.append(header::LINK, value);
        }
    }

    Ok((StatusCode::OK, headers, Json(page.items)).into_response())
}

/// POST /devices
pub async fn preauthorize_device(
    State(state): State<AppState>,
    ctx: ApiContext,
    ValidatedJson(req): ValidatedJson<PreauthRequest>,
) -> Result<Response, ApiError> {
    let auth = state
        .admission
        .preauthorize_device(&ctx, req.into(), ctx.authorization.as_deref())
        .await
        .or_api(&ctx)?;

    let location = format!("{MANAGEMENT_BASE}/devices/{}", auth.id);
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&location) {
        headers.insert(header::LOCATION, value);
    }

    Ok((StatusCode::CREATED, headers).into_response())
}

/// DELETE /devices?device_id=
///
/// A device without auth sets is already in the requested state; the
/// call succeeds.
pub async fn delete_device_data(
    State(state): State<AppState>,
    ctx: ApiContext,
    RawQuery(query): RawQuery,
) -> Result<StatusCode, ApiError> {
    let device_id = query
        .as_deref()
        .and_then(|q| {
            form_urlencoded::parse(q.as_bytes())
                .find(|(name, _)| name == "device_id")
                .map(|(_, value)| value.into_owned())
        })
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::validation("device_id must be provided"))
        .or_api(&ctx)?;

    match state
        .admission
        .delete_device_data(&ctx, &DeviceId::new(device_id))
        .await
    {
        Ok(_) => Ok(StatusCode::NO_CONTENT),
        Err(e) if e.is(ErrorKind::NotFound) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(ApiError::new(e, ctx.request_id.clone())),
    }
}

/// GET /devices/{id}
pub async fn get_device(
    State(state): State<AppState>,
    ctx: ApiContext,
    Path(id): Path<String>,
) -> Result<Json<AuthSet>, ApiError> {
    let auth = state
        .admission
        .get_device_auth(&ctx, &AuthId::new(id))
        .await
        .or_api(&ctx)?;
    Ok(Json(auth))
}

/// DELETE /devices/{id}
pub async fn delete_device(
    State(state): State<AppState>,
    ctx: ApiContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .admission
        .delete_device_auth(&ctx, &AuthId::new(id))
        .await
        .or_api(&ctx)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /devices/{id}/status
pub async fn get_device_status(
    State(state): State<AppState>,
    ctx: ApiContext,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let auth = state
        .admission
        .get_device_auth(&ctx, &AuthId::new(id))
        .await
        .or_api(&ctx)?;
    Ok(Json(StatusResponse {
        status: auth.status,
    }))
}

/// PUT /devices/{id}/status
pub async fn update_device_status(
    State(state): State<AppState>,
    ctx: ApiContext,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<StatusRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let id = AuthId::new(id);
    let status = match req.status.parse::<AuthSetStatus>() {
        Ok(AuthSetStatus::Accepted) => {
            state.admission.accept_device_auth(&ctx, &id).await.or_api(&ctx)?;
            AuthSetStatus::Accepted
        }
        Ok(AuthSetStatus::Rejected) => {
            state.admission.reject_device_auth(&ctx, &id).await.or_api(&ctx)?;
            AuthSetStatus::Rejected
        }
        _ => {
            return Err(ApiError::new(
                AppError::validation("incorrect device status"),
                ctx.request_id.clone(),
            ));
        }
    };

    Ok(Json(StatusResponse { status }))
}
