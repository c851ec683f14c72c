//! reqwest-backed device authentication client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tracing::{Instrument, debug, info_span, warn};
use url::Url;

use deviceadm_core::config::DevAuthConfig;
use deviceadm_core::context::REQUEST_ID_HEADER;
use deviceadm_core::error::{AppError, ErrorKind};
use deviceadm_core::types::{AuthId, DeviceId};
use deviceadm_core::{AppResult, RequestContext};
use deviceadm_entity::AuthSetStatus;

use super::DevAuthClient;
use super::model::{ErrorResponse, PreAuthRequest, StatusRequest};

/// Path segments of the devices collection.
const DEVICES_PATH: [&str; 5] = ["api", "management", "v1", "devauth", "devices"];

/// HTTP client of the device authentication service.
#[derive(Debug, Clone)]
pub struct HttpDevAuthClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpDevAuthClient {
    /// Create a client from configuration.
    pub fn new(config: &DevAuthConfig) -> AppResult<Self> {
        let base_url = Url::parse(&config.url).map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("invalid devauth url '{}'", config.url),
                e,
            )
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::configuration(format!(
                "invalid devauth url '{}'",
                config.url
            )));
        }

        let client = Client::builder().build().map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "failed to build HTTP client", e)
        })?;

        Ok(Self {
            client,
            base_url,
            timeout: config.timeout(),
        })
    }

    /// `<base>/api/management/v1/devauth/devices[/<extra>...]`
    fn devices_url(&self, extra: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| AppError::configuration("devauth url cannot be a base"))?
            .pop_if_empty()
            .extend(DEVICES_PATH)
            .extend(extra);
        Ok(url)
    }

    /// `.../devices/{id}/auth/{aid}/status`
    pub fn status_url(&self, device_id: &DeviceId, auth_id: &AuthId) -> AppResult<Url> {
        self.devices_url(&[device_id.as_str(), "auth", auth_id.as_str(), "status"])
    }

    fn transport_error(context: &str, err: reqwest::Error) -> AppError {
        let message = if err.is_timeout() {
            format!("{context}: request timed out")
        } else {
            format!("{context}: {err}")
        };
        AppError::with_source(ErrorKind::ExternalService, message, err)
    }
}

/// Read the `{"error": ...}` payload of a failed response.
async fn error_message(response: Response) -> Option<String> {
    response
        .json::<ErrorResponse>()
        .await
        .ok()
        .map(|body| body.error)
}

#[async_trait]
impl DevAuthClient for HttpDevAuthClient {
    async fn update_status(
        &self,
        ctx: &RequestContext,
        auth_id: &AuthId,
        device_id: &DeviceId,
        status: AuthSetStatus,
    ) -> AppResult<()> {
        let url = self.status_url(device_id, auth_id)?;
        debug!(device_id = %device_id, auth_id = %auth_id, %status, "Updating device status");

        let span = info_span!(
            "devauth.update_status",
            http.method = "PUT",
            url = %url,
            request_id = %ctx.request_id
        );
        let response = self
            .client
            .put(url)
            .timeout(self.timeout)
            .header(REQUEST_ID_HEADER, &ctx.request_id)
            .json(&StatusRequest { status })
            .send()
            .instrument(span)
            .await
            .map_err(|e| Self::transport_error("failed to update device status", e))?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(()),
            StatusCode::UNPROCESSABLE_ENTITY => match error_message(response).await {
                Some(message) => Err(AppError::unprocessable(message)),
                None => Err(AppError::external_service(
                    "device status update rejected with an unreadable error response",
                )),
            },
            other => {
                warn!(status = %other, auth_id = %auth_id, "Device status update failed");
                Err(AppError::external_service(format!(
                    "device status update request failed with status {other}"
                )))
            }
        }
    }

    async fn preauthorize(
        &self,
        ctx: &RequestContext,
        request: &PreAuthRequest,
        authorization: Option<&str>,
    ) -> AppResult<()> {
        let url = self.devices_url(&[])?;
        debug!(device_id = %request.device_id, auth_id = %request.auth_set_id, "Pre-authorizing device");

        let span = info_span!(
            "devauth.preauthorize",
            http.method = "POST",
            url = %url,
            request_id = %ctx.request_id
        );
        let mut builder = self
            .client
            .post(url)
            .timeout(self.timeout)
            .header(REQUEST_ID_HEADER, &ctx.request_id)
            .json(request);
        if let Some(authorization) = authorization {
            builder = builder.header(reqwest::header::AUTHORIZATION, authorization);
        }
        let response = builder
            .send()
            .instrument(span)
            .await
            .map_err(|e| Self::transport_error("failed to pre-authorize device", e))?;

        match response.status() {
            StatusCode::CREATED => Ok(()),
            StatusCode::CONFLICT => Err(AppError::conflict(
                error_message(response)
                    .await
                    .unwrap_or_else(|| "device already exists".to_string()),
            )),
            other => {
                warn!(status = %other, device_id = %request.device_id, "Pre-authorization failed");
                Err(AppError::external_service(format!(
                    "device pre-authorization request failed with status {other}"
                )))
            }
        }
    }
}
