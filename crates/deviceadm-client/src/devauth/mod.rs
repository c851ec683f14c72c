//! Device authentication service client.

pub mod client;
#[cfg(feature = "mock")]
pub mod mock;
pub mod model;

use async_trait::async_trait;

use deviceadm_core::types::{AuthId, DeviceId};
use deviceadm_core::{AppResult, RequestContext};
use deviceadm_entity::AuthSetStatus;

pub use client::HttpDevAuthClient;
pub use model::{ErrorResponse, PreAuthRequest, StatusRequest};

/// Operations of the device authentication service this service relies on.
#[async_trait]
pub trait DevAuthClient: Send + Sync + 'static {
    /// Report a status transition of an auth set.
    ///
    /// Fails with `Unprocessable` carrying the service's message when the
    /// transition is refused by a business rule (e.g. a device limit), and
    /// with `ExternalService` on timeouts, connection failures and any
    /// other unexpected response.
    async fn update_status(
        &self,
        ctx: &RequestContext,
        auth_id: &AuthId,
        device_id: &DeviceId,
        status: AuthSetStatus,
    ) -> AppResult<()>;

    /// Register a pre-authorized device, forwarding the caller's
    /// `Authorization` header. Fails with `Conflict` when the device is
    /// already known.
    async fn preauthorize(
        &self,
        ctx: &RequestContext,
        request: &PreAuthRequest,
        authorization: Option<&str>,
    ) -> AppResult<()>;
}
