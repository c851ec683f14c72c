//! Wire payloads of the device authentication service.

use serde::{Deserialize, Serialize};

use deviceadm_core::types::{AuthId, DeviceId};
use deviceadm_entity::AuthSetStatus;

/// Body of a status update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRequest {
    /// The new status.
    pub status: AuthSetStatus,
}

/// Body of a pre-authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreAuthRequest {
    /// Device ID assigned by this service.
    pub device_id: DeviceId,
    /// Auth set ID assigned by this service.
    pub auth_set_id: AuthId,
    /// Identity blob.
    pub id_data: String,
    /// Public key in canonical PEM form.
    pub pubkey: String,
}

/// Error payload returned by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub error: String,
}
