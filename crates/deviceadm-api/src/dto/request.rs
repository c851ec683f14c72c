//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use deviceadm_core::types::{AuthId, DeviceId};
use deviceadm_service::{PreauthorizeDevice, SubmitDeviceAuth};

/// Body of the status endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StatusRequest {
    /// Requested status.
    #[validate(length(min = 1, message = "status must be provided"))]
    pub status: String,
}

/// Pre-authorization request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PreauthRequest {
    /// Identity blob, a JSON object of attributes.
    #[serde(default)]
    #[validate(length(min = 1, message = "'device_identity' field required"))]
    pub device_identity: String,
    /// Public key in PEM form.
    #[serde(default)]
    #[validate(length(min = 1, message = "'key' field required"))]
    pub key: String,
}

impl From<PreauthRequest> for PreauthorizeDevice {
    fn from(req: PreauthRequest) -> Self {
        Self {
            device_identity: req.device_identity,
            key: req.key,
        }
    }
}

/// Auth set submitted by the device authentication service.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitRequest {
    /// Device the auth set belongs to.
    #[serde(default)]
    #[validate(length(min = 1, message = "'device_id' field required"))]
    pub device_id: String,
    /// Identity blob.
    #[serde(default)]
    #[validate(length(min = 1, message = "'device_identity' field required"))]
    pub device_identity: String,
    /// Public key.
    #[serde(default)]
    #[validate(length(min = 1, message = "'key' field required"))]
    pub key: String,
}

impl SubmitRequest {
    /// Bind the body to the auth set ID taken from the path.
    pub fn into_submission(self, id: AuthId) -> SubmitDeviceAuth {
        SubmitDeviceAuth {
            id,
            device_id: DeviceId::new(self.device_id),
            device_identity: self.device_identity,
            key: self.key,
        }
    }
}

/// Tenant provisioning request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TenantRequest {
    /// Tenant to provision.
    #[serde(default)]
    #[validate(length(min = 1, message = "tenant_id must be provided"))]
    pub tenant_id: String,
}
