//! Inputs of the admission operations.

use serde::{Deserialize, Serialize};

use deviceadm_core::AppResult;
use deviceadm_core::types::{AuthId, DeviceId};
use deviceadm_entity::auth_set::{normalize_public_key, parse_identity};
use deviceadm_entity::{AuthSet, AuthSetStatus};

/// An authentication request forwarded by the device authentication service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitDeviceAuth {
    /// Auth set ID assigned by the device authentication service.
    pub id: AuthId,
    /// Device the request belongs to.
    pub device_id: DeviceId,
    /// Identity blob.
    pub device_identity: String,
    /// Public key.
    pub key: String,
}

impl SubmitDeviceAuth {
    /// Decode the identity and build a `pending` record.
    pub fn into_auth_set(self) -> AppResult<AuthSet> {
        let attributes = parse_identity(&self.device_identity)?;
        Ok(AuthSet {
            id: self.id,
            device_id: self.device_id,
            device_identity: self.device_identity,
            key: self.key,
            status: AuthSetStatus::Pending,
            attributes,
            request_time: None,
        })
    }
}

/// An out-of-band registration of a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreauthorizeDevice {
    /// Identity blob.
    pub device_identity: String,
    /// Public key in PEM form.
    pub key: String,
}

impl PreauthorizeDevice {
    /// Validate identity and key and build a `preauthorized` record with
    /// fresh auth set and device IDs.
    pub fn into_auth_set(self) -> AppResult<AuthSet> {
        let attributes = parse_identity(&self.device_identity)?;
        let key = normalize_public_key(&self.key)?;
        Ok(AuthSet {
            id: AuthId::generate(),
            device_id: DeviceId::generate(),
            device_identity: self.device_identity,
            key,
            status: AuthSetStatus::Preauthorized,
            attributes,
            request_time: None,
        })
    }
}
