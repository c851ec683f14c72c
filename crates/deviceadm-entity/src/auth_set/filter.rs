//! Listing filter for auth sets.

use deviceadm_core::types::DeviceId;
use serde::{Deserialize, Serialize};

use super::model::AuthSet;
use super::status::AuthSetStatus;

/// Exact-match filter applied when listing auth sets.
///
/// Absent fields are wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSetFilter {
    /// Only records in this status.
    pub status: Option<AuthSetStatus>,
    /// Only records of this device.
    pub device_id: Option<DeviceId>,
}

impl AuthSetFilter {
    /// Filter by status.
    pub fn with_status(mut self, status: AuthSetStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Filter by device.
    pub fn with_device_id(mut self, device_id: impl Into<DeviceId>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Whether `auth` passes the filter.
    pub fn matches(&self, auth: &AuthSet) -> bool {
        self.status.is_none_or(|s| auth.status == s)
            && self.device_id.as_ref().is_none_or(|d| &auth.device_id == d)
    }
}
