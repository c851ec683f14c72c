//! Auth-set entity model.

use std::collections::BTreeMap;
use std::ops::Deref;

use chrono::{DateTime, Utc};
use deviceadm_core::types::{AuthId, DeviceId};
use serde::{Deserialize, Serialize};

use super::status::AuthSetStatus;

/// Decoded, human-readable identity attributes of a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceAuthAttributes(pub BTreeMap<String, String>);

impl Deref for DeviceAuthAttributes {
    type Target = BTreeMap<String, String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<(String, String)> for DeviceAuthAttributes {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A device authentication attempt and its admission status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSet {
    /// System-generated identifier of this authentication attempt.
    pub id: AuthId,
    /// Stable identifier of the physical device.
    pub device_id: DeviceId,
    /// Identity blob as submitted by the device.
    pub device_identity: String,
    /// Public key in canonical PEM form.
    pub key: String,
    /// Admission state.
    pub status: AuthSetStatus,
    /// Attributes decoded from `device_identity`.
    #[serde(default)]
    pub attributes: DeviceAuthAttributes,
    /// When the submission was received.
    #[serde(default)]
    pub request_time: Option<DateTime<Utc>>,
}

/// A partial auth-set record used for upserts.
///
/// `None` means "leave unchanged". Merging never clears a populated field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSetUpdate {
    /// Record to update or create.
    pub id: AuthId,
    /// New device identifier.
    pub device_id: Option<DeviceId>,
    /// New identity blob.
    pub device_identity: Option<String>,
    /// New public key.
    pub key: Option<String>,
    /// New status.
    pub status: Option<AuthSetStatus>,
    /// New decoded attributes.
    pub attributes: Option<DeviceAuthAttributes>,
    /// New reception time.
    pub request_time: Option<DateTime<Utc>>,
}

impl AuthSetUpdate {
    /// An update touching only the status (and the device the record
    /// belongs to).
    pub fn status_only(id: AuthId, device_id: DeviceId, status: AuthSetStatus) -> Self {
        Self {
            id,
            device_id: Some(device_id),
            status: Some(status),
            ..Self::default()
        }
    }

    /// Whether the update carries every field a new record requires.
    pub fn is_complete(&self) -> bool {
        self.device_id.is_some()
            && self.device_identity.is_some()
            && self.key.is_some()
            && self.status.is_some()
    }

    /// Merge the present fields into `auth`.
    pub fn apply_to(&self, auth: &mut AuthSet) {
        if let Some(device_id) = &self.device_id {
            auth.device_id = device_id.clone();
        }
        if let Some(identity) = &self.device_identity {
            auth.device_identity = identity.clone();
        }
        if let Some(key) = &self.key {
            auth.key = key.clone();
        }
        if let Some(status) = self.status {
            auth.status = status;
        }
        if let Some(attributes) = &self.attributes {
            auth.attributes = attributes.clone();
        }
        if let Some(request_time) = self.request_time {
            auth.request_time = Some(request_time);
        }
    }

    /// Build a new record from a complete update; `None` when incomplete.
    pub fn into_record(self) -> Option<AuthSet> {
        Some(AuthSet {
            id: self.id,
            device_id: self.device_id?,
            device_identity: self.device_identity?,
            key: self.key?,
            status: self.status?,
            attributes: self.attributes.unwrap_or_default(),
            request_time: self.request_time,
        })
    }
}

impl From<AuthSet> for AuthSetUpdate {
    fn from(auth: AuthSet) -> Self {
        Self {
            id: auth.id,
            device_id: Some(auth.device_id),
            device_identity: Some(auth.device_identity),
            key: Some(auth.key),
            status: Some(auth.status),
            attributes: Some(auth.attributes),
            request_time: auth.request_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AuthSet {
        AuthSet {
            id: AuthId::new("a1"),
            device_id: DeviceId::new("d1"),
            device_identity: r#"{"mac":"00:11"}"#.to_string(),
            key: "k".to_string(),
            status: AuthSetStatus::Pending,
            attributes: [("mac".to_string(), "00:11".to_string())]
                .into_iter()
                .collect(),
            request_time: Some(Utc::now()),
        }
    }

    #[test]
    fn test_status_only_merge_keeps_other_fields() {
        let mut auth = sample();
        let before = auth.clone();
        AuthSetUpdate::status_only(auth.id.clone(), auth.device_id.clone(), AuthSetStatus::Accepted)
            .apply_to(&mut auth);

        assert_eq!(auth.status, AuthSetStatus::Accepted);
        assert_eq!(auth.key, before.key);
        assert_eq!(auth.device_identity, before.device_identity);
        assert_eq!(auth.attributes, before.attributes);
        assert_eq!(auth.request_time, before.request_time);
    }

    #[test]
    fn test_incomplete_update_builds_no_record() {
        let update = AuthSetUpdate::status_only(
            AuthId::new("a1"),
            DeviceId::new("d1"),
            AuthSetStatus::Accepted,
        );
        assert!(!update.is_complete());
        assert!(update.into_record().is_none());
    }

    #[test]
    fn test_full_update_roundtrips_record() {
        let auth = sample();
        let update = AuthSetUpdate::from(auth.clone());
        assert!(update.is_complete());
        assert_eq!(update.into_record(), Some(auth));
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["id"], "a1");
        assert_eq!(json["device_id"], "d1");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["attributes"]["mac"], "00:11");
    }
}
