//! Downstream device authentication service configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the device authentication service client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevAuthConfig {
    /// Base URL of the device authentication service.
    #[serde(default = "default_url")]
    pub url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl DevAuthConfig {
    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for DevAuthConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_url() -> String {
    "http://mender-device-auth:8080".to_string()
}

fn default_timeout() -> u64 {
    10
}
