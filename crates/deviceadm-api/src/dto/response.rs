//! Response DTOs.

use serde::{Deserialize, Serialize};

use deviceadm_entity::AuthSetStatus;

/// Status of one auth set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Current status.
    pub status: AuthSetStatus,
}
