//! Admission status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Admission state of an authentication set.
///
/// Standard transitions are `pending -> accepted | rejected`. A
/// `preauthorized` record only moves to `accepted`, through the dedicated
/// pre-authorization acceptance path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthSetStatus {
    /// Submitted by the device, awaiting an operator decision.
    Pending,
    /// Admitted.
    Accepted,
    /// Refused.
    Rejected,
    /// Registered out-of-band, awaiting pre-authorization acceptance.
    Preauthorized,
}

impl AuthSetStatus {
    /// All statuses, in the order they are listed to callers.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Accepted,
        Self::Rejected,
        Self::Preauthorized,
    ];

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Preauthorized => "preauthorized",
        }
    }

    /// Whether an operator may set this status through accept/reject.
    pub fn is_operator_decision(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }
}

impl fmt::Display for AuthSetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AuthSetStatus {
    type Err = deviceadm_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "preauthorized" => Ok(Self::Preauthorized),
            _ => Err(deviceadm_core::AppError::validation(
                "status must be one of: pending, accepted, rejected, preauthorized",
            )),
        }
    }
}
