//! Device identity decoding.

use deviceadm_core::{AppError, AppResult};
use serde_json::Value;

use super::model::DeviceAuthAttributes;

/// Decode the identity blob into its attribute set.
///
/// The identity must be a JSON object of string attributes with at least
/// one entry.
pub fn parse_identity(identity: &str) -> AppResult<DeviceAuthAttributes> {
    let value: Value = serde_json::from_str(identity).map_err(|e| {
        AppError::with_source(
            deviceadm_core::ErrorKind::Validation,
            "failed to decode attributes data: invalid device identity",
            e,
        )
    })?;

    let Value::Object(map) = value else {
        return Err(AppError::validation(
            "failed to decode attributes data: device identity must be a JSON object",
        ));
    };

    let attributes = map
        .into_iter()
        .map(|(name, value)| match value {
            Value::String(s) => Ok((name, s)),
            _ => Err(AppError::validation(format!(
                "failed to decode attributes data: attribute '{name}' must be a string"
            ))),
        })
        .collect::<AppResult<DeviceAuthAttributes>>()?;

    if attributes.is_empty() {
        return Err(AppError::validation(
            "no attributes to update: device identity is empty",
        ));
    }

    Ok(attributes)
}
