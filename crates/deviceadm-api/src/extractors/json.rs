//! JSON body extractor that validates the decoded request.

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use deviceadm_core::error::AppError;

use super::context::request_id;
use crate::error::ApiError;

/// A JSON request body that passed its `validator` rules.
///
/// Decoding and validation failures both surface as `400` with the
/// standard error body.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let request_id = request_id(req.headers());

        let Json(body) = Json::<T>::from_request(req, state).await.map_err(|e| {
            ApiError::new(
                AppError::validation(format!("failed to decode request body: {}", e.body_text())),
                request_id.clone(),
            )
        })?;

        body.validate()
            .map_err(|e| ApiError::new(AppError::validation(describe(&e)), request_id))?;

        Ok(Self(body))
    }
}

/// Flatten field errors into one message, using each rule's message when
/// it has one.
fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(message) => message.to_string(),
                None => format!("{field}: invalid value"),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}
