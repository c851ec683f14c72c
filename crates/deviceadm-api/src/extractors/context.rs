//! `ApiContext` extractor: builds the per-request context from the request
//! ID header and the tenant claim of the bearer token.

use std::convert::Infallible;
use std::ops::Deref;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::dangerous::insecure_decode;
use serde::Deserialize;

use deviceadm_core::RequestContext;
use deviceadm_core::context::REQUEST_ID_HEADER;

/// Request context available in handlers.
#[derive(Debug, Clone)]
pub struct ApiContext {
    /// Tenant and correlation ID threaded into every engine call.
    pub ctx: RequestContext,
    /// Raw `Authorization` header, forwarded on pre-authorization.
    pub authorization: Option<String>,
}

impl Deref for ApiContext {
    type Target = RequestContext;

    fn deref(&self) -> &Self::Target {
        &self.ctx
    }
}

/// Claims read from the identity token.
#[derive(Debug, Default, Deserialize)]
struct IdentityClaims {
    #[serde(default, alias = "mender.tenant")]
    tenant: Option<String>,
}

/// The request ID of a request, generated when the header is absent.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Reads the tenant claim of a bearer token without verifying it; the
/// signature is checked by the gateway in front of this service.
pub fn tenant_from_bearer(authorization: &str) -> Option<String> {
    let token = authorization.strip_prefix("Bearer ")?.trim();
    let data = insecure_decode::<IdentityClaims>(token).ok()?;
    data.claims.tenant.filter(|t| !t.is_empty())
}

impl<S> FromRequestParts<S> for ApiContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = request_id(&parts.headers);

        let authorization = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let mut ctx = RequestContext::new(request_id);
        if let Some(header) = authorization.as_deref() {
            match tenant_from_bearer(header) {
                Some(tenant) => ctx = ctx.with_tenant(tenant),
                None if header.starts_with("Bearer ") => {
                    tracing::debug!(
                        request_id = %ctx.request_id,
                        "No tenant claim in identity token"
                    );
                }
                None => {}
            }
        }

        Ok(ApiContext { ctx, authorization })
    }
}
