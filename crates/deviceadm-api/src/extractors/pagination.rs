//! Pagination and filter query extractor for list endpoints.

use std::str::FromStr;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, header};
use url::form_urlencoded;

use deviceadm_core::error::AppError;
use deviceadm_core::types::pagination::{DEFAULT_PAGE, DEFAULT_PER_PAGE, Page};
use deviceadm_core::types::{DeviceId, PageRequest};
use deviceadm_entity::{AuthSetFilter, AuthSetStatus};

use super::context::request_id;
use crate::error::ApiError;

/// Parsed `page`, `per_page`, `status` and `device_id` query parameters.
#[derive(Debug, Clone)]
pub struct ListQuery {
    /// Requested page.
    pub page: PageRequest,
    /// Record filter.
    pub filter: AuthSetFilter,
    /// `scheme://host/path` of the request, used to build links.
    base_url: String,
}

impl ListQuery {
    /// Parse a raw query string.
    pub fn parse(query: Option<&str>, base_url: impl Into<String>) -> Result<Self, AppError> {
        let mut page = DEFAULT_PAGE;
        let mut per_page = DEFAULT_PER_PAGE;
        let mut filter = AuthSetFilter::default();

        for (name, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match name.as_ref() {
                "page" => page = parse_number(&value)?,
                "per_page" => per_page = parse_number(&value)?,
                "status" if !value.is_empty() => {
                    filter.status = Some(AuthSetStatus::from_str(&value)?);
                }
                "device_id" if !value.is_empty() => {
                    filter.device_id = Some(DeviceId::new(value.into_owned()));
                }
                _ => {}
            }
        }

        Ok(Self {
            page: PageRequest::new(page, per_page)?,
            filter,
            base_url: base_url.into(),
        })
    }

    /// `Link` header values for `page`, in the order `prev`, `next`,
    /// `first`.
    pub fn links<T>(&self, page: &Page<T>) -> Vec<String> {
        let mut links = Vec::with_capacity(3);
        if page.has_previous() {
            links.push(self.link(page.page - 1, "prev"));
        }
        if page.has_next {
            links.push(self.link(page.page + 1, "next"));
        }
        links.push(self.link(1, "first"));
        links
    }

    fn link(&self, page: u64, rel: &str) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &self.page.per_page.to_string());
        if let Some(status) = self.filter.status {
            query.append_pair("status", status.as_str());
        }
        if let Some(device_id) = &self.filter.device_id {
            query.append_pair("device_id", device_id.as_str());
        }
        format!("<{}?{}>; rel=\"{rel}\"", self.base_url, query.finish())
    }
}

fn parse_number(value: &str) -> Result<u64, AppError> {
    value
        .parse::<u64>()
        .map_err(|_| AppError::validation(format!("invalid page query: \"{value}\"")))
}

/// `scheme://host/path` of the request as seen by the client.
fn base_url(parts: &Parts) -> String {
    let headers: &HeaderMap = &parts.headers;
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| parts.uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost");
    format!("{scheme}://{host}{}", parts.uri.path())
}

impl<S> FromRequestParts<S> for ListQuery
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::parse(parts.uri.query(), base_url(parts))
            .map_err(|e| ApiError::new(e, request_id(&parts.headers)))
    }
}
