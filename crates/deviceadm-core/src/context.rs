//! Request context carrying the acting tenant and the request correlation ID.

use serde::{Deserialize, Serialize};

/// Header carrying the request correlation ID, both inbound and towards
/// the downstream device authentication service.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Context for the current request.
///
/// Built by the HTTP layer and passed explicitly into every engine, store
/// and client call, so that each operation knows *which* tenant it acts
/// for. The tenant decides the storage namespace; data of one tenant is
/// never reachable through a context carrying another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Correlation ID echoed in responses and forwarded downstream.
    pub request_id: String,
    /// Acting tenant; `None` selects the default namespace.
    pub tenant: Option<String>,
}

impl RequestContext {
    /// Creates a context for the default namespace.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            tenant: None,
        }
    }

    /// Returns a copy of this context acting for `tenant`.
    ///
    /// An empty tenant string selects the default namespace.
    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        let tenant = tenant.into();
        self.tenant = if tenant.is_empty() { None } else { Some(tenant) };
        self
    }

    /// Creates a context with a freshly generated request ID.
    pub fn generated() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    /// The acting tenant, if any.
    pub fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref()
    }
}
