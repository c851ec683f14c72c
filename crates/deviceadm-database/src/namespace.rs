//! Tenant storage namespaces.
//!
//! Every store operation resolves the acting tenant of its
//! [`RequestContext`] into a namespace: `deviceadm` without a tenant,
//! `deviceadm-<tenant>` otherwise. In PostgreSQL a namespace is a schema.

use std::fmt;

use deviceadm_core::{AppError, AppResult, RequestContext};

/// Namespace used when the request carries no tenant.
pub const DEFAULT_NAMESPACE: &str = "deviceadm";

/// Longest identifier PostgreSQL keeps without truncation.
const MAX_NAMESPACE_LEN: usize = 63;

/// A validated storage namespace name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(String);

impl Namespace {
    /// The namespace of requests without a tenant.
    pub fn default_namespace() -> Self {
        Self(DEFAULT_NAMESPACE.to_string())
    }

    /// Resolve the namespace of a tenant.
    pub fn for_tenant(tenant: Option<&str>) -> AppResult<Self> {
        let Some(tenant) = tenant.filter(|t| !t.is_empty()) else {
            return Ok(Self::default_namespace());
        };

        if !tenant
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(AppError::validation(format!(
                "invalid tenant id: '{tenant}'"
            )));
        }

        let name = format!("{DEFAULT_NAMESPACE}-{tenant}");
        if name.len() > MAX_NAMESPACE_LEN {
            return Err(AppError::validation(format!(
                "invalid tenant id: '{tenant}' is too long"
            )));
        }
        Ok(Self(name))
    }

    /// Resolve the namespace of the acting tenant.
    pub fn for_context(ctx: &RequestContext) -> AppResult<Self> {
        Self::for_tenant(ctx.tenant())
    }

    /// Recover the tenant from a namespace name, if it is a tenant namespace.
    pub fn tenant_of(name: &str) -> Option<&str> {
        name.strip_prefix(DEFAULT_NAMESPACE)?
            .strip_prefix('-')
            .filter(|t| !t.is_empty())
    }

    /// The bare namespace name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name as a quoted SQL identifier.
    pub fn quoted(&self) -> String {
        // validated names never contain quotes
        format!("\"{}\"", self.0)
    }

    /// A table of this namespace as a qualified SQL identifier.
    pub fn table(&self, table: &str) -> String {
        format!("{}.{table}", self.quoted())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
