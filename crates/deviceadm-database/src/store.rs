//! The auth-set store contract.

use async_trait::async_trait;

use deviceadm_core::types::{AuthId, DeviceId};
use deviceadm_core::{AppResult, RequestContext};
use deviceadm_entity::{AuthSet, AuthSetFilter, AuthSetUpdate};

use crate::migration::MigrationReport;

/// Persistence of auth-set records.
///
/// Every call is scoped to the tenant of the given [`RequestContext`];
/// records of one tenant are never visible through another tenant's
/// context. Implementations must be safe for concurrent callers.
#[async_trait]
pub trait AuthSetStore: Send + Sync + 'static {
    /// List records ordered by ID, skipping `skip` and returning at most
    /// `limit`. Absent filter fields match everything.
    async fn list(
        &self,
        ctx: &RequestContext,
        skip: u64,
        limit: u64,
        filter: &AuthSetFilter,
    ) -> AppResult<Vec<AuthSet>>;

    /// Fetch one record; `NotFound` if absent.
    async fn get(&self, ctx: &RequestContext, id: &AuthId) -> AppResult<AuthSet>;

    /// Upsert by ID, merging only the fields present in `update`.
    ///
    /// Creating a record requires a complete update; an incomplete update
    /// of an absent record fails with `NotFound`.
    async fn put(&self, ctx: &RequestContext, update: &AuthSetUpdate) -> AppResult<()>;

    /// Create a record; `Conflict` if the ID or the identity and key pair
    /// is already stored.
    async fn insert(&self, ctx: &RequestContext, auth: &AuthSet) -> AppResult<()>;

    /// Replace an existing record; `NotFound` if absent. Never creates.
    async fn update_strict(&self, ctx: &RequestContext, auth: &AuthSet) -> AppResult<()>;

    /// Remove one record; `NotFound` if absent.
    async fn delete(&self, ctx: &RequestContext, id: &AuthId) -> AppResult<()>;

    /// Remove every record of a device, returning the count; `NotFound`
    /// if none matched.
    async fn delete_by_device(&self, ctx: &RequestContext, device_id: &DeviceId)
    -> AppResult<u64>;

    /// Advance the tenant's namespace to `target`, applying each pending
    /// step in order. Already applied steps are skipped.
    async fn migrate(&self, ctx: &RequestContext, target: &str)
    -> AppResult<Vec<MigrationReport>>;

    /// Tenants that own a namespace.
    async fn tenants(&self) -> AppResult<Vec<String>>;

    /// Check that the backend answers.
    async fn ping(&self) -> AppResult<()>;
}
