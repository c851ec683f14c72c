//! Scripted in-process device authentication client.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use deviceadm_core::types::{AuthId, DeviceId};
use deviceadm_core::{AppResult, RequestContext};
use deviceadm_entity::AuthSetStatus;

use super::DevAuthClient;
use super::model::PreAuthRequest;

/// A recorded call to [`MockDevAuthClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DevAuthCall {
    /// A status update.
    UpdateStatus {
        /// Tenant of the calling context.
        tenant: Option<String>,
        /// Auth set reported.
        auth_id: AuthId,
        /// Device reported.
        device_id: DeviceId,
        /// Reported status.
        status: AuthSetStatus,
    },
    /// A pre-authorization.
    Preauthorize {
        /// Tenant of the calling context.
        tenant: Option<String>,
        /// The request body.
        request: PreAuthRequest,
        /// Forwarded `Authorization` header.
        authorization: Option<String>,
    },
}

/// Client answering from a queue of scripted results.
///
/// Each call pops the next scripted result; an empty queue answers `Ok`.
/// Every call is recorded.
#[derive(Debug, Default)]
pub struct MockDevAuthClient {
    responses: Mutex<VecDeque<AppResult<()>>>,
    calls: Mutex<Vec<DevAuthCall>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockDevAuthClient {
    /// A client answering `Ok` to everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next call.
    pub fn push_response(&self, result: AppResult<()>) -> &Self {
        lock(&self.responses).push_back(result);
        self
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<DevAuthCall> {
        lock(&self.calls).clone()
    }

    fn answer(&self, call: DevAuthCall) -> AppResult<()> {
        lock(&self.calls).push(call);
        lock(&self.responses).pop_front().unwrap_or(Ok(()))
    }
}

#[async_trait]
impl DevAuthClient for MockDevAuthClient {
    async fn update_status(
        &self,
        ctx: &RequestContext,
        auth_id: &AuthId,
        device_id: &DeviceId,
        status: AuthSetStatus,
    ) -> AppResult<()> {
        self.answer(DevAuthCall::UpdateStatus {
            tenant: ctx.tenant.clone(),
            auth_id: auth_id.clone(),
            device_id: device_id.clone(),
            status,
        })
    }

    async fn preauthorize(
        &self,
        ctx: &RequestContext,
        request: &PreAuthRequest,
        authorization: Option<&str>,
    ) -> AppResult<()> {
        self.answer(DevAuthCall::Preauthorize {
            tenant: ctx.tenant.clone(),
            request: request.clone(),
            authorization: authorization.map(str::to_string),
        })
    }
}
