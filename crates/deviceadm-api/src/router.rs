//! Route definitions for the device admission HTTP API.
//!
//! Management routes are mounted under [`MANAGEMENT_BASE`], internal
//! routes under [`INTERNAL_BASE`]. The router receives `AppState` and
//! passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Base path of the management API.
pub const MANAGEMENT_BASE: &str = "/api/management/v1/admission";
/// Base path of the internal API.
pub const INTERNAL_BASE: &str = "/api/internal/v1/admission";

/// Build the complete Axum router with all routes and middleware.
///
/// Layers run outermost first: request ID assignment, request ID echo,
/// tracing span, access log.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest(MANAGEMENT_BASE, management_routes())
        .nest(INTERNAL_BASE, internal_routes())
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .layer(middleware::request_id::trace_layer())
        .layer(middleware::request_id::propagate_request_id_layer())
        .layer(middleware::request_id::set_request_id_layer())
        .with_state(state)
}

/// Auth set management: listing, decisions, pre-authorization, deletion.
fn management_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/devices",
            get(handlers::management::list_devices)
                .post(handlers::management::preauthorize_device)
                .delete(handlers::management::delete_device_data),
        )
        .route(
            "/devices/{id}",
            get(handlers::management::get_device).delete(handlers::management::delete_device),
        )
        .route(
            "/devices/{id}/status",
            get(handlers::management::get_device_status)
                .put(handlers::management::update_device_status),
        )
}

/// Service-to-service endpoints.
fn internal_routes() -> Router<AppState> {
    Router::new()
        .route("/devices/{id}", put(handlers::internal::submit_device))
        .route(
            "/devices/{id}/status",
            put(handlers::internal::accept_preauthorized),
        )
        .route("/tenants", post(handlers::internal::provision_tenant))
        .route("/health", get(handlers::health::health))
}
