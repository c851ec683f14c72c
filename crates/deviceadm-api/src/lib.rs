//! # deviceadm-api
//!
//! HTTP API layer for the device admission service built on Axum.
//!
//! Provides the management and internal REST endpoints, the request
//! context and pagination extractors, request DTOs, request logging and
//! the mapping of [`AppError`](deviceadm_core::AppError) kinds to HTTP
//! responses.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use state::AppState;
