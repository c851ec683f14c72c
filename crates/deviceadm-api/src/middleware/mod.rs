//! Axum middleware stack.

pub mod logging;
pub mod request_id;
