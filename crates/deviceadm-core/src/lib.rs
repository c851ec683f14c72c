//! # deviceadm-core
//!
//! Core crate for the device admission service. Contains configuration
//! schemas, the unified error system, the per-request context, typed
//! identifiers and offset pagination math.
//!
//! This crate has **no** internal dependencies on other deviceadm crates.

pub mod config;
pub mod context;
pub mod error;
pub mod result;
pub mod types;

pub use context::RequestContext;
pub use error::{AppError, ErrorKind};
pub use result::AppResult;
