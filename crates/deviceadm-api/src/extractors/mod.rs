//! Custom Axum extractors.

pub mod context;
pub mod json;
pub mod pagination;

pub use context::ApiContext;
pub use json::ValidatedJson;
pub use pagination::ListQuery;
