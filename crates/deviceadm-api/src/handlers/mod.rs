//! Route handlers organized by API.

pub mod health;
pub mod internal;
pub mod management;
