//! Core type definitions used across the deviceadm workspace.

pub mod id;
pub mod pagination;

pub use id::*;
pub use pagination::{Page, PageRequest};
