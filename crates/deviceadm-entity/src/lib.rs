//! # deviceadm-entity
//!
//! Domain entity models for the device admission service. Every struct in
//! this crate represents a stored auth-set record or a domain value object
//! used to validate and filter those records.

pub mod auth_set;

pub use auth_set::{
    AuthSet, AuthSetFilter, AuthSetStatus, AuthSetUpdate, DeviceAuthAttributes,
};
