//! # deviceadm-client
//!
//! Client for the device authentication service, the source of truth for
//! device-facing authentication decisions. Status transitions are reported
//! to it before they are stored locally.
//!
//! Enable the `mock` feature for a scripted in-process implementation.

pub mod devauth;

pub use devauth::{DevAuthClient, HttpDevAuthClient, PreAuthRequest};

#[cfg(feature = "mock")]
pub use devauth::mock::{DevAuthCall, MockDevAuthClient};
