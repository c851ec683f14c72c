//! # deviceadm-service
//!
//! The admission engine. [`AdmissionService`] implements the auth-set
//! lifecycle (submit, accept, reject, pre-authorize, delete, tenant
//! provisioning) on top of an [`AuthSetStore`] and a [`DevAuthClient`].
//!
//! The engine keeps no state between calls; both collaborators are injected
//! at construction time as `Arc` trait objects.
//!
//! [`AuthSetStore`]: deviceadm_database::AuthSetStore
//! [`DevAuthClient`]: deviceadm_client::DevAuthClient

pub mod admission;

pub use admission::{AdmissionService, PreauthorizeDevice, SubmitDeviceAuth};
pub use deviceadm_core::RequestContext;
