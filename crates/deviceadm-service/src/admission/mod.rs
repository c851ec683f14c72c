//! Auth-set admission lifecycle.

pub mod model;
pub mod service;


pub use model::{PreauthorizeDevice, SubmitDeviceAuth};
pub use service::AdmissionService;
