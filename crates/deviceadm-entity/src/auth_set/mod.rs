//! Authentication set records and their admission state.

pub mod filter;
pub mod identity;
pub mod key;
pub mod model;
pub mod status;

pub use filter::AuthSetFilter;
pub use identity::parse_identity;
pub use key::normalize_public_key;
pub use model::{AuthSet, AuthSetUpdate, DeviceAuthAttributes};
pub use status::AuthSetStatus;
