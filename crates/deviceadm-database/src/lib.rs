//! # deviceadm-database
//!
//! Auth-set persistence for the device admission service. The
//! [`AuthSetStore`] trait is implemented by a PostgreSQL store (one schema
//! per tenant) and by an in-memory store used for tests and single-process
//! deployments.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod namespace;
pub mod repositories;
pub mod store;

pub use connection::connect;
pub use memory::MemoryAuthSetStore;
pub use migration::{LATEST_VERSION, MIGRATION_VERSIONS, MigrationReport};
pub use namespace::Namespace;
pub use repositories::PgAuthSetStore;
pub use store::AuthSetStore;
