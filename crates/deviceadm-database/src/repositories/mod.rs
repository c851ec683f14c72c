//! Repository implementations backed by PostgreSQL.

pub mod auth_set;

pub use auth_set::PgAuthSetStore;
