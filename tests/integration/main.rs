//! HTTP-level integration tests driving the router in process.

mod devices_test;
mod helpers;
mod internal_test;
