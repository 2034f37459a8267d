pub mod analytics;
pub mod backend;
pub mod notification;
pub mod schema;
pub mod store_impl;
pub mod widget;

pub use backend::DuckDbBackend;

/// Re-export the `duckdb` crate so consumers (especially tests) can use
/// `prooflet_duckdb::duckdb::params!` without an extra dependency.
pub use duckdb;
