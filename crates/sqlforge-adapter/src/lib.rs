//! Database adapters for model execution
//!
//! This crate handles:
//! - The adapter trait the runner executes rendered statements through
//! - A scriptable in-memory mock adapter for tests and dry runs
//! - A PostgreSQL adapter (behind the `postgres` feature)
//! - Resolving a target configuration to a concrete adapter

pub mod adapter;
pub mod mock;
pub mod postgres;

pub use adapter::{for_target, AdapterError, DatabaseAdapter};
pub use mock::MockAdapter;
pub use postgres::PostgresAdapter;
