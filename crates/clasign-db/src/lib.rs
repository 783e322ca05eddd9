//! CLA signing database layer: SurrealDB connection management,
//! schema migrations and repository implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - SurrealDB implementations of the `clasign-core` repository traits

mod connection;
mod error;
mod query;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbCredentials, DbManager};
pub use error::DbError;
pub use query::DEFAULT_QUERY_TIMEOUT;
pub use schema::run_migrations;
