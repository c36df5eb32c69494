//! PathLab Database — SurrealDB connection management and repository
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Repository implementations for the `pathlab-core` traits
//! - Error types ([`DbError`])
//!
//! Every mutating repository operation commits its audit entry in the
//! same transaction as the domain write, so the audit trail and the
//! domain state can never diverge.

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};
