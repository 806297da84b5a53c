//! Core library for the Librarium book catalog: domain types and
//! validation, the Postgres persistence layer, the book query contract, and
//! the idempotent genre import service.

pub mod api_types;
pub mod catalog;
pub mod database;
pub mod error;
pub mod import;
pub mod query;

pub use error::{CatalogError, Result};

/// Embedded schema migrations, shared with `#[sqlx::test]` harnesses.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
