//! HTTP layer for the Librarium book catalog.

pub mod catalog;
pub mod errors;
pub mod infra;
pub mod routes;
