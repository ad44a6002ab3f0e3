//! SmartOps storage crate - SQLite persistence for the operation log.
//!
//! Provides a WAL-mode SQLite database with migrations and the append-only
//! `operations` repository backing command history.

pub mod db;
pub mod migrations;
pub mod operations;

pub use db::Database;
pub use operations::{NewOperation, OperationLog, OperationRow};
