//! Change Log Store - SQLite persistence for log entries
//!
//! Provides:
//! - Connection helpers
//! - Embedded migrations with checksums
//! - `SqliteLogRepo`, the SQLite implementation of `ChangeLogRepository`

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

// Re-export key types
pub use errors::Result;
pub use repo::SqliteLogRepo;
