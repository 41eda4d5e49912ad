//! Repository layer persisting log entries to SQLite

pub mod sqlite_repo;

pub use sqlite_repo::SqliteLogRepo;
