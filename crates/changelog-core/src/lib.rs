//! Change Log Core - change capture, diffing and rendering
//!
//! This crate provides the in-process half of the change log:
//! - Log entry model with versioned change payloads
//! - Field-level diffing of a record against its stored snapshot
//! - Read-only adapters interpreting each logged operation
//! - Pluggable formatters turning entries into text
//! - Related-object history across foreign keys and association tables
//!
//! Persistence lives in `changelog-store`; hook orchestration lives in
//! `changelog-engine`.

pub mod adapter;
pub mod config;
pub mod diff;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod queries;
pub mod render;
pub mod schema;

// Macros expand to paths under `$crate::core_types`
#[doc(hidden)]
pub use changelog_core_types as core_types;

// Re-export commonly used types
pub use adapter::{AdapterValue, ChangeLogAdapter, RenderEnv};
pub use config::{ChangeLogConfig, EmptyUpdatePolicy};
pub use diff::DiffEngine;
pub use errors::{ChangeLogError, ExError, ExErrorKind, Result};
pub use model::{
    ChangePayload, ChangeSet, ChangeType, FieldChange, InstanceId, LogEntry, NormalizedPk,
    OperationKind, PrimaryKey, Record,
};
pub use ops::{MemoryObjectStore, ObjectStore, RecordFilter};
pub use queries::{ChangeLogRepository, LogCriteria, LogOrder};
pub use schema::{ColumnType, SchemaRegistry, TableDescriptor};
