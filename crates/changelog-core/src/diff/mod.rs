//! Field-level diffing of a record against its stored snapshot.
//!
//! ## Entry point
//!
//! ```ignore
//! use changelog_core::diff::DiffEngine;
//!
//! let engine = DiffEngine::new(config, registry);
//! if let Some(changes) = engine.diff_for_update(&store, &record)? {
//!     // empty `changes` means every modification was ignored or filtered
//! }
//! ```
//!
//! ## Guarantees
//!
//! - **Column order**: changes follow the table's column order.
//! - **Ignored fields**: audit columns and configured fields never appear.
//! - **Temporal columns**: dates and times compare in their configured
//!   display format, so a re-parse of the same instant is not a change.
//! - **Filters last**: registered [`ChangeSetFilter`]s see the computed set
//!   and their output replaces it.

pub mod engine;
pub mod filter;
pub mod temporal;

pub use engine::DiffEngine;
pub use filter::{ChangeSetFilter, ChangeSetFilters};
