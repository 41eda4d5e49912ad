//! CRUD collaborator
//!
//! The change log never owns domain objects. It reads prior state and
//! related objects through [`ObjectStore`], and the engine's save/delete
//! wrappers write through it.

pub mod memory_store;
pub mod object_store;

pub use memory_store::MemoryObjectStore;
pub use object_store::{ObjectStore, RecordFilter};
