//! Change Log Engine - Orchestration layer
//!
//! Wires the diff engine and the log repository into an object store's
//! save and delete sequence, and exposes the retrieval API that turns
//! stored entries into adapters.

pub mod api;
pub mod behavior;
pub mod session;

pub use behavior::{ChangeLogBehavior, SaveDecision};
pub use session::ChangeLogSession;
