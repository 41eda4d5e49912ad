//! Schema migrations for the log database
//!
//! Migrations are compiled into the binary and applied in id order. Each
//! applied id is recorded with a checksum of its SQL; a recorded id this
//! build does not know, or a checksum that no longer matches, stops the
//! store from opening.

mod checksums;
mod embedded;
mod runner;

pub use runner::{applied_migrations, apply_migrations};
