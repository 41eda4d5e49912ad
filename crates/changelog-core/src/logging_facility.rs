//! Structured logging
//!
//! [`init`] installs the process subscriber once, picking human-readable or
//! JSON output by [`Profile`]. Operations report their lifecycle through
//! `log_op_start!`, `log_op_end!` and `log_op_error!`; tests read those
//! events back through [`init_test_capture`].
//!
//! ```rust
//! use changelog_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
