//! Types shared by every change log crate
//!
//! - [`correlation`]: request ids and the acting user of a request
//! - [`schema`]: field and event names of structured log lines

pub mod correlation;
pub mod schema;

pub use correlation::{RequestContext, RequestId};
