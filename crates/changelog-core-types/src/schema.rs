//! Names shared by every structured log line
//!
//! The logging macros emit these field names literally; the capture layer
//! and log consumers look them up through these constants.

/// Fields present on every lifecycle event
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";

/// Present on end and error events
pub const FIELD_DURATION_MS: &str = "duration_ms";

/// Present on error events
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Optional context attached by callers
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_CLASS_NAME: &str = "class_name";
pub const FIELD_ENTRY_ID: &str = "entry_id";
pub const FIELD_ENTRY_COUNT: &str = "entry_count";

pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

/// Events that close an operation
pub const TERMINAL_EVENTS: [&str; 2] = [EVENT_END, EVENT_END_ERROR];
