//! Lifecycle logging macros
//!
//! An operation logs `start` when it begins and exactly one of `end` or
//! `end_error` when it returns. All three expand through `__log_op_event!`, so the
//! canonical fields are spelled in one place.

#[doc(hidden)]
#[macro_export]
macro_rules! __log_op_event {
    ($level:ident, $op:expr, $event:ident $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::$event
            $(, $($field)*)?
        )
    };
}

/// Log the start of an operation
///
/// ```
/// # use changelog_core::log_op_start;
/// log_op_start!("get_change_log");
/// log_op_start!("get_change_log", class_name = "Book", object_pk = "1");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__log_op_event!(info, $op, EVENT_START $(, $($field)*)?)
    };
}

/// Log the successful end of an operation; `duration_ms` is required
///
/// ```
/// # use changelog_core::log_op_end;
/// log_op_end!("get_change_log", duration_ms = 42);
/// log_op_end!("get_change_log", duration_ms = 42, entry_count = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__log_op_event!(info, $op, EVENT_END, duration_ms = $duration $(, $($field)*)?)
    };
}

/// Log the failure of an operation
///
/// The error may be anything convertible into
/// [`ExError`](crate::errors::ExError); its kind, code and message are
/// logged.
///
/// ```
/// # use changelog_core::{log_op_error, errors::ChangeLogError};
/// let err = ChangeLogError::UnknownClass { class_name: "Book".to_string() };
/// log_op_error!("get_change_log", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__log_op_event!(
            error,
            $op,
            EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            err_message = ex_err.message()
            $(, $($field)*)?
        )
    }};
}
