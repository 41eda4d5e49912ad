#![allow(clippy::unwrap_used, clippy::expect_used)]

use changelog_core::errors::{ChangeLogError, ExErrorKind};
use changelog_core::logging_facility::test_capture::init_test_capture;
use changelog_core::{log_op_end, log_op_error, log_op_start};
use changelog_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};

#[test]
fn test_log_op_start_carries_fields() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name, class_name = "Book", object_pk = "1");

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_START));
    assert_eq!(events[0].field("class_name"), Some("Book"));
    assert_eq!(events[0].field("object_pk"), Some("1"));
}

#[test]
fn test_log_op_end_records_duration() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42, entry_count = 3);

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 1, "Should have exactly one end event");
    assert_eq!(events[0].event.as_deref(), Some(EVENT_END));
    assert_eq!(events[0].field("duration_ms"), Some("42"));
    assert_eq!(events[0].field("entry_count"), Some("3"));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = ChangeLogError::UnknownClass {
        class_name: "Magazine".to_string(),
    };
    log_op_error!(op_name, err, duration_ms = 10);

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.event.as_deref(), Some(EVENT_END_ERROR));
    assert_eq!(event.level, tracing::Level::ERROR);
    assert_eq!(event.field("err_code"), Some(ExErrorKind::UnknownClass.code()));
}

#[test]
fn test_start_and_end_pair_up() {
    let capture = init_test_capture();
    let op_name = "test_pairing_unique_4";

    log_op_start!(op_name);
    log_op_end!(op_name, duration_ms = 0);

    capture.assert_event_exists(op_name, EVENT_START);
    capture.assert_event_exists(op_name, EVENT_END);
    assert_eq!(
        capture.count_events(|e| e.op.as_deref() == Some(op_name)),
        2
    );
}
