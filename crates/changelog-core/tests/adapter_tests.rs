#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use changelog_core::{
    AdapterValue, ChangeLogAdapter, ChangeLogConfig, ChangeLogError, ChangePayload, ColumnType,
    FieldChange, LogEntry, OperationKind,
};
use serde_json::json;

fn update_payload() -> ChangePayload {
    ChangePayload::Update {
        changes: vec![
            FieldChange::new("title", "Dune", "Dune Messiah"),
            FieldChange::new("author_id", 1, 2),
        ]
        .into(),
    }
}

fn adapter(payload: &ChangePayload) -> ChangeLogAdapter {
    ChangeLogAdapter::from_entry(
        common::book_entry("1", payload),
        common::render_env(ChangeLogConfig::default()),
    )
    .unwrap()
}

#[test]
fn test_update_view_exposes_changes_in_order() {
    let adapter = adapter(&update_payload());
    assert_eq!(adapter.operation(), OperationKind::Update);
    assert_eq!(adapter.keys().unwrap(), vec!["title", "author_id"]);
    assert_eq!(adapter.len(), 2);

    let AdapterValue::Change(change) = adapter.get("title").unwrap() else {
        panic!("expected a field change");
    };
    assert_eq!(change.new_value, json!("Dune Messiah"));
}

#[test]
fn test_registry_fills_column_metadata() {
    let adapter = adapter(&update_payload());
    let changes = adapter.changes().unwrap();
    assert_eq!(changes[0].column_type, ColumnType::Text);
    assert!(changes[1].foreign_key);
}

#[test]
fn test_missing_key_is_not_found() {
    let adapter = adapter(&update_payload());
    assert_eq!(
        adapter.get("isbn"),
        Err(ChangeLogError::ChangeNotFound {
            key: "isbn".to_string()
        })
    );
    assert!(!adapter.contains_key("isbn"));
}

#[test]
fn test_view_is_read_only() {
    let adapter = adapter(&update_payload());
    assert!(matches!(
        adapter.set("title", json!("x")),
        Err(ChangeLogError::ImmutableView { ref action, .. }) if action == "update"
    ));
    assert!(matches!(
        adapter.unset("title"),
        Err(ChangeLogError::ImmutableView { ref action, .. }) if action == "unset"
    ));
    assert_eq!(adapter.len(), 2);
}

#[test]
fn test_insertion_and_deletion_views_are_empty() {
    for payload in [ChangePayload::Insertion, ChangePayload::Deletion] {
        let adapter = adapter(&payload);
        assert!(adapter.is_empty());
        assert!(adapter.get("message").is_err());
    }
}

#[test]
fn test_custom_message_view() {
    let adapter = adapter(&ChangePayload::CustomMessage {
        message: "Cover replaced".to_string(),
    });
    assert_eq!(adapter.keys().unwrap(), vec!["message"]);
    assert_eq!(
        adapter.get("message").unwrap(),
        AdapterValue::Message("Cover replaced")
    );
    assert_eq!(adapter.render_operation_type(), "Cover replaced");
}

#[test]
fn test_unknown_operation_code_is_rejected() {
    let entry = LogEntry::restore(5, 99, "Book".into(), "1".into(), "cli".into(), 0, "{}".into());
    let err = ChangeLogAdapter::from_entry(entry, common::render_env(ChangeLogConfig::default()))
        .unwrap_err();
    assert_eq!(err, ChangeLogError::UnsupportedOperation { code: 99 });
}

#[test]
fn test_payload_of_another_operation_is_invalid() {
    let deletion = ChangePayload::Deletion.encode().unwrap();
    let entry = LogEntry::restore(
        5,
        OperationKind::Update.code(),
        "Book".into(),
        "1".into(),
        "cli".into(),
        0,
        deletion,
    );
    let adapter =
        ChangeLogAdapter::from_entry(entry, common::render_env(ChangeLogConfig::default()))
            .unwrap();
    assert!(matches!(
        adapter.changes(),
        Err(ChangeLogError::InvalidPayload { .. })
    ));
    assert_eq!(adapter.len(), 0);
}

#[test]
fn test_legacy_update_entry_is_readable() {
    let legacy = json!({
        "changes": {
            "title": { "field": "title", "old": "Dune", "new": "Dune II", "type": "VARCHAR" }
        }
    })
    .to_string();
    let entry = LogEntry::restore(
        3,
        OperationKind::Update.code(),
        "Book".into(),
        "1".into(),
        "cli".into(),
        0,
        legacy,
    );
    let adapter =
        ChangeLogAdapter::from_entry(entry, common::render_env(ChangeLogConfig::default()))
            .unwrap();
    let AdapterValue::Change(change) = adapter.get("title").unwrap() else {
        panic!("expected a field change");
    };
    assert_eq!(change.old_value, json!("Dune"));
    assert_eq!(change.raw_new, json!("Dune II"));
}
