#![allow(clippy::unwrap_used, clippy::expect_used)]

use changelog_core::errors::{ChangeLogError, ExError, ExErrorKind};

#[test]
fn test_domain_errors_map_to_kinds() {
    let cases = [
        (
            ChangeLogError::NonScalarMessage {
                value_type: "array".to_string(),
            },
            ExErrorKind::NonScalarMessage,
        ),
        (
            ChangeLogError::ChangeNotFound {
                key: "title".to_string(),
            },
            ExErrorKind::NotFound,
        ),
        (
            ChangeLogError::ObjectStore {
                message: "disk full".to_string(),
            },
            ExErrorKind::Persistence,
        ),
        (
            ChangeLogError::Io {
                path: "changelog.toml".to_string(),
                message: "permission denied".to_string(),
            },
            ExErrorKind::Io,
        ),
        (
            ChangeLogError::UnsupportedPayloadVersion { version: 9 },
            ExErrorKind::UnsupportedPayloadVersion,
        ),
    ];
    for (err, kind) in cases {
        let ex: ExError = err.into();
        assert_eq!(ex.kind(), kind);
        assert_eq!(ex.code(), kind.code());
        assert!(!ex.message().is_empty());
    }
}

#[test]
fn test_usage_errors_are_flagged() {
    assert!(ExErrorKind::CompositeKeyUnsupported.is_usage_error());
    assert!(ExErrorKind::MissingPrimaryKey.is_usage_error());
    assert!(!ExErrorKind::Persistence.is_usage_error());
    assert!(!ExErrorKind::ImmutableView.is_usage_error());
}

#[test]
fn test_display_includes_context() {
    let err = ExError::new(ExErrorKind::NotFound)
        .with_op("update")
        .with_entity_id("Book#1")
        .with_message("record was never stored");
    let text = err.to_string();
    assert!(text.starts_with("[ERR_NOT_FOUND]"));
    assert!(text.contains("update"));
    assert!(text.contains("Book#1"));
}
