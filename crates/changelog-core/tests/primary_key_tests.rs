#![allow(clippy::unwrap_used, clippy::expect_used)]

use changelog_core::{ExErrorKind, ExError, NormalizedPk, PrimaryKey};
use proptest::prelude::*;

#[test]
fn test_composite_key_joins_with_dash() {
    let pk = PrimaryKey::composite(["12", "7"]);
    assert_eq!(pk.normalize().unwrap().as_str(), "12-7");
}

#[test]
fn test_uuid_single_key_is_not_split() {
    let uuid = "0190f1a4-7c1e-7b3a-9d2f-3c4b5a6d7e8f";
    let normalized = PrimaryKey::single(uuid).normalize().unwrap();
    assert_eq!(normalized.as_str(), uuid);
    assert_eq!(
        PrimaryKey::from_normalized(&normalized, 1),
        PrimaryKey::single(uuid)
    );
}

#[test]
fn test_component_containing_separator_is_rejected() {
    let err: ExError = PrimaryKey::composite(["a-b", "c"])
        .normalize()
        .unwrap_err()
        .into();
    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
}

#[test]
fn test_denormalize_without_schema() {
    assert_eq!(
        NormalizedPk::from("3-4").denormalize(),
        PrimaryKey::composite(["3", "4"])
    );
    assert_eq!(NormalizedPk::from("3").denormalize(), PrimaryKey::single("3"));
}

proptest! {
    #[test]
    fn prop_composite_keys_round_trip(parts in prop::collection::vec("[a-zA-Z0-9_]{1,8}", 2..5)) {
        let pk = PrimaryKey::composite(parts.clone());
        let normalized = pk.normalize().unwrap();
        prop_assert_eq!(PrimaryKey::from_normalized(&normalized, parts.len()), pk);
    }

    #[test]
    fn prop_single_keys_round_trip(value in "[ -~]{1,40}") {
        let pk = PrimaryKey::single(value.clone());
        let normalized = pk.normalize().unwrap();
        prop_assert_eq!(normalized.as_str(), value.as_str());
        prop_assert_eq!(PrimaryKey::from_normalized(&normalized, 1), pk);
    }
}
