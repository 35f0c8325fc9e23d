//! Integration tests for capability slicing.
//!
//! These tests verify that slicing options loaded from configuration hide
//! models, operations, procedures and filter kinds, and that hidden models
//! disappear from every validator that could reach them.

mod common;

use gatekeep::query::config::{ALL_KEY, FieldSlicing, FilterKind, FilterKinds, ModelSlicing, SlicingOptions};
use gatekeep::query::{ClientOptions, ErrorCode, Operation, SlicingPolicy};
use pretty_assertions::assert_eq;
use serde_json::json;

use common::validator;

/// Field-level inclusion wins outright over a model-wide exclusion
#[test]
fn test_field_entry_wins_over_all_entry() {
    let slicing = SlicingOptions::default().model(
        "User",
        ModelSlicing::default()
            .field("name", FieldSlicing::default().include([FilterKind::Equality]))
            .field(ALL_KEY, FieldSlicing::default().exclude([FilterKind::Range])),
    );
    let policy = SlicingPolicy::new(&slicing);

    let expected: FilterKinds = [FilterKind::Equality].into_iter().collect();
    assert_eq!(policy.filter_kinds("User", "name").allowed(), expected);
    assert!(!policy.filter_kinds("User", "age").allowed().contains(FilterKind::Range));
    assert_eq!(policy.filter_kinds("Post", "title").allowed(), FilterKinds::ALL);
}

/// Restricted filter kinds change what `where` accepts
#[test]
fn test_filter_kinds_shape_where() {
    let options = ClientOptions::default().with_slicing(SlicingOptions::default().model(
        "User",
        ModelSlicing::default().field("name", FieldSlicing::default().include([FilterKind::Equality])),
    ));
    let v = validator(options);

    assert!(v.validate_find_many("User", json!({ "where": { "name": { "equals": "Ann" } } })).is_ok());
    assert!(v.validate_find_many("User", json!({ "where": { "name": "Ann" } })).is_ok());
    let err = v
        .validate_find_many("User", json!({ "where": { "name": { "contains": "A" } } }))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
    assert_eq!(err.context.path.as_deref(), Some("where.name"));
}

/// An empty inclusion list allows nothing, reads included
#[test]
fn test_empty_operation_inclusion() {
    let slicing = SlicingOptions::default().model(
        "AuditLog",
        ModelSlicing::default().include_operations(Vec::<Operation>::new()),
    );
    assert!(SlicingPolicy::new(&slicing).allowed_operations("AuditLog").is_empty());

    let v = validator(ClientOptions::default().with_slicing(slicing));
    let err = v.validate_find_many("AuditLog", json!({})).unwrap_err();
    assert_eq!(err.code, ErrorCode::OperationNotAllowed);
    assert!(v.validate_find_many("User", json!({})).is_ok());
}

/// Excluding a model removes relations to it from select and include
#[test]
fn test_model_exclusion_propagates() {
    let v = validator(
        ClientOptions::default().with_slicing(SlicingOptions::default().exclude_models(["Post"])),
    );

    for key in ["include", "select"] {
        let err = v
            .validate_find_many("User", json!({ key: { "posts": true } }))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput, "{key}");
    }
    assert!(v.validate_find_many("User", json!({ "select": { "email": true } })).is_ok());
    assert!(v
        .validate_find_many("User", json!({ "where": { "posts": { "some": {} } } }))
        .is_err());

    let err = v.validate_find_many("Post", json!({})).unwrap_err();
    assert_eq!(err.code, ErrorCode::OperationNotAllowed);
}

/// Slicing loaded from TOML behaves like the builder form
#[test]
fn test_slicing_from_toml() {
    let options = ClientOptions::from_str(
        r#"
        [slicing]
        excludedProcedures = ["search"]

        [slicing.models.Tag]
        excludedOperations = ["deleteMany", "updateMany"]

        [slicing.models."$all".fields."$all"]
        excludedFilterKinds = ["Like"]
        "#,
    )
    .unwrap();
    let v = validator(options);

    let err = v.validate_delete_many("Tag", json!({})).unwrap_err();
    assert_eq!(err.code, ErrorCode::OperationNotAllowed);
    assert!(v.validate_delete("Tag", json!({ "where": { "id": "t1" } })).is_ok());

    assert!(v
        .validate_find_many("Tag", json!({ "where": { "label": { "startsWith": "a" } } }))
        .is_err());
    assert!(v
        .validate_find_many("Tag", json!({ "where": { "weight": { "gte": 2 } } }))
        .is_ok());

    let err = v.validate_procedure("search", json!({})).unwrap_err();
    assert_eq!(err.code, ErrorCode::OperationNotAllowed);
    assert!(v.validate_procedure("ping", json!({})).is_ok());
}
