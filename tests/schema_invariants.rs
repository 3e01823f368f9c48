//! Schema Invariant Tests
//!
//! Properties the repair engine guarantees:
//! - Idempotence: a conformant value passes through unchanged
//! - Convergence: any input comes out satisfying every schema rule
//! - Defaults fill absent fields; type mismatches reset to defaults
//! - Undeclared fields are garbage-collected
//! - Locked fields are never reset while present

use std::collections::BTreeMap;

use menddb::schema::{conform, Schema, SchemaNode, ID_FIELD};
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn game_schema() -> Schema {
    let mut pet = BTreeMap::new();
    pet.insert("name".into(), SchemaNode::string("unnamed"));
    pet.insert("level".into(), SchemaNode::number(1));
    pet.insert("perks".into(), SchemaNode::array(SchemaNode::string("")));

    let mut fields = BTreeMap::new();
    fields.insert(ID_FIELD.into(), SchemaNode::string("").locked());
    fields.insert("name".into(), SchemaNode::string(""));
    fields.insert("health".into(), SchemaNode::number(100));
    fields.insert("title".into(), SchemaNode::nullable_string());
    fields.insert("last_seen".into(), SchemaNode::nullable_number());
    fields.insert("joined_from".into(), SchemaNode::string_or_number(json!(0)));
    fields.insert("banned".into(), SchemaNode::bool(false));
    fields.insert(
        "inventory".into(),
        SchemaNode::map(SchemaNode::number(0)),
    );
    fields.insert("pets".into(), SchemaNode::array(SchemaNode::object(pet)));
    Schema::new("players", fields)
}

fn conformant_record() -> Value {
    json!({
        "_id": "p-1",
        "name": "Ada",
        "health": 73,
        "title": null,
        "last_seen": 1700000000,
        "joined_from": "invite",
        "banned": false,
        "inventory": {"apple": 3, "sword": 1},
        "pets": [
            {"name": "Rex", "level": 4, "perks": ["fast"]},
            {"name": "Mia", "level": 2, "perks": []}
        ]
    })
}

// =============================================================================
// Idempotence
// =============================================================================

/// A conformant record passes through repair byte-for-byte.
#[test]
fn test_conformant_record_unchanged() {
    let schema = game_schema();
    let record = conformant_record();
    assert_eq!(schema.conform(&record), record);
}

/// Repairing twice is the same as repairing once, whatever the input.
#[test]
fn test_repair_is_idempotent_on_garbage() {
    let schema = game_schema();
    let inputs = [
        json!(null),
        json!("a string"),
        json!(17),
        json!([{"_id": "not-a-record"}]),
        json!({"health": [], "inventory": 3, "pets": {"a": 1}}),
    ];
    for input in &inputs {
        let once = schema.conform(input);
        assert_eq!(once, schema.conform(&once), "input: {}", input);
    }
}

// =============================================================================
// Convergence
// =============================================================================

/// Whatever goes in, every declared field comes out with its declared
/// runtime type.
#[test]
fn test_any_input_converges_to_schema_shape() {
    let schema = game_schema();
    let out = schema.conform(&json!({
        "name": 12,
        "health": "full",
        "banned": "yes",
        "inventory": {"apple": "three"},
        "pets": [null, {"level": "nine"}, "stray"]
    }));

    assert!(out["name"].is_string());
    assert!(out["health"].is_number());
    assert!(out["banned"].is_boolean());
    assert_eq!(out["inventory"], json!({"apple": 0}));

    // Array length preserved, every element repaired to the pet shape.
    let pets = out["pets"].as_array().unwrap();
    assert_eq!(pets.len(), 3);
    for pet in pets {
        assert!(pet["name"].is_string());
        assert!(pet["level"].is_number());
        assert!(pet["perks"].is_array());
    }
    assert_eq!(pets[1]["level"], json!(1));
}

/// Nullable leaves keep null, non-nullable ones reset it.
#[test]
fn test_null_handling_per_kind() {
    let schema = game_schema();
    let out = schema.conform(&json!({
        "name": null,
        "title": null,
        "last_seen": null
    }));
    assert_eq!(out["name"], json!(""));
    assert_eq!(out["title"], Value::Null);
    assert_eq!(out["last_seen"], Value::Null);
}

// =============================================================================
// Defaults and Type Mismatches
// =============================================================================

/// Absent fields appear with their declared defaults.
#[test]
fn test_defaults_fill_missing_fields() {
    let schema = game_schema();
    let out = schema.conform(&json!({"name": "Rex"}));
    assert_eq!(out["health"], json!(100));
    assert_eq!(out["banned"], json!(false));
    assert_eq!(out["inventory"], json!({}));
    assert_eq!(out["pets"], json!([]));
}

/// A stringified number is a type error and resets to the default,
/// it is never parsed back.
#[test]
fn test_stringified_number_not_salvaged() {
    let schema = game_schema();
    let out = schema.conform(&json!({"health": "55"}));
    assert_eq!(out["health"], json!(100));
}

/// string-or-number accepts either representation.
#[test]
fn test_string_or_number_field() {
    let schema = game_schema();
    assert_eq!(
        schema.conform(&json!({"joined_from": "invite"}))["joined_from"],
        json!("invite")
    );
    assert_eq!(
        schema.conform(&json!({"joined_from": 42}))["joined_from"],
        json!(42)
    );
    assert_eq!(
        schema.conform(&json!({"joined_from": [1]}))["joined_from"],
        json!(0)
    );
}

// =============================================================================
// Garbage Collection
// =============================================================================

/// Fields from an earlier schema version disappear, at any depth.
#[test]
fn test_undeclared_fields_removed() {
    let schema = game_schema();
    let out = schema.conform(&json!({
        "name": "Rex",
        "mana": 50,
        "pets": [{"name": "Mia", "species": "cat"}]
    }));
    assert!(out.get("mana").is_none());
    assert!(out["pets"][0].get("species").is_none());
}

/// Map keys are caller data, never garbage-collected.
#[test]
fn test_map_keys_survive() {
    let schema = game_schema();
    let out = schema.conform(&json!({"inventory": {"weird key ü": 9}}));
    assert_eq!(out["inventory"]["weird key ü"], json!(9));
}

// =============================================================================
// Locked Fields
// =============================================================================

/// A locked field present with any value is untouched.
#[test]
fn test_locked_field_kept() {
    let schema = game_schema();
    let out = schema.conform(&json!({"_id": "p-42"}));
    assert_eq!(out[ID_FIELD], json!("p-42"));
}

/// A locked field absent is filled from its default.
#[test]
fn test_locked_field_filled_when_absent() {
    let schema = game_schema();
    let out = schema.conform(&json!({"name": "Rex"}));
    assert_eq!(out[ID_FIELD], json!(""));
}

/// Locking applies to composites too.
#[test]
fn test_locked_composite_untouched() {
    let node = SchemaNode::array(SchemaNode::number(0)).locked();
    let input = json!(["anything", {"goes": true}]);
    assert_eq!(conform(Some(&input), &node), input);
}
