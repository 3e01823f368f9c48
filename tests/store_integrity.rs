//! Store Integrity Tests
//!
//! The store's core safety invariant: nothing durable ever diverges from
//! schema. Plus the CRUD contract around it:
//! - create defaults every unsupplied field and assigns an identifier
//! - find_one_and_update is clone, mutate, diff, repair, persist
//! - save refuses divergent records fatally
//! - one unparseable record never aborts a scan
//! - writes go through a temp file and leave no debris

use std::collections::BTreeMap;
use std::fs;

use menddb::schema::{Schema, SchemaNode, ID_FIELD};
use menddb::store::Store;
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn player_schema() -> Schema {
    let mut fields = BTreeMap::new();
    fields.insert(ID_FIELD.into(), SchemaNode::string("").locked());
    fields.insert("name".into(), SchemaNode::string(""));
    fields.insert("health".into(), SchemaNode::number(100));
    fields.insert("perks".into(), SchemaNode::array(SchemaNode::string("")));
    fields.insert("inventory".into(), SchemaNode::map(SchemaNode::number(0)));
    Schema::new("players", fields)
}

fn open_store(tmp: &TempDir) -> Store {
    Store::open(tmp.path().join("players"), player_schema()).unwrap()
}

// =============================================================================
// Create
// =============================================================================

#[test]
fn test_create_returns_full_record() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    let record = store.create(json!({"name": "Rex"})).unwrap();
    assert_eq!(record["name"], json!("Rex"));
    assert_eq!(record["health"], json!(100));
    assert_eq!(record["perks"], json!([]));
    assert_eq!(record["inventory"], json!({}));

    let id = record[ID_FIELD].as_str().unwrap();
    assert!(!id.is_empty());
    assert!(tmp.path().join("players").join(format!("{}.json", id)).exists());
}

#[test]
fn test_create_identifiers_unique() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    let a = store.create(json!({})).unwrap();
    let b = store.create(json!({})).unwrap();
    assert_ne!(a[ID_FIELD], b[ID_FIELD]);
    assert_eq!(store.all().unwrap().len(), 2);
}

#[test]
fn test_create_from_non_object_partial() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    // A non-object partial is treated as an empty record.
    let record = store.create(json!("garbage")).unwrap();
    assert_eq!(record["name"], json!(""));
    assert_eq!(record["health"], json!(100));
}

// =============================================================================
// Update
// =============================================================================

#[test]
fn test_update_then_read_matches_repaired_mutation() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    let created = store.create(json!({"name": "Rex"})).unwrap();
    let pre = store.find_one(|r| r[ID_FIELD] == created[ID_FIELD]).unwrap();

    let mutate = |r: &mut Value| {
        r["health"] = json!(42);
        r["perks"].as_array_mut().unwrap().push(json!("swift"));
        r["stray"] = json!(true);
    };

    let updated = store
        .find_one_and_update(|r| r[ID_FIELD] == created[ID_FIELD], mutate)
        .unwrap();

    // The persisted result equals repair(mutate(pre-update value)).
    let mut expected = pre.clone();
    mutate(&mut expected);
    let expected = store.schema().conform(&expected);
    assert_eq!(updated, expected);

    let read_back = store.find_one(|r| r[ID_FIELD] == created[ID_FIELD]).unwrap();
    assert_eq!(read_back, updated);
    assert!(read_back.get("stray").is_none());
}

#[test]
fn test_update_not_found() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    let result = store.find_one_and_update(|_| false, |r| r["health"] = json!(1));
    assert!(result.unwrap_err().is_not_found());
}

#[test]
fn test_overlapping_updates_last_save_wins() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    store.create(json!({"name": "Rex"})).unwrap();

    // Sequential read-modify-write cycles compose; a truly concurrent
    // pair would leave only the later save, which is the caller's
    // problem to serialize.
    store
        .find_one_and_update(|r| r["name"] == "Rex", |r| r["health"] = json!(10))
        .unwrap();
    store
        .find_one_and_update(|r| r["name"] == "Rex", |r| {
            r["inventory"]["apple"] = json!(1)
        })
        .unwrap();

    let record = store.find_one(|r| r["name"] == "Rex").unwrap();
    assert_eq!(record["inventory"]["apple"], json!(1));
    // The second update was applied on top of the first's committed state.
    assert_eq!(record["health"], json!(10));
}

// =============================================================================
// Delete
// =============================================================================

#[test]
fn test_delete_then_find_returns_empty() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    store.create(json!({"name": "Rex"})).unwrap();
    store.create(json!({"name": "Mia"})).unwrap();

    store.find_one_and_delete(|r| r["name"] == "Rex").unwrap();

    assert!(store.find(|r| r["name"] == "Rex").unwrap().is_empty());
    assert_eq!(store.all().unwrap().len(), 1);
}

#[test]
fn test_delete_not_found() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    let err = store.find_one_and_delete(|_| true).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.code().code(), "MEND_NOT_FOUND");
}

// =============================================================================
// Save Guard
// =============================================================================

#[test]
fn test_save_rejects_type_divergence() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    let mut record = store.create(json!({"name": "Rex"})).unwrap();
    record["health"] = json!("55");

    let err = store.save(&record).unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(err.code().code(), "MEND_SCHEMA_VIOLATION");
    let divergence = err.divergence().unwrap();
    assert_eq!(divergence.field, "health");

    // Nothing was persisted.
    let read_back = store.find_one(|r| r["name"] == "Rex").unwrap();
    assert_eq!(read_back["health"], json!(100));
}

#[test]
fn test_save_rejects_undeclared_field() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    let mut record = store.create(json!({"name": "Rex"})).unwrap();
    record["mana"] = json!(30);

    assert!(store.save(&record).unwrap_err().is_fatal());
}

#[test]
fn test_save_accepts_conformant_record() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    let mut record = store.create(json!({"name": "Rex"})).unwrap();
    record["health"] = json!(55);
    store.save(&record).unwrap();

    let read_back = store.find_one(|r| r["name"] == "Rex").unwrap();
    assert_eq!(read_back["health"], json!(55));
}

// =============================================================================
// Scan Isolation and Write Hygiene
// =============================================================================

#[test]
fn test_corrupt_record_does_not_abort_scan() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    store.create(json!({"name": "Rex"})).unwrap();
    store.create(json!({"name": "Mia"})).unwrap();
    fs::write(store.dir().join("zz-broken.json"), "\"un终").unwrap();

    let all = store.all().unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn test_no_temp_debris_after_writes() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    for i in 0..10 {
        store.create(json!({"name": format!("p{}", i)})).unwrap();
    }
    store
        .find_one_and_update(|r| r["name"] == "p3", |r| r["health"] = json!(1))
        .unwrap();

    let debris: Vec<_> = fs::read_dir(store.dir())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect();
    assert!(debris.is_empty(), "leftover temp files: {:?}", debris);
}

#[test]
fn test_reopen_sees_same_records() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("players");

    {
        let store = Store::open(&dir, player_schema()).unwrap();
        store.create(json!({"name": "Rex"})).unwrap();
    }

    let store = Store::open(&dir, player_schema()).unwrap();
    let record = store.find_one(|r| r["name"] == "Rex").unwrap();
    assert_eq!(record["health"], json!(100));
}
