//! Type coercion / repair engine
//!
//! `conform` takes any value and a schema node and returns a value that
//! satisfies the node. It never fails: wherever the input diverges it
//! substitutes defaults instead of raising.
//!
//! Repair rules:
//! - A locked node with a present value is returned untouched; locked
//!   fields are filled in only when absent.
//! - A missing value becomes the node's default (empty array, empty map,
//!   recursively defaulted object, declared leaf default).
//! - A leaf holding the wrong runtime type is reset to its default; type
//!   errors are never partially repaired.
//! - A malformed composite container is reset to empty before any attempt
//!   to repair its children.
//! - Arrays keep their length; every element is coerced in place.
//! - Maps keep their key set; every value is coerced.
//! - Objects gain missing declared children and lose undeclared keys.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::errors::Divergence;
use super::types::SchemaNode;

/// Forces a value into conformance with a schema node.
///
/// `value` is `None` when the field is absent from its parent.
pub fn conform(value: Option<&Value>, node: &SchemaNode) -> Value {
    if let Some(present) = value {
        if node.is_locked() {
            return present.clone();
        }
    }

    match node {
        SchemaNode::Leaf { kind, default, .. } => match value {
            Some(v) if kind.accepts(v) => v.clone(),
            _ => default.clone(),
        },
        SchemaNode::Array { element, .. } => match value.and_then(Value::as_array) {
            Some(items) => Value::Array(
                items
                    .iter()
                    .map(|item| conform(Some(item), element))
                    .collect(),
            ),
            None => Value::Array(Vec::new()),
        },
        SchemaNode::Map { value: entry, .. } => match value.and_then(Value::as_object) {
            Some(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, v)| (key.clone(), conform(Some(v), entry)))
                    .collect(),
            ),
            None => Value::Object(Map::new()),
        },
        SchemaNode::Object { children, .. } => conform_object(value, children),
    }
}

/// Forces a value into conformance with a declared child set.
///
/// Declared children are coerced recursively (adding missing ones); keys
/// absent from the declaration are dropped.
pub fn conform_object(value: Option<&Value>, children: &BTreeMap<String, SchemaNode>) -> Value {
    let existing = value.and_then(Value::as_object);
    let mut out = Map::new();
    for (name, child) in children {
        let field = existing.and_then(|obj| obj.get(name));
        out.insert(name.clone(), conform(field, child));
    }
    Value::Object(out)
}

/// Reports the first path at which two values differ.
///
/// Used to explain why a record failed the save conformance check:
/// `expected` is what the schema repaired the field to, `actual` what the
/// caller supplied.
pub fn first_divergence(before: &Value, after: &Value) -> Option<Divergence> {
    walk_divergence(before, after, "")
}

fn walk_divergence(before: &Value, after: &Value, path: &str) -> Option<Divergence> {
    match (before, after) {
        (Value::Object(b), Value::Object(a)) => {
            let mut keys: Vec<&String> = b.keys().chain(a.keys()).collect();
            keys.sort();
            keys.dedup();
            for key in keys {
                let child_path = join_path(path, key);
                match (b.get(key), a.get(key)) {
                    (Some(bv), Some(av)) => {
                        if let Some(d) = walk_divergence(bv, av, &child_path) {
                            return Some(d);
                        }
                    }
                    (Some(bv), None) => {
                        return Some(Divergence::new(child_path, "(absent)", bv.to_string()))
                    }
                    (None, Some(av)) => {
                        return Some(Divergence::new(child_path, av.to_string(), "(absent)"))
                    }
                    (None, None) => unreachable!(),
                }
            }
            None
        }
        (Value::Array(b), Value::Array(a)) => {
            if b.len() != a.len() {
                return Some(Divergence::new(
                    path,
                    format!("{} elements", a.len()),
                    format!("{} elements", b.len()),
                ));
            }
            for (i, (bv, av)) in b.iter().zip(a.iter()).enumerate() {
                let child_path = format!("{}[{}]", path, i);
                if let Some(d) = walk_divergence(bv, av, &child_path) {
                    return Some(d);
                }
            }
            None
        }
        (b, a) => {
            if b == a {
                None
            } else {
                Some(Divergence::new(path, a.to_string(), b.to_string()))
            }
        }
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}
