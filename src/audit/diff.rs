//! Field-level record diff
//!
//! Computed between the pre- and post-mutation form of a record, before
//! repair runs. Rules:
//!
//! - Recurse into a key whose value is an object that itself contains
//!   nested containers; shallow values are compared wholesale.
//! - Array-valued fields get a multiset difference: elements of the old
//!   array not accounted for in the new one are removed, and vice versa,
//!   so `[a,a,b] -> [a,b,b]` is one `a` removed and one `b` added.
//! - Everything else is compared by stringified representation, emitting a
//!   before/after pair only when they differ.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

/// One field-level change between two versions of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A field's value changed
    Edited {
        path: String,
        before: String,
        after: String,
    },
    /// An array gained an element
    Added { path: String, value: String },
    /// An array lost an element
    Removed { path: String, value: String },
}

impl Change {
    /// Returns the field path this change is anchored at.
    pub fn path(&self) -> &str {
        match self {
            Change::Edited { path, .. } | Change::Added { path, .. } | Change::Removed { path, .. } => {
                path
            }
        }
    }
}

// The audit log renders changes through structured fields; this is the
// human-readable form.
impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Edited {
                path,
                before,
                after,
            } => write!(f, "~ {}: {} -> {}", path, before, after),
            Change::Added { path, value } => write!(f, "+ {}: {}", path, value),
            Change::Removed { path, value } => write!(f, "- {}: {}", path, value),
        }
    }
}

/// Computes the field-level changes between two records.
///
/// Both values are expected to be objects; anything else is compared
/// wholesale under the root path.
pub fn diff_records(before: &Value, after: &Value) -> Vec<Change> {
    let mut changes = Vec::new();
    match (before.as_object(), after.as_object()) {
        (Some(b), Some(a)) => diff_objects("", b, a, &mut changes),
        _ => {
            let b = render(before);
            let a = render(after);
            if b != a {
                changes.push(Change::Edited {
                    path: "$root".into(),
                    before: b,
                    after: a,
                });
            }
        }
    }
    changes
}

fn diff_objects(
    prefix: &str,
    before: &serde_json::Map<String, Value>,
    after: &serde_json::Map<String, Value>,
    changes: &mut Vec<Change>,
) {
    let mut keys: Vec<&String> = before.keys().chain(after.keys()).collect();
    keys.sort();
    keys.dedup();

    for key in keys {
        let path = join_path(prefix, key);
        match (before.get(key), after.get(key)) {
            (Some(b), Some(a)) => diff_values(&path, b, a, changes),
            (Some(b), None) => changes.push(Change::Edited {
                path,
                before: render(b),
                after: "(missing)".into(),
            }),
            (None, Some(a)) => changes.push(Change::Edited {
                path,
                before: "(missing)".into(),
                after: render(a),
            }),
            (None, None) => unreachable!(),
        }
    }
}

fn diff_values(path: &str, before: &Value, after: &Value, changes: &mut Vec<Change>) {
    match (before, after) {
        // Deeper, narrower diffs beat coarse ones, but only where there is
        // actually depth below: an object holding another container.
        (Value::Object(b), Value::Object(a))
            if contains_container(before) || contains_container(after) =>
        {
            diff_objects(path, b, a, changes)
        }
        (Value::Array(b), Value::Array(a)) => diff_array(path, b, a, changes),
        (b, a) => {
            let b = render(b);
            let a = render(a);
            if b != a {
                changes.push(Change::Edited {
                    path: path.to_string(),
                    before: b,
                    after: a,
                });
            }
        }
    }
}

/// Multiset difference over stringified elements, order of emission
/// following the source arrays.
fn diff_array(path: &str, before: &[Value], after: &[Value], changes: &mut Vec<Change>) {
    let mut counts: HashMap<String, i64> = HashMap::new();
    for item in before {
        *counts.entry(render(item)).or_default() += 1;
    }
    for item in after {
        *counts.entry(render(item)).or_default() -= 1;
    }

    let mut removals = counts.clone();
    for item in before {
        let key = render(item);
        if let Some(n) = removals.get_mut(&key) {
            if *n > 0 {
                *n -= 1;
                changes.push(Change::Removed {
                    path: path.to_string(),
                    value: key,
                });
            }
        }
    }

    let mut additions = counts;
    for item in after {
        let key = render(item);
        if let Some(n) = additions.get_mut(&key) {
            if *n < 0 {
                *n += 1;
                changes.push(Change::Added {
                    path: path.to_string(),
                    value: key,
                });
            }
        }
    }
}

/// Whether an object value holds another container directly.
fn contains_container(value: &Value) -> bool {
    value
        .as_object()
        .map(|obj| obj.values().any(|v| v.is_object() || v.is_array()))
        .unwrap_or(false)
}

/// Stringified representation used for comparisons and log output.
/// Bare strings render without quotes; everything else as compact JSON.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}
