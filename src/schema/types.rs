//! Schema type definitions
//!
//! Supported node kinds:
//! - leaf: string, nullable-string, number, nullable-number,
//!   string-or-number, bool — each with a declared default
//! - array: homogeneous array with element schema
//! - map: open key set, uniform value schema
//! - object: fixed, named child set
//!
//! Any node may be locked: a locked field is set once and never reset by
//! repair while a value is present.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Primitive kinds a leaf node can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeafKind {
    /// UTF-8 string
    String,
    /// String or null
    NullableString,
    /// Any JSON number
    Number,
    /// Number or null
    NullableNumber,
    /// String or number (mixed identifier fields)
    StringOrNumber,
    /// Boolean
    Bool,
}

impl LeafKind {
    /// Returns the kind name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            LeafKind::String => "string",
            LeafKind::NullableString => "nullable-string",
            LeafKind::Number => "number",
            LeafKind::NullableNumber => "nullable-number",
            LeafKind::StringOrNumber => "string-or-number",
            LeafKind::Bool => "bool",
        }
    }

    /// Whether a runtime value already satisfies this kind.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            LeafKind::String => value.is_string(),
            LeafKind::NullableString => value.is_string() || value.is_null(),
            LeafKind::Number => value.is_number(),
            LeafKind::NullableNumber => value.is_number() || value.is_null(),
            LeafKind::StringOrNumber => value.is_string() || value.is_number(),
            LeafKind::Bool => value.is_boolean(),
        }
    }
}

/// One node of a record schema.
///
/// Composite kinds nest arbitrarily: objects inside arrays inside maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SchemaNode {
    /// Primitive field with a declared default
    Leaf {
        /// Runtime kind the field must hold
        kind: LeafKind,
        /// Value substituted when the field is absent or mismatched
        default: Value,
        /// Set-once flag
        #[serde(default)]
        locked: bool,
    },
    /// Homogeneous array; length is caller-controlled
    Array {
        /// Element schema (boxed to allow recursion)
        element: Box<SchemaNode>,
        #[serde(default)]
        locked: bool,
    },
    /// Dictionary with arbitrary string keys and a uniform value schema
    Map {
        /// Schema every value must satisfy
        value: Box<SchemaNode>,
        #[serde(default)]
        locked: bool,
    },
    /// Fixed, named child set; undeclared keys are garbage-collected
    Object {
        /// Declared children by name
        children: BTreeMap<String, SchemaNode>,
        #[serde(default)]
        locked: bool,
    },
}

impl SchemaNode {
    /// Create a string leaf with the given default.
    pub fn string(default: impl Into<String>) -> Self {
        SchemaNode::Leaf {
            kind: LeafKind::String,
            default: Value::String(default.into()),
            locked: false,
        }
    }

    /// Create a nullable string leaf defaulting to null.
    pub fn nullable_string() -> Self {
        SchemaNode::Leaf {
            kind: LeafKind::NullableString,
            default: Value::Null,
            locked: false,
        }
    }

    /// Create a number leaf with the given default.
    pub fn number(default: i64) -> Self {
        SchemaNode::Leaf {
            kind: LeafKind::Number,
            default: Value::from(default),
            locked: false,
        }
    }

    /// Create a nullable number leaf defaulting to null.
    pub fn nullable_number() -> Self {
        SchemaNode::Leaf {
            kind: LeafKind::NullableNumber,
            default: Value::Null,
            locked: false,
        }
    }

    /// Create a string-or-number leaf with the given default.
    pub fn string_or_number(default: Value) -> Self {
        SchemaNode::Leaf {
            kind: LeafKind::StringOrNumber,
            default,
            locked: false,
        }
    }

    /// Create a bool leaf with the given default.
    pub fn bool(default: bool) -> Self {
        SchemaNode::Leaf {
            kind: LeafKind::Bool,
            default: Value::Bool(default),
            locked: false,
        }
    }

    /// Create an array node over the given element schema.
    pub fn array(element: SchemaNode) -> Self {
        SchemaNode::Array {
            element: Box::new(element),
            locked: false,
        }
    }

    /// Create a map node over the given value schema.
    pub fn map(value: SchemaNode) -> Self {
        SchemaNode::Map {
            value: Box::new(value),
            locked: false,
        }
    }

    /// Create an object node with the given declared children.
    pub fn object(children: BTreeMap<String, SchemaNode>) -> Self {
        SchemaNode::Object {
            children,
            locked: false,
        }
    }

    /// Mark this node locked (set once, never reset while present).
    pub fn locked(mut self) -> Self {
        match &mut self {
            SchemaNode::Leaf { locked, .. }
            | SchemaNode::Array { locked, .. }
            | SchemaNode::Map { locked, .. }
            | SchemaNode::Object { locked, .. } => *locked = true,
        }
        self
    }

    /// Whether this node is locked.
    pub fn is_locked(&self) -> bool {
        match self {
            SchemaNode::Leaf { locked, .. }
            | SchemaNode::Array { locked, .. }
            | SchemaNode::Map { locked, .. }
            | SchemaNode::Object { locked, .. } => *locked,
        }
    }

    /// Returns the node kind name for error messages.
    pub fn node_name(&self) -> &'static str {
        match self {
            SchemaNode::Leaf { kind, .. } => kind.kind_name(),
            SchemaNode::Array { .. } => "array",
            SchemaNode::Map { .. } => "map",
            SchemaNode::Object { .. } => "object",
        }
    }

    /// Checks that every leaf default in this subtree satisfies its kind.
    fn check_defaults(&self, path: &str) -> Result<(), String> {
        match self {
            SchemaNode::Leaf { kind, default, .. } => {
                if kind.accepts(default) {
                    Ok(())
                } else {
                    Err(format!(
                        "default for '{}' does not satisfy kind {}",
                        path,
                        kind.kind_name()
                    ))
                }
            }
            SchemaNode::Array { element, .. } => element.check_defaults(&format!("{}[]", path)),
            SchemaNode::Map { value, .. } => value.check_defaults(&format!("{}.*", path)),
            SchemaNode::Object { children, .. } => {
                for (name, child) in children {
                    let child_path = if path.is_empty() {
                        name.clone()
                    } else {
                        format!("{}.{}", path, name)
                    };
                    child.check_defaults(&child_path)?;
                }
                Ok(())
            }
        }
    }
}

/// Complete schema for one record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Record type name, used in logs and schema file naming
    pub name: String,
    /// Top-level declared fields
    pub fields: BTreeMap<String, SchemaNode>,
}

/// Name of the generated identifier field every record carries.
pub const ID_FIELD: &str = "_id";

impl Schema {
    /// Create a new schema.
    pub fn new(name: impl Into<String>, fields: BTreeMap<String, SchemaNode>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Validates the schema structure itself (not a record).
    ///
    /// Every store requires a locked string `_id` leaf, and every leaf
    /// default must satisfy its declared kind.
    pub fn validate_structure(&self) -> Result<(), String> {
        match self.fields.get(ID_FIELD) {
            None => return Err(format!("schema must declare an '{}' field", ID_FIELD)),
            Some(SchemaNode::Leaf {
                kind: LeafKind::String,
                locked: true,
                ..
            }) => {}
            Some(node) => {
                return Err(format!(
                    "'{}' must be a locked string leaf, found {}",
                    ID_FIELD,
                    node.node_name()
                ))
            }
        }

        for (name, node) in &self.fields {
            node.check_defaults(name)?;
        }

        Ok(())
    }

    /// Forces a value into conformance with this schema.
    pub fn conform(&self, value: &Value) -> Value {
        super::repair::conform_object(Some(value), &self.fields)
    }
}
