//! Schema subsystem for menddb
//!
//! A schema is the single declaration of a record type's shape: which
//! fields exist, what runtime type each holds, what its default is, and
//! whether it is locked (set once, never reset while present).
//!
//! # Design Principles
//!
//! - Declared once per record type, immutable for the store's lifetime
//! - Every node carries its own default
//! - Repair never fails: any input is coerced into conformance
//! - Undeclared fields are garbage-collected, not tolerated

mod errors;
mod loader;
mod repair;
mod types;

pub use errors::{Divergence, SchemaError, SchemaErrorCode, SchemaResult, Severity};
pub use loader::{load_schema, save_schema};
pub use repair::{conform, conform_object, first_divergence};
pub use types::{LeafKind, Schema, SchemaNode, ID_FIELD};
