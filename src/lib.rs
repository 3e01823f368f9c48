//! menddb - A self-repairing, schema-validated document store
//!
//! One `Store` per record type, one pretty-printed JSON file per record.
//! A schema is declared once; every value that reaches disk is forced into
//! conformance with it first.

pub mod audit;
pub mod cli;
pub mod schema;
pub mod store;
