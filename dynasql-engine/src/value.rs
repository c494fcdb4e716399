//! The untyped record model exchanged between the SQL layer and the
//! attribute codec.

use std::collections::BTreeMap;

/// A single field value in a [`Record`], independent of the store's wire
/// format.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    List(Vec<RecordValue>),
    Map(Record),
    Null,
}

/// An untyped mapping from attribute name to value, as produced by decoding
/// a store item or by the SQL layer from an INSERT/UPDATE value list.
/// Ordering is not meaningful; `BTreeMap` is used for deterministic
/// iteration in tests and logs, not because order carries semantics.
pub type Record = BTreeMap<String, RecordValue>;
