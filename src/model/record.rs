use std::{cmp::Ordering, collections::BTreeMap};

use crate::model::types::Value;

/// How a record treats keys it does not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Sparse, dict-like data. A missing final key reads as "no value".
    Mapping,

    /// A model instance with a fixed attribute set. Reading a key it does
    /// not hold is a resolution error.
    Object,
}

/// A raw record from a data source.
///
/// # Example
///
/// ```
/// use tablekit::{Record, RecordKind, Value};
///
/// let berlin = Record::object()
///     .set("name", "Berlin")
///     .set("population", 30);
/// let germany = Record::object()
///     .set("name", "Germany")
///     .set("capital", berlin);
///
/// assert_eq!(germany.kind(), RecordKind::Object);
/// assert_eq!(germany.get("name"), Some(&Value::from("Germany")));
/// assert!(!germany.contains("tld"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    kind: RecordKind,
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            fields: BTreeMap::new(),
        }
    }

    /// Creates an empty sparse record.
    pub fn mapping() -> Self {
        Self::new(RecordKind::Mapping)
    }

    /// Creates an empty fixed-attribute record.
    pub fn object() -> Self {
        Self::new(RecordKind::Object)
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Returns a reference to the field value, if it exists.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns `true` if the record holds the given field.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Sets a field value (builder pattern).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Inserts a field value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Compares two records field by field, in key order.
    pub(crate) fn sort_cmp(&self, other: &Record) -> Ordering {
        let mut left = self.fields.iter();
        let mut right = other.fields.iter();
        loop {
            match (left.next(), right.next()) {
                (None, None) => return Ordering::Equal,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some((ka, va)), Some((kb, vb))) => {
                    let ord = ka.cmp(kb).then_with(|| va.sort_cmp(vb));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
            }
        }
    }
}
