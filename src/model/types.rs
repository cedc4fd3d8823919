use std::{cmp::Ordering, fmt, sync::Arc};

use crate::model::record::Record;

/// A computed attribute of a record.
///
/// Derived values stand in for methods and properties on model instances:
/// the binder evaluates them against the record that holds them whenever
/// they are reached during accessor traversal or sorting.
#[derive(Clone)]
pub struct Derived(Arc<dyn Fn(&Record) -> Value + Send + Sync>);

impl Derived {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Record) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Evaluates the attribute until a concrete (non-derived) value remains.
    pub fn evaluate(&self, owner: &Record) -> Value {
        let mut value = (self.0)(owner);
        while let Value::Derived(next) = value {
            value = (next.0)(owner);
        }
        value
    }
}

impl fmt::Debug for Derived {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Derived(..)")
    }
}

/// A value held by a record field or produced for a table cell.
///
/// # Example
///
/// ```
/// use tablekit::{Record, Value};
///
/// let id = Value::Integer(42);
/// let name = Value::from("Alice");
/// let capital = Value::from(Record::object().set("name", "Berlin"));
/// let missing = Value::Null;
/// assert!(missing.is_null());
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    /// A 64-bit signed integer value.
    Integer(i64),

    /// A 64-bit floating point number.
    Float(f64),

    /// A UTF-8 text string.
    Text(String),

    /// A boolean value (true/false).
    Boolean(bool),

    /// A related record, traversed by multi-segment accessor paths.
    Record(Arc<Record>),

    /// A computed attribute, see [`Derived`].
    Derived(Derived),

    /// Absence of a value.
    Null,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Derived(a), Value::Derived(b)) => Arc::ptr_eq(&a.0, &b.0),
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Text(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Record(_) => write!(f, "<record>"),
            Value::Derived(_) => write!(f, "<derived>"),
            Value::Null => write!(f, "NULL"),
        }
    }
}

impl Value {
    /// Wraps a closure as a [`Value::Derived`].
    pub fn derived<F>(f: F) -> Self
    where
        F: Fn(&Record) -> Value + Send + Sync + 'static,
    {
        Value::Derived(Derived::new(f))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Rank of the variant in the cross-type sort order.
    fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Integer(_) | Value::Float(_) => 2,
            Value::Text(_) => 3,
            Value::Record(_) => 4,
            Value::Derived(_) => 5,
        }
    }

    /// Total order used when sorting table rows.
    ///
    /// `Null` sorts before everything else, integers and floats compare
    /// numerically, and values of unrelated types order by type. Derived
    /// values must be evaluated before comparing; two unevaluated derived
    /// values compare equal.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).total_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.total_cmp(&(*b as f64)),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Record(a), Value::Record(b)) => a.sort_cmp(b),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(Arc::new(v))
    }
}

impl From<Arc<Record>> for Value {
    fn from(v: Arc<Record>) -> Self {
        Value::Record(v)
    }
}

impl From<Derived> for Value {
    fn from(v: Derived) -> Self {
        Value::Derived(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
