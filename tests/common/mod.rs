#![allow(dead_code)]

use std::{
    cmp::Ordering,
    ops::Range,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering as AtomicOrdering},
    },
};

use tablekit::{DataSource, OrderPath, Record, SchemaField, Value};

/// Calls a [`QuerySource`] received, shared by every source derived from it.
#[derive(Debug, Default)]
pub struct Calls {
    pub count: AtomicUsize,
    pub records: AtomicUsize,
    pub slice: AtomicUsize,
    pub order_by: AtomicUsize,
}

impl Calls {
    /// Calls that would hit the backing store.
    pub fn queries(&self) -> usize {
        self.count.load(AtomicOrdering::SeqCst)
            + self.records.load(AtomicOrdering::SeqCst)
            + self.slice.load(AtomicOrdering::SeqCst)
    }

    pub fn order_by(&self) -> usize {
        self.order_by.load(AtomicOrdering::SeqCst)
    }
}

/// A lazily evaluated, natively orderable source over a fixed set of fields.
#[derive(Debug, Clone)]
pub struct QuerySource {
    records: Vec<Arc<Record>>,
    orderable: Vec<String>,
    pub calls: Arc<Calls>,
}

impl QuerySource {
    pub fn new(records: Vec<Record>, orderable: &[&str]) -> Self {
        Self {
            records: records.into_iter().map(Arc::new).collect(),
            orderable: orderable.iter().map(|path| path.to_string()).collect(),
            calls: Arc::new(Calls::default()),
        }
    }

    fn lookup(record: &Record, path: &str) -> Value {
        let mut value = Value::Record(Arc::new(record.clone()));
        for segment in path.split('.') {
            value = match &value {
                Value::Record(inner) => inner.get(segment).cloned().unwrap_or(Value::Null),
                _ => return Value::Null,
            };
        }
        value
    }
}

impl DataSource for QuerySource {
    fn count(&self) -> usize {
        self.calls.count.fetch_add(1, AtomicOrdering::SeqCst);
        self.records.len()
    }

    fn get(&self, index: usize) -> Option<Arc<Record>> {
        self.calls.slice.fetch_add(1, AtomicOrdering::SeqCst);
        self.records.get(index).cloned()
    }

    fn records(&self) -> Vec<Arc<Record>> {
        self.calls.records.fetch_add(1, AtomicOrdering::SeqCst);
        self.records.clone()
    }

    fn slice(&self, range: Range<usize>) -> Vec<Arc<Record>> {
        self.calls.slice.fetch_add(1, AtomicOrdering::SeqCst);
        let end = range.end.min(self.records.len());
        let start = range.start.min(end);
        self.records[start..end].to_vec()
    }

    fn supports_native_ordering(&self) -> bool {
        true
    }

    fn can_order_by(&self, path: &str) -> bool {
        self.orderable.iter().any(|field| field == path)
    }

    fn order_by(&self, paths: &[OrderPath]) -> Option<Arc<dyn DataSource>> {
        self.calls.order_by.fetch_add(1, AtomicOrdering::SeqCst);
        let mut records = self.records.clone();
        records.sort_by(|a, b| {
            paths
                .iter()
                .map(|key| {
                    let left = Self::lookup(a, &key.path);
                    let right = Self::lookup(b, &key.path);
                    key.direction.apply(left.sort_cmp(&right))
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });
        Some(Arc::new(Self {
            records,
            orderable: self.orderable.clone(),
            calls: Arc::clone(&self.calls),
        }))
    }
}

pub fn city(id: i64, name: &str, population: i64) -> Record {
    Record::object()
        .set("id", id)
        .set("name", name)
        .set("population", population)
}

pub fn country(
    id: i64,
    name: &str,
    tld: &str,
    population: i64,
    system: Option<&str>,
    capital: Option<Record>,
) -> Record {
    Record::object()
        .set("id", id)
        .set("name", name)
        .set("population", population)
        .set("capital", capital)
        .set("tld", tld)
        .set("system", system)
        .set("null", Value::Null)
        .set("null2", Value::Null)
        .set(
            "example_domain",
            Value::derived(|record| match record.get("tld") {
                Some(Value::Text(tld)) => Value::from(format!("example.{tld}")),
                _ => Value::Null,
            }),
        )
}

pub fn countries() -> Vec<Record> {
    vec![
        country(1, "Austria", "au", 8, Some("republic"), None),
        country(2, "Germany", "de", 81, None, Some(city(1, "Berlin", 30))),
        country(3, "France", "fr", 64, Some("republic"), None),
        country(4, "Netherlands", "nl", 16, Some("monarchy"), Some(city(2, "Amsterdam", 6))),
    ]
}

pub fn country_schema() -> Vec<SchemaField> {
    vec![
        SchemaField::new("id"),
        SchemaField::new("name"),
        SchemaField::new("population"),
        SchemaField::new("capital"),
        SchemaField::new("tld").with_verbose_name("Domain Extension"),
        SchemaField::new("system"),
        SchemaField::new("null"),
        SchemaField::new("null2"),
    ]
}

pub const COUNTRY_PATHS: &[&str] = &[
    "id",
    "name",
    "population",
    "capital",
    "capital.id",
    "capital.name",
    "capital.population",
    "tld",
    "system",
    "null",
    "null2",
];

pub fn ids(rows: &tablekit::Rows) -> Vec<i64> {
    rows.iter()
        .map(|row| row.get("id").ok().and_then(|value| value.as_integer()).unwrap_or(-1))
        .collect()
}
