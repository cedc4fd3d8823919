use std::{fmt, ops::Range, sync::Arc};

use crate::{model::record::Record, db::table::column_def::Direction};

/// One key of a native ordering request: an accessor path and a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPath {
    pub path: String,
    pub direction: Direction,
}

impl OrderPath {
    pub fn new(path: &str, direction: Direction) -> Self {
        Self {
            path: path.to_owned(),
            direction,
        }
    }
}

impl fmt::Display for OrderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Ascending => write!(f, "{}", self.path),
            Direction::Descending => write!(f, "-{}", self.path),
        }
    }
}

/// Trait for the record collections a table reads from.
///
/// List-like sources only implement counting and access. Queryable sources
/// that can order themselves additionally report
/// [`DataSource::supports_native_ordering`], validate paths through
/// [`DataSource::can_order_by`] and return a reordered source from
/// [`DataSource::order_by`]; the table then never sorts them in process.
pub trait DataSource: fmt::Debug + Send + Sync {
    /// Returns the number of records, without materialising the source when
    /// it can be counted more cheaply.
    fn count(&self) -> usize;

    /// Returns the record at `index` in source order.
    fn get(&self, index: usize) -> Option<Arc<Record>>;

    /// Materialises all records in source order.
    fn records(&self) -> Vec<Arc<Record>>;

    /// Materialises the records in `range`, clamped to the source length.
    fn slice(&self, range: Range<usize>) -> Vec<Arc<Record>> {
        let records = self.records();
        let end = range.end.min(records.len());
        let start = range.start.min(end);
        records[start..end].to_vec()
    }

    /// Whether the source can order itself.
    fn supports_native_ordering(&self) -> bool {
        false
    }

    /// Whether `path` names something the source can order by.
    fn can_order_by(&self, _path: &str) -> bool {
        false
    }

    /// Returns an equivalent source ordered by `paths`, first key primary.
    fn order_by(&self, _paths: &[OrderPath]) -> Option<Arc<dyn DataSource>> {
        None
    }
}

/// An in-memory list of records.
///
/// # Example
///
/// ```
/// use tablekit::{DataSource, MemorySource, Record};
///
/// let source = MemorySource::new(vec![
///     Record::mapping().set("id", 1),
///     Record::mapping().set("id", 2),
/// ]);
/// assert_eq!(source.count(), 2);
/// assert!(!source.supports_native_ordering());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<Arc<Record>>,
}

impl MemorySource {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: records.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(Arc::new(record));
    }
}

impl FromIterator<Record> for MemorySource {
    fn from_iter<T: IntoIterator<Item = Record>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl DataSource for MemorySource {
    fn count(&self) -> usize {
        self.records.len()
    }

    fn get(&self, index: usize) -> Option<Arc<Record>> {
        self.records.get(index).cloned()
    }

    fn records(&self) -> Vec<Arc<Record>> {
        self.records.clone()
    }

    fn slice(&self, range: Range<usize>) -> Vec<Arc<Record>> {
        let end = range.end.min(self.records.len());
        let start = range.start.min(end);
        self.records[start..end].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_path_display() {
        assert_eq!(OrderPath::new("tld", Direction::Descending).to_string(), "-tld");
        assert_eq!(OrderPath::new("capital.name", Direction::Ascending).to_string(), "capital.name");
    }

    #[test]
    fn test_slice_is_clamped() {
        let source: MemorySource = (1..=3).map(|id| Record::mapping().set("id", id)).collect();
        assert_eq!(source.slice(1..10).len(), 2);
        assert!(source.slice(5..8).is_empty());
    }

    #[test]
    fn test_memory_source_has_no_native_ordering() {
        let source = MemorySource::default();
        assert!(source.order_by(&[OrderPath::new("id", Direction::Ascending)]).is_none());
        assert!(!source.can_order_by("id"));
    }
}
