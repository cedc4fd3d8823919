use std::{
    collections::BTreeMap,
    ops::Range,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};

use miette::Result;
use tracing::{debug, trace};

use crate::{
    TableError,
    db::{
        ordering::{OrderKey, OrderingEngine},
        source::DataSource,
        table::row::{BoundRow, Cell, RowBinder},
    },
    model::record::Record,
};

type ResolvedRow = (Arc<Record>, Arc<[Cell]>);

/// An immutable, ordered view of a source at one point in time.
///
/// Sources sorted in process are materialised when the snapshot is built.
/// Natively ordered sources, and unordered ones, are materialised on first
/// full read; until then length and slices go straight to the source, and
/// every row fetched that way is kept so its cells resolve only once.
#[derive(Debug)]
pub struct Snapshot {
    source: Arc<dyn DataSource>,
    binder: RowBinder,
    ordering: Vec<OrderKey>,
    rows: OnceLock<Vec<ResolvedRow>>,
    fetched: Mutex<BTreeMap<usize, ResolvedRow>>,
    count: OnceLock<usize>,
}

impl Snapshot {
    /// Builds a snapshot of `source` ordered by `keys`.
    ///
    /// # Errors
    ///
    /// Returns the resolution error of a sort key cell when the rows have to
    /// be sorted in process.
    pub(crate) fn build(
        source: Arc<dyn DataSource>,
        binder: RowBinder,
        engine: &OrderingEngine<'_>,
        keys: Vec<OrderKey>,
    ) -> Result<Self, TableError> {
        if keys.is_empty() {
            trace!("building snapshot in natural order");
            return Ok(Self::deferred(source, binder, keys));
        }

        if source.supports_native_ordering() {
            let paths = engine.native_paths(&keys);
            if let Some(ordered) = source.order_by(&paths) {
                let paths: Vec<String> = paths.iter().map(ToString::to_string).collect();
                debug!(paths = %paths.join(","), "delegating ordering to source");
                return Ok(Self::deferred(ordered, binder, keys));
            }
        }

        let mut rows: Vec<ResolvedRow> = source
            .records()
            .into_iter()
            .map(|record| {
                let cells = binder.fill(&record);
                (record, cells)
            })
            .collect();
        engine.sort(&mut rows, &keys)?;
        debug!(rows = rows.len(), keys = keys.len(), "sorted snapshot in process");

        let snapshot = Self::deferred(source, binder, keys);
        let _ = snapshot.count.set(rows.len());
        let _ = snapshot.rows.set(rows);
        Ok(snapshot)
    }

    fn deferred(source: Arc<dyn DataSource>, binder: RowBinder, ordering: Vec<OrderKey>) -> Self {
        Self {
            source,
            binder,
            ordering,
            rows: OnceLock::new(),
            fetched: Mutex::new(BTreeMap::new()),
            count: OnceLock::new(),
        }
    }

    /// The resolved ordering this snapshot was built with.
    pub fn ordering(&self) -> &[OrderKey] {
        &self.ordering
    }

    pub fn is_materialized(&self) -> bool {
        self.rows.get().is_some()
    }

    pub fn len(&self) -> usize {
        if let Some(rows) = self.rows.get() {
            return rows.len();
        }
        *self.count.get_or_init(|| self.source.count())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fetched(&self) -> MutexGuard<'_, BTreeMap<usize, ResolvedRow>> {
        self.fetched.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(&self, record: Arc<Record>) -> ResolvedRow {
        let cells = self.binder.fill(&record);
        (record, cells)
    }

    fn bind(&self, (record, cells): &ResolvedRow) -> BoundRow {
        self.binder.bind_cells(Arc::clone(record), Arc::clone(cells))
    }

    fn materialize(&self) -> &[ResolvedRow] {
        self.rows.get_or_init(|| {
            trace!("materialising snapshot");
            let mut fetched = self.fetched();
            self.source
                .records()
                .into_iter()
                .enumerate()
                .map(|(index, record)| {
                    fetched
                        .remove(&index)
                        .unwrap_or_else(|| self.resolve(record))
                })
                .collect()
        })
    }

    pub fn get(&self, index: usize) -> Option<BoundRow> {
        if let Some(rows) = self.rows.get() {
            return rows.get(index).map(|row| self.bind(row));
        }

        let mut fetched = self.fetched();
        if let Some(row) = fetched.get(&index) {
            return Some(self.bind(row));
        }
        let row = self.resolve(self.source.get(index)?);
        Some(self.bind(fetched.entry(index).or_insert(row)))
    }

    /// Rows in `range`, clamped to the snapshot length.
    pub fn slice(&self, range: Range<usize>) -> Vec<BoundRow> {
        if let Some(rows) = self.rows.get() {
            let end = range.end.min(rows.len());
            let start = range.start.min(end);
            return rows[start..end].iter().map(|row| self.bind(row)).collect();
        }

        let mut fetched = self.fetched();
        let cached = range.len() <= fetched.len()
            && range.clone().all(|index| fetched.contains_key(&index));
        if cached {
            return range
                .filter_map(|index| fetched.get(&index))
                .map(|row| self.bind(row))
                .collect();
        }

        let start = range.start;
        self.source
            .slice(range)
            .into_iter()
            .enumerate()
            .map(|(offset, record)| {
                let row = fetched
                    .entry(start + offset)
                    .or_insert_with(|| self.resolve(record));
                self.bind(row)
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = BoundRow> + '_ {
        self.materialize().iter().map(|row| self.bind(row))
    }
}

/// The rows of a table, as seen through its current snapshot.
///
/// Cheap to clone; holds the snapshot alive even if the table moves on.
#[derive(Debug, Clone)]
pub struct Rows {
    snapshot: Arc<Snapshot>,
}

impl Rows {
    pub(crate) fn new(snapshot: Arc<Snapshot>) -> Self {
        Self { snapshot }
    }

    pub fn snapshot(&self) -> &Arc<Snapshot> {
        &self.snapshot
    }

    /// Number of rows. Uses the source count until the rows are materialised.
    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<BoundRow> {
        self.snapshot.get(index)
    }

    pub fn slice(&self, range: Range<usize>) -> Vec<BoundRow> {
        self.snapshot.slice(range)
    }

    pub fn iter(&self) -> impl Iterator<Item = BoundRow> + '_ {
        self.snapshot.iter()
    }
}

impl<'a> IntoIterator for &'a Rows {
    type Item = BoundRow;
    type IntoIter = Box<dyn Iterator<Item = BoundRow> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
