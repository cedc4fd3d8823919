use std::sync::{Arc, Mutex, PoisonError};

use miette::Result;
use tracing::{debug, trace};

use crate::{
    TableError,
    db::{
        ordering::{OrderBy, OrderKey, OrderSpec, OrderingEngine},
        snapshot::{Rows, Snapshot},
        source::DataSource,
    },
};

pub mod bound_column;
pub mod column_def;
pub mod options;
pub mod row;
pub mod schema;
pub mod table_def;

use bound_column::BoundColumn;
use column_def::ColumnDefinition;
use options::TableOptions;
use row::RowBinder;
use schema::ColumnRegistry;
use table_def::TableDef;

/// A data source presented through a column registry and an ordering.
///
/// Rows are read from a snapshot that is built on first access and reused
/// until the ordering, the source or a column changes.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tablekit::{ColumnDefinition, MemorySource, Record, Table, TableDef, Value};
///
/// let def = TableDef::new("people")
///     .column(ColumnDefinition::new("id"))
///     .column(ColumnDefinition::new("name"));
/// let source = MemorySource::new(vec![
///     Record::mapping().set("id", 1).set("name", "Stevens"),
///     Record::mapping().set("id", 2).set("name", "Adams"),
/// ]);
///
/// let mut table = Table::new(&def, Arc::new(source)).unwrap();
/// table.set_order_by("name").unwrap();
///
/// let rows = table.rows().unwrap();
/// let names: Vec<Value> = rows.iter().map(|row| row.get("name").unwrap()).collect();
/// assert_eq!(names, vec![Value::from("Adams"), Value::from("Stevens")]);
/// ```
#[derive(Debug)]
pub struct Table {
    name: String,
    registry: Arc<ColumnRegistry>,
    options: TableOptions,
    source: Arc<dyn DataSource>,
    order_by: OrderBy,
    snapshot: Mutex<Option<Arc<Snapshot>>>,
}

impl Table {
    /// Creates a table from a declaration, applying its default ordering.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidOrdering`] if the default ordering names
    /// invalid columns and invalid options are not ignored.
    pub fn new(def: &TableDef, source: Arc<dyn DataSource>) -> Result<Self, TableError> {
        let mut table = Self::from_parts(def.registry(), def.table_options().clone(), source)?;
        table.name = def.name().to_string();
        Ok(table)
    }

    /// Creates a table from an already built registry.
    pub fn from_parts(
        registry: ColumnRegistry,
        options: TableOptions,
        source: Arc<dyn DataSource>,
    ) -> Result<Self, TableError> {
        let default_order_by = options.default_order_by.clone();
        let mut table = Self {
            name: String::new(),
            registry: Arc::new(registry),
            options,
            source,
            order_by: OrderBy::default(),
            snapshot: Mutex::new(None),
        };

        if let Some(order_by) = default_order_by {
            table.set_order_by(order_by)?;
        }

        debug!(
            columns = table.registry.len(),
            order_by = %table.order_by,
            "created table"
        );
        Ok(table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &ColumnRegistry {
        &self.registry
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn source(&self) -> &Arc<dyn DataSource> {
        &self.source
    }

    fn engine(&self) -> OrderingEngine<'_> {
        OrderingEngine::new(&self.registry, &self.options, self.source.as_ref())
    }

    /// The current, validated ordering request.
    pub fn order_by(&self) -> &OrderBy {
        &self.order_by
    }

    /// Replaces the ordering request.
    ///
    /// Tokens naming unknown, inaccessible or unsortable columns are dropped.
    /// An empty result means natural source order.
    ///
    /// # Errors
    ///
    /// With `ignore_invalid_options` disabled, returns
    /// [`TableError::InvalidOrdering`] and keeps the previous ordering.
    pub fn set_order_by(&mut self, spec: impl Into<OrderSpec>) -> Result<(), TableError> {
        let (order_by, rejected) = self.engine().validate(&spec.into());

        if !rejected.is_empty() && !self.options.ignore_invalid_options {
            return Err(TableError::InvalidOrdering(rejected.join(",")));
        }

        if order_by != self.order_by {
            self.order_by = order_by;
            self.invalidate();
        }
        Ok(())
    }

    pub fn clear_order_by(&mut self) {
        if !self.order_by.is_empty() {
            self.order_by = OrderBy::default();
            self.invalidate();
        }
    }

    /// The ordering resolved to effective directions.
    pub fn ordering(&self) -> Vec<OrderKey> {
        self.engine().resolve(&self.order_by)
    }

    /// Replaces the data source.
    ///
    /// The current ordering is checked against the new source; keys it cannot
    /// order by are dropped.
    pub fn set_source(&mut self, source: Arc<dyn DataSource>) {
        self.source = source;
        self.revalidate();
        self.invalidate();
    }

    /// Drops ordering keys that are no longer valid for the current registry
    /// and source.
    fn revalidate(&mut self) {
        let (order_by, rejected) = self.engine().validate(&OrderSpec::from(&self.order_by));
        if !rejected.is_empty() {
            debug!(
                table = %self.name,
                dropped = %rejected.join(","),
                "ordering keys no longer valid"
            );
            self.order_by = order_by;
        }
    }

    /// Drops the cached snapshot; the next read rebuilds it.
    pub fn invalidate(&self) {
        trace!(table = %self.name, "invalidating snapshot");
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Returns the current snapshot, building it if stale.
    ///
    /// # Errors
    ///
    /// Returns the resolution error of a sort key cell if the rows have to be
    /// sorted in process and a key cannot be resolved for some row.
    pub fn snapshot(&self) -> Result<Arc<Snapshot>, TableError> {
        let mut guard = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(snapshot) = guard.as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        debug!(table = %self.name, order_by = %self.order_by, "rebuilding snapshot");
        let engine = self.engine();
        let keys = engine.resolve(&self.order_by);
        let binder = RowBinder::new(Arc::clone(&self.registry), &self.options.path_separator);
        let snapshot = Arc::new(Snapshot::build(Arc::clone(&self.source), binder, &engine, keys)?);

        *guard = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    pub fn rows(&self) -> Result<Rows, TableError> {
        Ok(Rows::new(self.snapshot()?))
    }

    fn bound<'a>(&'a self, column: &'a ColumnDefinition) -> BoundColumn<'a> {
        BoundColumn::new(column, &self.order_by, self.engine().is_sortable(column))
    }

    /// Visible columns, in registry order.
    pub fn columns(&self) -> Vec<BoundColumn<'_>> {
        self.registry
            .iter()
            .filter(|column| column.is_visible())
            .map(|column| self.bound(column))
            .collect()
    }

    /// All columns, hidden ones included.
    pub fn all_columns(&self) -> Vec<BoundColumn<'_>> {
        self.registry.iter().map(|column| self.bound(column)).collect()
    }

    /// Visible columns that may be used as ordering keys.
    pub fn sortable_columns(&self) -> Vec<BoundColumn<'_>> {
        self.columns()
            .into_iter()
            .filter(BoundColumn::sortable)
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<BoundColumn<'_>> {
        self.registry.get(name).map(|column| self.bound(column))
    }

    /// Edits one column of this table only.
    ///
    /// The table's registry is copied on first edit, so declarations and
    /// other tables are unaffected. Afterwards the current ordering is checked
    /// again, so a column made unsortable stops ordering the table.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::ColumnNotFound`] if no such column exists.
    pub fn update_column<R>(
        &mut self,
        name: &str,
        edit: impl FnOnce(&mut ColumnDefinition) -> R,
    ) -> Result<R, TableError> {
        let column = Arc::make_mut(&mut self.registry)
            .get_mut(name)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))?;
        let result = edit(column);

        self.revalidate();
        self.invalidate();
        Ok(result)
    }

    pub fn set_visible(&mut self, name: &str, visible: bool) -> Result<(), TableError> {
        self.update_column(name, |column| column.set_visible(visible))
    }
}
