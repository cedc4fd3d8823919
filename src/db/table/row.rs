use std::sync::Arc;

use miette::Result;

use crate::{
    TableError,
    db::table::{
        column_def::{ColumnDefault, ColumnDefinition},
        schema::ColumnRegistry,
    },
    model::{
        record::{Record, RecordKind},
        types::Value,
    },
};

/// Outcome of resolving one cell while a snapshot is built.
///
/// Failures are kept per cell so that one misconfigured column only fails the
/// reads that touch it.
#[derive(Debug, Clone)]
pub(crate) enum Cell {
    Value(Value),
    Failed(TableError),
    Inaccessible,
}

/// Resolves column values for raw records against a frozen registry.
#[derive(Debug, Clone)]
pub struct RowBinder {
    registry: Arc<ColumnRegistry>,
    separator: Arc<str>,
}

impl RowBinder {
    pub fn new(registry: Arc<ColumnRegistry>, separator: &str) -> Self {
        Self {
            registry,
            separator: Arc::from(separator),
        }
    }

    pub fn registry(&self) -> &Arc<ColumnRegistry> {
        &self.registry
    }

    /// Wraps a record for keyed cell access.
    pub fn bind(&self, record: Arc<Record>) -> BoundRow {
        BoundRow {
            record,
            binder: self.clone(),
            cells: None,
            computing: None,
        }
    }

    pub(crate) fn bind_cells(&self, record: Arc<Record>, cells: Arc<[Cell]>) -> BoundRow {
        BoundRow {
            record,
            binder: self.clone(),
            cells: Some(cells),
            computing: None,
        }
    }

    /// Resolves every column of the registry for one record.
    pub(crate) fn fill(&self, record: &Arc<Record>) -> Arc<[Cell]> {
        self.registry
            .iter()
            .map(|column| {
                if !column.is_accessible() {
                    return Cell::Inaccessible;
                }
                match self.resolve(record, column) {
                    Ok(value) => Cell::Value(value),
                    Err(err) => Cell::Failed(err),
                }
            })
            .collect()
    }

    /// Resolves the value of `column` for `record`.
    ///
    /// Walks the accessor path, then falls back to the column default when
    /// the walk produced no value. A column without default resolves to
    /// [`Value::Null`].
    ///
    /// # Errors
    ///
    /// - [`TableError::Access`] if the column is inaccessible
    /// - [`TableError::Resolution`] if a path segment does not exist
    /// - whatever a computed default returns
    pub fn resolve(&self, record: &Arc<Record>, column: &ColumnDefinition) -> Result<Value, TableError> {
        if !column.is_accessible() {
            return Err(TableError::Access(column.name().to_string()));
        }

        let value = self.traverse(record, column.accessor_path())?;
        if !value.is_null() {
            return Ok(value);
        }

        match column.column_default() {
            None => Ok(Value::Null),
            Some(ColumnDefault::Literal(Value::Derived(derived))) => Ok(derived.evaluate(record)),
            Some(ColumnDefault::Literal(value)) => Ok(value.clone()),
            Some(ColumnDefault::Computed(f)) => {
                let mut row = self.bind(Arc::clone(record));
                row.computing = Some(Arc::from(column.name()));
                f(&row)
            }
        }
    }

    /// Follows an accessor path through related records.
    ///
    /// A segment that is missing is an error, except for the last segment of
    /// a [`RecordKind::Mapping`] record. A segment that holds `Null` ends the
    /// walk with `Null` without looking at the remaining segments.
    pub fn traverse(&self, record: &Arc<Record>, path: &str) -> Result<Value, TableError> {
        let segments: Vec<&str> = path.split(&*self.separator).collect();
        let last = segments.len() - 1;
        let mut owner = Arc::clone(record);

        for (i, segment) in segments.iter().enumerate() {
            let value = match owner.get(segment) {
                Some(Value::Derived(derived)) => derived.evaluate(&owner),
                Some(value) => value.clone(),
                None if i == last && owner.kind() == RecordKind::Mapping => return Ok(Value::Null),
                None => {
                    return Err(TableError::Resolution {
                        segment: segment.to_string(),
                        path: path.to_string(),
                    });
                }
            };

            if i == last {
                return Ok(value);
            }

            match value {
                Value::Null => return Ok(Value::Null),
                Value::Record(next) => owner = next,
                _ => {
                    return Err(TableError::Resolution {
                        segment: segments[i + 1].to_string(),
                        path: path.to_string(),
                    });
                }
            }
        }

        Ok(Value::Null)
    }
}

/// A read-only view of one record bound to a column registry.
///
/// Rows handed out by a table carry the cells resolved for its snapshot;
/// rows handed to computed defaults resolve on demand.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tablekit::{ColumnDefinition, ColumnRegistry, Record, RowBinder, Value};
///
/// let registry = ColumnRegistry::new(vec![
///     ColumnDefinition::new("name"),
///     ColumnDefinition::new("answer").default_value(42),
/// ]);
/// let binder = RowBinder::new(Arc::new(registry), ".");
/// let row = binder.bind(Arc::new(Record::mapping().set("name", "Foo Bar")));
///
/// assert_eq!(row.get("name").unwrap(), Value::from("Foo Bar"));
/// assert_eq!(row.get("answer").unwrap(), Value::Integer(42));
/// assert!(row.get("id").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct BoundRow {
    record: Arc<Record>,
    binder: RowBinder,
    cells: Option<Arc<[Cell]>>,
    computing: Option<Arc<str>>,
}

impl BoundRow {
    /// The raw record behind this row.
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// `true` if `name` is a column that may be read.
    pub fn contains(&self, name: &str) -> bool {
        self.binder
            .registry
            .get(name)
            .is_some_and(ColumnDefinition::is_accessible)
    }

    /// Returns the resolved value of a column.
    ///
    /// # Errors
    ///
    /// - [`TableError::ColumnNotFound`] if no such column exists, even when
    ///   the record holds a field of that name
    /// - [`TableError::Access`] if the column is inaccessible
    /// - [`TableError::Resolution`] if its accessor path is invalid
    /// - [`TableError::SelfReferentialDefault`] if read from the column's own
    ///   computed default
    pub fn get(&self, name: &str) -> Result<Value, TableError> {
        let registry = &self.binder.registry;
        let index = registry
            .index_of(name)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))?;
        self.get_index(index)
    }

    /// Returns the value of the column at `index` in registry order.
    pub fn get_index(&self, index: usize) -> Result<Value, TableError> {
        let column = self
            .binder
            .registry
            .get_index(index)
            .ok_or_else(|| TableError::ColumnNotFound(index.to_string()))?;

        if !column.is_accessible() {
            return Err(TableError::Access(column.name().to_string()));
        }
        if self.computing.as_deref() == Some(column.name()) {
            return Err(TableError::SelfReferentialDefault(column.name().to_string()));
        }

        match self.cells.as_ref().and_then(|cells| cells.get(index)) {
            Some(Cell::Value(value)) => Ok(value.clone()),
            Some(Cell::Failed(err)) => Err(err.clone()),
            Some(Cell::Inaccessible) => Err(TableError::Access(column.name().to_string())),
            None => self.binder.resolve(&self.record, column),
        }
    }

    /// Values of all accessible columns, in registry order.
    pub fn values(&self) -> Vec<(&str, Result<Value, TableError>)> {
        self.binder
            .registry
            .iter()
            .enumerate()
            .filter(|(_, column)| column.is_accessible())
            .map(|(index, column)| (column.name(), self.get_index(index)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binder(columns: Vec<ColumnDefinition>) -> RowBinder {
        RowBinder::new(Arc::new(ColumnRegistry::new(columns)), ".")
    }

    fn germany() -> Arc<Record> {
        let berlin = Record::object()
            .set("name", "Berlin")
            .set("population", 30);
        Arc::new(
            Record::object()
                .set("name", "Germany")
                .set("tld", "de")
                .set("capital", berlin)
                .set("system", Value::Null),
        )
    }

    fn austria() -> Arc<Record> {
        Arc::new(
            Record::object()
                .set("name", "Austria")
                .set("tld", "au")
                .set("capital", Value::Null)
                .set("system", "republic"),
        )
    }

    #[test]
    fn test_relation_path() {
        let binder = binder(vec![ColumnDefinition::new("cap_pop").accessor("capital.population")]);
        let row = binder.bind(germany());
        assert_eq!(row.get("cap_pop").unwrap(), Value::Integer(30));
    }

    #[test]
    fn test_null_relation_stops_traversal() {
        let binder = binder(vec![ColumnDefinition::new("invalid").accessor("capital.invalid")]);
        let row = binder.bind(austria());
        assert_eq!(row.get("invalid").unwrap(), Value::Null);
    }

    #[test]
    fn test_missing_intermediate_segment_fails() {
        let binder = binder(vec![ColumnDefinition::new("invalid").accessor("capital.invalid")]);
        let row = binder.bind(germany());
        for _ in 0..2 {
            assert_eq!(
                row.get("invalid"),
                Err(TableError::Resolution {
                    segment: "invalid".to_string(),
                    path: "capital.invalid".to_string(),
                })
            );
        }
    }

    #[test]
    fn test_missing_attribute_on_object_fails() {
        let binder = binder(vec![ColumnDefinition::new("name").accessor("something-i-made-up")]);
        let row = binder.bind(germany());
        assert!(matches!(row.get("name"), Err(TableError::Resolution { .. })));
    }

    #[test]
    fn test_missing_final_key_on_mapping_is_null() {
        let binder = binder(vec![ColumnDefinition::new("answer")]);
        let row = binder.bind(Arc::new(Record::mapping().set("name", "Foo")));
        assert_eq!(row.get("answer").unwrap(), Value::Null);
    }

    #[test]
    fn test_missing_intermediate_key_on_mapping_fails() {
        let binder = binder(vec![ColumnDefinition::new("x").accessor("a.b")]);
        let row = binder.bind(Arc::new(Record::mapping()));
        assert!(matches!(row.get("x"), Err(TableError::Resolution { .. })));
    }

    #[test]
    fn test_scalar_intermediate_fails() {
        let binder = binder(vec![ColumnDefinition::new("x").accessor("tld.length")]);
        let row = binder.bind(germany());
        assert_eq!(
            row.get("x"),
            Err(TableError::Resolution {
                segment: "length".to_string(),
                path: "tld.length".to_string(),
            })
        );
    }

    #[test]
    fn test_literal_default_for_null() {
        let binder = binder(vec![ColumnDefinition::new("system").default_value("republic")]);
        assert_eq!(binder.bind(germany()).get("system").unwrap(), Value::from("republic"));
        assert_eq!(binder.bind(austria()).get("system").unwrap(), Value::from("republic"));
    }

    #[test]
    fn test_default_through_null_relation() {
        let binder = binder(vec![
            ColumnDefinition::new("capital_name")
                .accessor("capital.name")
                .default_value("none"),
        ]);
        assert_eq!(binder.bind(austria()).get("capital_name").unwrap(), Value::from("none"));
    }

    #[test]
    fn test_computed_default_reads_other_columns() {
        let binder = binder(vec![
            ColumnDefinition::new("example_domain"),
            ColumnDefinition::new("null").default_with(|row| row.get("example_domain")),
        ]);
        let record = Record::object()
            .set("tld", "de")
            .set("null", Value::Null)
            .set(
                "example_domain",
                Value::derived(|r| match r.get("tld") {
                    Some(Value::Text(tld)) => Value::from(format!("example.{tld}")),
                    _ => Value::Null,
                }),
            );
        let row = binder.bind(Arc::new(record));
        assert_eq!(row.get("example_domain").unwrap(), Value::from("example.de"));
        assert_eq!(row.get("null").unwrap(), Value::from("example.de"));
    }

    #[test]
    fn test_self_referential_default_fails_fast() {
        let binder = binder(vec![ColumnDefinition::new("loop").default_with(|row| row.get("loop"))]);
        let row = binder.bind(Arc::new(Record::mapping()));
        assert_eq!(
            row.get("loop"),
            Err(TableError::SelfReferentialDefault("loop".to_string()))
        );
    }

    #[test]
    fn test_inaccessible_column_is_refused() {
        let binder = binder(vec![ColumnDefinition::new("name").inaccessible()]);
        let row = binder.bind(germany());
        assert!(!row.contains("name"));
        assert_eq!(row.get("name"), Err(TableError::Access("name".to_string())));
    }

    #[test]
    fn test_field_without_column_is_denied() {
        let binder = binder(vec![ColumnDefinition::new("name")]);
        let row = binder.bind(germany());
        assert!(!row.contains("tld"));
        assert_eq!(row.get("tld"), Err(TableError::ColumnNotFound("tld".to_string())));
    }

    #[test]
    fn test_renamed_column_matches_direct_walk() {
        let binder = binder(vec![ColumnDefinition::new("domain").accessor("tld")]);
        let record = germany();
        let row = binder.bind(Arc::clone(&record));
        assert_eq!(row.get("domain").unwrap(), record.get("tld").cloned().unwrap());
    }

    #[test]
    fn test_fill_keeps_failures_per_cell() {
        let binder = binder(vec![
            ColumnDefinition::new("name"),
            ColumnDefinition::new("bad").accessor("nope"),
            ColumnDefinition::new("secret").accessor("tld").inaccessible(),
        ]);
        let record = germany();
        let cells = binder.fill(&record);
        let row = binder.bind_cells(record, cells);
        assert_eq!(row.get("name").unwrap(), Value::from("Germany"));
        assert!(matches!(row.get("bad"), Err(TableError::Resolution { .. })));
        assert_eq!(row.get("secret"), Err(TableError::Access("secret".to_string())));
        assert_eq!(row.values().len(), 2);
    }
}
