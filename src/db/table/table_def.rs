use std::sync::Arc;

use super::{
    column_def::ColumnDefinition,
    options::TableOptions,
    schema::{ColumnRegistry, SchemaField},
};

/// A table declaration: the columns a table type declares, the declaration
/// it extends, an optional external schema and its options.
///
/// Each declared column receives the next sequence number of the declaration
/// chain, so declaration order survives merging. A child declaration inherits
/// its parent's schema and options unless it sets its own.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tablekit::{ColumnDefinition, TableDef};
///
/// let base = Arc::new(
///     TableDef::new("books")
///         .column(ColumnDefinition::new("id"))
///         .column(ColumnDefinition::new("name")),
/// );
/// let child = TableDef::extends("long_books", &base)
///     .column(ColumnDefinition::new("pages"))
///     .column(ColumnDefinition::new("name").accessor("title"));
///
/// assert_eq!(child.registry().names(), vec!["id", "name", "pages"]);
/// ```
#[derive(Debug, Clone)]
pub struct TableDef {
    name: String,
    parent: Option<Arc<TableDef>>,
    declared: Vec<ColumnDefinition>,
    schema: Option<Vec<SchemaField>>,
    options: TableOptions,
    next_order: u64,
}

impl TableDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            parent: None,
            declared: Vec::new(),
            schema: None,
            options: TableOptions::default(),
            next_order: 0,
        }
    }

    /// Starts a declaration that inherits from `parent`.
    pub fn extends(name: &str, parent: &Arc<TableDef>) -> Self {
        Self {
            name: name.to_owned(),
            parent: Some(Arc::clone(parent)),
            declared: Vec::new(),
            schema: parent.schema.clone(),
            options: parent.options.clone(),
            next_order: parent.next_order,
        }
    }

    /// Declares a column. Declaring a name twice keeps the later definition.
    pub fn column(mut self, mut column: ColumnDefinition) -> Self {
        column.creation_order = self.next_order;
        self.next_order += 1;
        match self.declared.iter().position(|c| c.name == column.name) {
            Some(index) => self.declared[index] = column,
            None => self.declared.push(column),
        }
        self
    }

    /// Synthesises columns from these schema fields.
    pub fn schema(mut self, fields: Vec<SchemaField>) -> Self {
        self.schema = Some(fields);
        self
    }

    pub fn options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<TableDef>> {
        self.parent.as_ref()
    }

    pub fn table_options(&self) -> &TableOptions {
        &self.options
    }

    pub fn schema_fields(&self) -> Option<&[SchemaField]> {
        self.schema.as_deref()
    }

    /// Inherited columns and this level's own declarations, in creation order.
    fn levels(&self) -> (Vec<ColumnDefinition>, Vec<ColumnDefinition>) {
        let inherited = self
            .parent
            .as_ref()
            .map(|parent| parent.declared_columns())
            .unwrap_or_default();
        let mut own = self.declared.clone();
        own.sort_by_key(|c| c.creation_order);
        (inherited, own)
    }

    /// Columns declared along the inheritance chain, schema excluded.
    pub fn declared_columns(&self) -> Vec<ColumnDefinition> {
        let (inherited, own) = self.levels();
        ColumnRegistry::build(&own, &inherited, None, &[], &[])
            .iter()
            .cloned()
            .collect()
    }

    /// Builds the column registry of this declaration.
    pub fn registry(&self) -> ColumnRegistry {
        let (inherited, own) = self.levels();
        ColumnRegistry::build(
            &own,
            &inherited,
            self.schema.as_deref(),
            &self.options.columns,
            &self.options.exclude,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn country_schema() -> Vec<SchemaField> {
        ["id", "name", "population", "capital", "tld", "system", "null", "null2"]
            .into_iter()
            .map(SchemaField::new)
            .collect()
    }

    fn city_schema() -> Vec<SchemaField> {
        ["id", "name", "population"]
            .into_iter()
            .map(SchemaField::new)
            .collect()
    }

    #[test]
    fn test_creation_order_increases_along_chain() {
        let base = Arc::new(
            TableDef::new("base")
                .column(ColumnDefinition::new("a"))
                .column(ColumnDefinition::new("b")),
        );
        let child = TableDef::extends("child", &base).column(ColumnDefinition::new("c"));
        let orders: Vec<u64> = child
            .declared_columns()
            .iter()
            .map(|c| c.creation_order())
            .collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_child_inherits_declared_columns_with_different_schema() {
        let country = Arc::new(
            TableDef::new("country")
                .schema(country_schema())
                .options(TableOptions::default().exclude(["tld"]))
                .column(ColumnDefinition::new("capital").with_verbose_name("Name of capital"))
                .column(ColumnDefinition::new("projected")),
        );
        assert_eq!(country.registry().len(), 8);

        let city = TableDef::extends("city", &country)
            .schema(city_schema())
            .options(
                TableOptions::default()
                    .columns(["id", "name"])
                    .exclude(["capital"]),
            );
        let registry = city.registry();
        assert_eq!(registry.len(), 4);
        assert!(registry.contains("projected"));
        assert!(registry.contains("capital"));
        assert!(!registry.contains("population"));
    }

    #[test]
    fn test_child_without_own_options_inherits_parent_options() {
        let base = Arc::new(
            TableDef::new("base").options(TableOptions::default().order_by("-name")),
        );
        let child = TableDef::extends("child", &base);
        assert_eq!(child.table_options().default_order_by.as_deref(), Some("-name"));
    }

    #[test]
    fn test_parent_registry_unchanged_by_child() {
        let base = Arc::new(TableDef::new("base").column(ColumnDefinition::new("a")));
        let _child = TableDef::extends("child", &base).column(ColumnDefinition::new("test"));
        assert_eq!(base.registry().names(), vec!["a"]);
    }
}
