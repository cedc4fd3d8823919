use tracing::debug;

use super::column_def::ColumnDefinition;

/// A field reported by an external schema, pre-resolved into the triple the
/// registry needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    /// The column name synthesised for this field.
    pub name: String,

    /// Human readable label, if the schema carries one.
    pub verbose_name: Option<String>,

    /// Accessor path of the field on a record.
    pub path: String,
}

impl SchemaField {
    /// Creates a field whose path equals its name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            verbose_name: None,
            path: name.to_owned(),
        }
    }

    pub fn with_verbose_name(mut self, verbose_name: &str) -> Self {
        self.verbose_name = Some(verbose_name.to_owned());
        self
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.path = path.to_owned();
        self
    }

    fn to_column(&self, creation_order: u64) -> ColumnDefinition {
        let mut column = ColumnDefinition::new(self.name.clone()).accessor(self.path.clone());
        column.verbose_name = self.verbose_name.clone();
        column.creation_order = creation_order;
        column
    }
}

/// An ordered, name-keyed collection of column definitions.
///
/// Names are unique; iteration follows registry order.
///
/// # Example
///
/// ```
/// use tablekit::{ColumnDefinition, ColumnRegistry, SchemaField};
///
/// let schema = [SchemaField::new("id"), SchemaField::new("name"), SchemaField::new("tld")];
/// let declared = [ColumnDefinition::new("domain").accessor("tld")];
///
/// let registry = ColumnRegistry::build(&declared, &[], Some(&schema[..]), &[], &["tld".to_string()]);
/// assert_eq!(registry.names(), vec!["id", "name", "domain"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ColumnRegistry {
    columns: Vec<ColumnDefinition>,
}

impl ColumnRegistry {
    /// Creates a registry from already merged columns.
    ///
    /// Later definitions replace earlier ones of the same name in place.
    pub fn new(columns: Vec<ColumnDefinition>) -> Self {
        let mut registry = Self::default();
        for column in columns {
            registry.upsert(column);
        }
        registry
    }

    /// Assembles a registry from one declaration level.
    ///
    /// `ancestors` are the columns inherited from parent declarations, in
    /// their registry order; `declared` override them by name and append new
    /// names. When a `schema` is supplied, one column is synthesised per field,
    /// filtered by `exclude` and reordered by `include`. Declared and inherited
    /// columns always win over synthesised ones and are never removed by
    /// `exclude`. Names in `include` that exist nowhere are dropped.
    pub fn build(
        declared: &[ColumnDefinition],
        ancestors: &[ColumnDefinition],
        schema: Option<&[SchemaField]>,
        include: &[String],
        exclude: &[String],
    ) -> Self {
        let mut merged = Self::new(ancestors.to_vec());
        for column in declared {
            merged.upsert(column.clone());
        }

        let synthesised: Vec<ColumnDefinition> = schema
            .unwrap_or_default()
            .iter()
            .filter(|field| !exclude.contains(&field.name))
            .enumerate()
            .map(|(i, field)| field.to_column(i as u64))
            .collect();

        let block: Vec<ColumnDefinition> = if include.is_empty() {
            synthesised
        } else {
            include
                .iter()
                .filter_map(|name| {
                    merged
                        .get(name)
                        .or_else(|| synthesised.iter().find(|c| &c.name == name))
                        .cloned()
                })
                .collect()
        };

        let mut registry = Self::default();
        for column in block {
            let column = merged.get(&column.name).cloned().unwrap_or(column);
            registry.upsert(column);
        }
        for column in merged.columns {
            if !registry.contains(&column.name) {
                registry.columns.push(column);
            }
        }

        debug!(
            columns = registry.len(),
            declared = declared.len(),
            inherited = ancestors.len(),
            "assembled column registry"
        );
        registry
    }

    fn upsert(&mut self, column: ColumnDefinition) {
        match self.index_of(&column.name) {
            Some(index) => self.columns[index] = column,
            None => self.columns.push(column),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Finds the position of a column by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|col| col.name == name)
    }

    pub fn get_index(&self, index: usize) -> Option<&ColumnDefinition> {
        self.columns.get(index)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ColumnDefinition> {
        self.columns.iter_mut().find(|col| col.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnDefinition> {
        self.columns.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|col| col.name.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a ColumnRegistry {
    type Item = &'a ColumnDefinition;
    type IntoIter = std::slice::Iter<'a, ColumnDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}
