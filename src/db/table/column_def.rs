use std::{cmp::Ordering, fmt, str::FromStr, sync::Arc};

use miette::Result;
use strum::{Display, EnumString};

use crate::{TableError, Value, db::table::row::BoundRow};

/// Sort direction of an ordering key.
///
/// Parsed case-insensitively from `"asc"` / `"desc"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum Direction {
    #[default]
    #[strum(serialize = "asc")]
    Ascending,

    #[strum(serialize = "desc")]
    Descending,
}

impl Direction {
    /// Parses a direction token, failing with [`TableError::InvalidDirection`].
    pub fn parse(token: &str) -> Result<Self, TableError> {
        Self::from_str(token).map_err(|_| TableError::InvalidDirection(token.to_string()))
    }

    pub fn reversed(self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }

    /// Orients an ascending comparison result.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

/// Signature of a computed column default.
pub type DefaultFn = dyn Fn(&BoundRow) -> Result<Value, TableError> + Send + Sync;

/// Value used when a column resolves to nothing.
#[derive(Clone)]
pub enum ColumnDefault {
    Literal(Value),

    /// Computed from a view of the same row, so it may read other columns.
    Computed(Arc<DefaultFn>),
}

impl fmt::Debug for ColumnDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnDefault::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            ColumnDefault::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Definition of a single table column.
///
/// Describes how the column is labelled, where its value comes from, what to
/// show when there is no value, and how it takes part in ordering.
///
/// # Example
///
/// ```
/// use tablekit::{ColumnDefinition, Direction};
///
/// let domain = ColumnDefinition::new("domain").accessor("tld");
/// assert_eq!(domain.accessor_path(), "tld");
/// assert_eq!(domain.verbose_name(), "Domain");
///
/// let id = ColumnDefinition::new("id").try_direction("DESC").unwrap();
/// assert_eq!(id.direction(), Direction::Descending);
/// ```
#[derive(Debug, Clone)]
pub struct ColumnDefinition {
    pub(crate) name: String,
    pub(crate) verbose_name: Option<String>,
    pub(crate) accessor: Option<String>,
    pub(crate) sort_paths: Vec<String>,
    pub(crate) default: Option<ColumnDefault>,
    pub(crate) visible: bool,
    pub(crate) accessible: bool,
    pub(crate) sortable: Option<bool>,
    pub(crate) direction: Direction,
    pub(crate) creation_order: u64,
}

impl ColumnDefinition {
    /// Creates a visible, accessible column with no default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verbose_name: None,
            accessor: None,
            sort_paths: Vec::new(),
            default: None,
            visible: true,
            accessible: true,
            sortable: None,
            direction: Direction::Ascending,
            creation_order: 0,
        }
    }

    pub fn with_verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
        self.verbose_name = Some(verbose_name.into());
        self
    }

    /// Reads the value from `path` instead of from the column name.
    pub fn accessor(mut self, path: impl Into<String>) -> Self {
        self.accessor = Some(path.into());
        self
    }

    /// Orders natively by these paths instead of the accessor path.
    pub fn sort_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(ColumnDefault::Literal(value.into()));
        self
    }

    pub fn default_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&BoundRow) -> Result<Value, TableError> + Send + Sync + 'static,
    {
        self.default = Some(ColumnDefault::Computed(Arc::new(f)));
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Makes the column impossible to read, not just hidden.
    pub fn inaccessible(mut self) -> Self {
        self.accessible = false;
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = Some(sortable);
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Sets the default direction from a token such as `"desc"`.
    pub fn try_direction(mut self, token: &str) -> Result<Self, TableError> {
        self.direction = Direction::parse(token)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display label; a humanized form of the name unless overridden.
    pub fn verbose_name(&self) -> String {
        match &self.verbose_name {
            Some(verbose_name) => verbose_name.clone(),
            None => humanize(&self.name),
        }
    }

    pub fn accessor_path(&self) -> &str {
        self.accessor.as_deref().unwrap_or(&self.name)
    }

    /// Paths handed to a native-ordering source for this column.
    pub fn order_paths(&self) -> Vec<&str> {
        if self.sort_paths.is_empty() {
            vec![self.accessor_path()]
        } else {
            self.sort_paths.iter().map(String::as_str).collect()
        }
    }

    pub fn column_default(&self) -> Option<&ColumnDefault> {
        self.default.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_accessible(&self) -> bool {
        self.accessible
    }

    /// The explicit sortable flag; `None` means "decided by the table".
    pub fn sortable_flag(&self) -> Option<bool> {
        self.sortable
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn creation_order(&self) -> u64 {
        self.creation_order
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn set_sortable(&mut self, sortable: Option<bool>) {
        self.sortable = sortable;
    }

    /// Re-sets the default direction; an invalid token leaves it unchanged.
    pub fn set_direction(&mut self, token: &str) -> Result<(), TableError> {
        self.direction = Direction::parse(token)?;
        Ok(())
    }
}

/// `"num_pages"` -> `"Num pages"`.
pub(crate) fn humanize(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
