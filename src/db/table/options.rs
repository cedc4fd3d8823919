/// Per-table configuration.
///
/// # Example
///
/// ```
/// use tablekit::TableOptions;
///
/// let options = TableOptions::default()
///     .order_by("-name")
///     .sortable(false)
///     .exclude(["id"]);
/// assert_eq!(options.default_order_by.as_deref(), Some("-name"));
/// assert!(options.ignore_invalid_options);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOptions {
    /// Ordering applied when a table is created without an explicit one.
    pub default_order_by: Option<String>,

    /// Sortability of columns that do not set it themselves. `None` means
    /// sortable.
    pub sortable: Option<bool>,

    /// Drop invalid ordering tokens silently instead of failing.
    pub ignore_invalid_options: bool,

    /// Separator between the segments of an accessor path.
    pub path_separator: String,

    /// Schema fields to turn into columns, in this order. Empty means all.
    pub columns: Vec<String>,

    /// Schema fields never turned into columns.
    pub exclude: Vec<String>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            default_order_by: None,
            sortable: None,
            ignore_invalid_options: true,
            path_separator: ".".to_string(),
            columns: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

impl TableOptions {
    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.default_order_by = Some(order_by.into());
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = Some(sortable);
        self
    }

    pub fn ignore_invalid_options(mut self, ignore: bool) -> Self {
        self.ignore_invalid_options = ignore;
        self
    }

    pub fn path_separator(mut self, separator: impl Into<String>) -> Self {
        self.path_separator = separator.into();
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn exclude<I, S>(mut self, exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = exclude.into_iter().map(Into::into).collect();
        self
    }

    /// Whether a column with the given explicit flag may be ordered.
    pub fn effective_sortable(&self, flag: Option<bool>) -> bool {
        flag.or(self.sortable).unwrap_or(true)
    }
}
