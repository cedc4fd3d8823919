use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while declaring columns, binding rows or ordering a table.
///
/// Invalid ordering tokens are normally dropped silently and never reach this
/// type; [`TableError::InvalidOrdering`] only appears when a table is
/// configured to reject invalid options.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum TableError {
    /// A direction token other than `asc` / `desc`.
    #[error("Invalid direction value: {0}")]
    #[diagnostic(
        code(tablekit::invalid_direction),
        help("use \"asc\" or \"desc\" (case-insensitive)")
    )]
    InvalidDirection(String),

    /// An accessor path names an attribute that does not exist on the record.
    #[error("Could not resolve {segment} from {path}")]
    #[diagnostic(
        code(tablekit::resolution),
        help("check the accessor path configured for this column")
    )]
    Resolution { segment: String, path: String },

    /// The column is marked inaccessible.
    #[error("Column {0} is not accessible")]
    #[diagnostic(code(tablekit::access))]
    Access(String),

    /// No column with this name exists in the registry.
    #[error("Column not found: {0}")]
    #[diagnostic(code(tablekit::column_not_found))]
    ColumnNotFound(String),

    /// A computed default read the column it is computing.
    #[error("Default value of column {0} refers to the column itself")]
    #[diagnostic(code(tablekit::self_referential_default))]
    SelfReferentialDefault(String),

    /// An ordering request was rejected in strict mode.
    #[error("Invalid ordering: {0}")]
    #[diagnostic(
        code(tablekit::invalid_ordering),
        help("only existing, accessible and sortable columns can be ordered")
    )]
    InvalidOrdering(String),
}
