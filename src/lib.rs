//! Column binding, cell resolution and multi-key ordering for tabular data.
//!
//! A [`Table`] presents a [`DataSource`] through a [`ColumnRegistry`]: every
//! record is resolved into named cells (following accessor paths through
//! related records and falling back to column defaults), and the rows are
//! ordered by a validated, multi-key [`OrderBy`] request.

pub(crate) mod common;
pub(crate) mod db;
pub(crate) mod model;

pub use common::error::TableError;
pub use db::{
    ordering::{OrderBy, OrderKey, OrderSpec, OrderToken, OrderingEngine, order_by_param},
    snapshot::{Rows, Snapshot},
    source::{DataSource, MemorySource, OrderPath},
    table::{
        Table,
        bound_column::BoundColumn,
        column_def::{ColumnDefault, ColumnDefinition, DefaultFn, Direction},
        options::TableOptions,
        row::{BoundRow, RowBinder},
        schema::{ColumnRegistry, SchemaField},
        table_def::TableDef,
    },
};
pub use model::{
    record::{Record, RecordKind},
    types::{Derived, Value},
};
