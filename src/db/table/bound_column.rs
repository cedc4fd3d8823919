use crate::db::{
    ordering::OrderBy,
    table::column_def::{ColumnDefinition, Direction},
};

/// A column as seen by one table, aware of the table's current ordering.
///
/// The `order_by*` helpers return the ordering a link on this column's
/// header would request.
#[derive(Debug, Clone, Copy)]
pub struct BoundColumn<'a> {
    column: &'a ColumnDefinition,
    order_by: &'a OrderBy,
    sortable: bool,
}

impl<'a> BoundColumn<'a> {
    pub(crate) fn new(column: &'a ColumnDefinition, order_by: &'a OrderBy, sortable: bool) -> Self {
        Self {
            column,
            order_by,
            sortable,
        }
    }

    pub fn definition(&self) -> &'a ColumnDefinition {
        self.column
    }

    pub fn name(&self) -> &'a str {
        self.column.name()
    }

    pub fn verbose_name(&self) -> String {
        self.column.verbose_name()
    }

    pub fn is_visible(&self) -> bool {
        self.column.is_visible()
    }

    pub fn direction(&self) -> Direction {
        self.column.direction()
    }

    /// Whether the table will accept this column as an ordering key.
    pub fn sortable(&self) -> bool {
        self.sortable
    }

    pub fn name_reversed(&self) -> String {
        format!("-{}", self.name())
    }

    /// The token that flips this column's current ordering.
    pub fn name_toggled(&self) -> String {
        if self.is_ordered_straight() {
            self.name_reversed()
        } else {
            self.name().to_string()
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.order_by.contains(self.name())
    }

    pub fn is_ordered_reverse(&self) -> bool {
        self.order_by.get(self.name()).is_some_and(|token| token.reverse)
    }

    pub fn is_ordered_straight(&self) -> bool {
        self.order_by.get(self.name()).is_some_and(|token| !token.reverse)
    }

    pub fn order_by(&self) -> OrderBy {
        self.order_by.polarize(false, &[self.name()])
    }

    pub fn order_by_reversed(&self) -> OrderBy {
        self.order_by.polarize(true, &[self.name()])
    }

    pub fn order_by_toggled(&self) -> OrderBy {
        self.order_by.toggle(&[self.name()])
    }
}
