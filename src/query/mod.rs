//! Dialect-neutral structured query model.
//!
//! A [`DataQuery`] bundles everything a read or write operation carries:
//! a filter tree, sorters, a pagination window and (for CRUD) value rows.
//! The per-dialect compilers in [`crate::build`] turn it into requests.

mod filter;
mod sorter;
mod window;

pub use filter::Comparator;
pub use filter::Filter;
pub use filter::FilterGroup;
pub use filter::GroupOperator;
pub use sorter::Direction;
pub use sorter::Sorter;
pub use window::QueryWindow;

use crate::model::Value;

/// One logical row of values for a CRUD operation.
///
/// Values are kept in submission order as (attribute alias, value) pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueRow {
    values: Vec<(String, Value)>,
}

impl ValueRow {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value for an attribute.
    pub fn with_value(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.push((attribute.into(), value.into()));
        self
    }

    /// Returns the (attribute, value) pairs in submission order.
    pub fn values(&self) -> &[(String, Value)] {
        &self.values
    }

    /// Looks up the value for an attribute alias.
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(alias, _)| alias == attribute)
            .map(|(_, value)| value)
    }
}

/// A dialect-neutral structured query.
///
/// # Example
///
/// ```
/// use wirequery::query::{DataQuery, Filter, QueryWindow, Sorter};
///
/// let query = DataQuery::new()
///     .filter(Filter::equals("Status", "open"))
///     .sort(Sorter::desc("Total"))
///     .window(QueryWindow::new(20, 10));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DataQuery {
    filters: FilterGroup,
    sorters: Vec<Sorter>,
    window: QueryWindow,
    rows: Vec<ValueRow>,
}

impl DataQuery {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter to the root `AND` group.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.filters.push(filter);
        self
    }

    /// Replaces the whole filter tree.
    pub fn filter_group(mut self, group: FilterGroup) -> Self {
        self.filters = group;
        self
    }

    /// Adds a sort key.
    pub fn sort(mut self, sorter: Sorter) -> Self {
        self.sorters.push(sorter);
        self
    }

    /// Sets the pagination window.
    pub fn window(mut self, window: QueryWindow) -> Self {
        self.window = window;
        self
    }

    /// Adds a value row for a CRUD operation.
    pub fn row(mut self, row: ValueRow) -> Self {
        self.rows.push(row);
        self
    }

    /// Returns the filter tree.
    pub fn filters(&self) -> &FilterGroup {
        &self.filters
    }

    /// Returns the sort keys in priority order.
    pub fn sorters(&self) -> &[Sorter] {
        &self.sorters
    }

    /// Returns the pagination window.
    pub fn query_window(&self) -> QueryWindow {
        self.window
    }

    /// Returns the CRUD value rows.
    pub fn rows(&self) -> &[ValueRow] {
        &self.rows
    }
}
