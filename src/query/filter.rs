//! Filter and filter-group types shared by all dialects.

use std::fmt;

use crate::model::Value;

/// Comparison operator of a single filter condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// Exact equality.
    Equals,
    /// Exact inequality.
    NotEquals,
    /// Strictly greater.
    GreaterThan,
    /// Greater or equal.
    GreaterOrEqual,
    /// Strictly less.
    LessThan,
    /// Less or equal.
    LessOrEqual,
    /// Loose match: equality for numbers/dates/booleans, substring match
    /// for strings.
    Is,
    /// Negated loose match.
    IsNot,
    /// Membership in a value list.
    In,
    /// Negated membership in a value list.
    NotIn,
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Comparator::Equals => "EQUALS",
            Comparator::NotEquals => "NOT_EQUALS",
            Comparator::GreaterThan => "GREATER_THAN",
            Comparator::GreaterOrEqual => "GREATER_OR_EQUAL",
            Comparator::LessThan => "LESS_THAN",
            Comparator::LessOrEqual => "LESS_OR_EQUAL",
            Comparator::Is => "IS",
            Comparator::IsNot => "IS_NOT",
            Comparator::In => "IN",
            Comparator::NotIn => "NOT_IN",
        };
        f.write_str(name)
    }
}

/// Logical operator joining the members of a [`FilterGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupOperator {
    /// All members must match.
    #[default]
    And,
    /// Any member must match.
    Or,
    /// Exactly one member must match. Not supported by the OData dialects;
    /// translation fails explicitly.
    Xor,
}

impl fmt::Display for GroupOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupOperator::And => "AND",
            GroupOperator::Or => "OR",
            GroupOperator::Xor => "XOR",
        };
        f.write_str(name)
    }
}

/// One filter condition: attribute (or raw address), comparator and compare
/// value.
///
/// A filter may instead be *compound*, wrapping a nested [`FilterGroup`] to
/// express composite-key conditions.
///
/// # Example
///
/// ```
/// use wirequery::query::Filter;
///
/// let open = Filter::equals("Status", "open");
/// let big = Filter::greater_than("Total", 1_000i64);
/// let keys = Filter::in_list("Id", vec![1i64, 2, 3]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Attribute alias, or a raw data address unknown to the model.
    pub attribute: String,
    /// Comparison operator.
    pub comparator: Comparator,
    /// Compare value (scalar or list).
    pub value: Value,
    /// Apply this filter locally after the fetch instead of remotely.
    pub apply_locally: bool,
    /// Nested group for compound (multi-column key) filters.
    pub nested: Option<Box<FilterGroup>>,
}

impl Filter {
    /// Creates a filter with an explicit comparator.
    pub fn new(attribute: impl Into<String>, comparator: Comparator, value: impl Into<Value>) -> Self {
        Self {
            attribute: attribute.into(),
            comparator,
            value: value.into(),
            apply_locally: false,
            nested: None,
        }
    }

    /// Creates an `EQUALS` filter.
    pub fn equals(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(attribute, Comparator::Equals, value)
    }

    /// Creates a `NOT_EQUALS` filter.
    pub fn not_equals(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(attribute, Comparator::NotEquals, value)
    }

    /// Creates a `GREATER_THAN` filter.
    pub fn greater_than(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(attribute, Comparator::GreaterThan, value)
    }

    /// Creates a `LESS_THAN` filter.
    pub fn less_than(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(attribute, Comparator::LessThan, value)
    }

    /// Creates an `IS` filter (substring match for strings).
    pub fn is(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(attribute, Comparator::Is, value)
    }

    /// Creates an `IN` filter over a value list.
    pub fn in_list(attribute: impl Into<String>, values: impl Into<Value>) -> Self {
        Self::new(attribute, Comparator::In, values)
    }

    /// Creates a compound filter wrapping a nested group.
    pub fn compound(group: FilterGroup) -> Self {
        Self {
            attribute: String::new(),
            comparator: Comparator::Equals,
            value: Value::Null,
            apply_locally: false,
            nested: Some(Box::new(group)),
        }
    }

    /// Joins this filter with another into an `AND` group.
    pub fn and_also(self, other: Filter) -> FilterGroup {
        FilterGroup::and([self, other])
    }

    /// Joins this filter with another into an `OR` group.
    pub fn or_else(self, other: Filter) -> FilterGroup {
        FilterGroup::or([self, other])
    }

    /// Marks this filter for local post-fetch application.
    pub fn locally(mut self) -> Self {
        self.apply_locally = true;
        self
    }

    /// Returns `true` if this filter wraps a nested group.
    pub fn is_compound(&self) -> bool {
        self.nested.is_some()
    }

    /// Returns a copy of this filter with a different comparator and value.
    ///
    /// Translation never mutates filters in place; simplifications (e.g.
    /// single-value `IN` rewritten as `EQUALS`) produce new filters.
    pub fn with_condition(&self, comparator: Comparator, value: Value) -> Self {
        Self {
            attribute: self.attribute.clone(),
            comparator,
            value,
            apply_locally: self.apply_locally,
            nested: None,
        }
    }

    /// Human-readable rendering used in error messages.
    pub fn describe(&self) -> String {
        format!("{} {} {}", self.attribute, self.comparator, self.value.as_text())
    }
}

/// An ordered group of filters and nested groups joined by one logical
/// operator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterGroup {
    /// Logical operator joining all members.
    pub operator: GroupOperator,
    /// Direct filter conditions.
    pub filters: Vec<Filter>,
    /// Nested sub-groups.
    pub groups: Vec<FilterGroup>,
}

impl FilterGroup {
    /// Creates an empty group with the given operator.
    pub fn new(operator: GroupOperator) -> Self {
        Self {
            operator,
            filters: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Creates an `AND` group from filters.
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self {
            operator: GroupOperator::And,
            filters: filters.into_iter().collect(),
            groups: Vec::new(),
        }
    }

    /// Creates an `OR` group from filters.
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self {
            operator: GroupOperator::Or,
            filters: filters.into_iter().collect(),
            groups: Vec::new(),
        }
    }

    /// Adds a filter to this group.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Adds a nested group.
    pub fn with_group(mut self, group: FilterGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Returns `true` if the group contains no conditions at any depth.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.groups.iter().all(FilterGroup::is_empty)
    }

    /// Unwraps single-child wrapper groups.
    ///
    /// A group with zero direct filters and exactly one nested group is
    /// semantically equivalent to that nested group; translation flattens it
    /// so no extra parentheses are emitted.
    pub fn flattened(&self) -> &FilterGroup {
        let mut group = self;
        while group.filters.is_empty() && group.groups.len() == 1 {
            group = &group.groups[0];
        }
        group
    }

    /// Iterates over all filters in this group and its sub-groups.
    pub fn iter_all(&self) -> Box<dyn Iterator<Item = &Filter> + '_> {
        Box::new(
            self.filters
                .iter()
                .chain(self.groups.iter().flat_map(|g| g.iter_all())),
        )
    }

    /// Finds a direct or nested filter on the given attribute.
    pub fn find(&self, attribute: &str) -> Option<&Filter> {
        self.iter_all().find(|f| f.attribute == attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_child_wrapper_is_flattened() {
        let inner = FilterGroup::and([
            Filter::equals("a", 1i32),
            Filter::equals("b", 2i32),
        ]);
        let wrapper = FilterGroup::new(GroupOperator::And).with_group(inner.clone());
        assert_eq!(wrapper.flattened(), &inner);

        let double = FilterGroup::new(GroupOperator::Or)
            .with_group(FilterGroup::new(GroupOperator::And).with_group(inner.clone()));
        assert_eq!(double.flattened(), &inner);
    }

    #[test]
    fn test_group_with_direct_filter_is_not_flattened() {
        let group = FilterGroup::and([Filter::equals("a", 1i32)])
            .with_group(FilterGroup::or([Filter::equals("b", 2i32)]));
        assert_eq!(group.flattened(), &group);
    }

    #[test]
    fn test_emptiness_is_recursive() {
        let group = FilterGroup::new(GroupOperator::And)
            .with_group(FilterGroup::new(GroupOperator::Or));
        assert!(group.is_empty());
        assert!(!group
            .with_filter(Filter::equals("a", 1i32))
            .is_empty());
    }

    #[test]
    fn test_combinators_build_groups() {
        let group = Filter::equals("a", 1i32).and_also(Filter::equals("b", 2i32));
        assert_eq!(group.operator, GroupOperator::And);
        assert_eq!(group.filters.len(), 2);

        let either = Filter::equals("a", 1i32).or_else(Filter::equals("a", 2i32));
        assert_eq!(either.operator, GroupOperator::Or);
    }

    #[test]
    fn test_find_descends_into_groups() {
        let group = FilterGroup::new(GroupOperator::And)
            .with_group(FilterGroup::or([Filter::equals("deep", 1i32)]));
        assert!(group.find("deep").is_some());
        assert!(group.find("absent").is_none());
    }
}
