//! Filter predicate translation.
//!
//! One [`FilterTranslator`] per dialect turns a single [`Filter`] into a
//! predicate string and composes nested AND/OR groups recursively. Filters
//! that cannot be applied remotely translate to `None` and are left for
//! local post-fetch application.

mod json;
mod odata;

pub use json::JsonParamTranslator;
pub use odata::ODataTranslator;
pub use odata::ODataVersion;

use crate::error::QueryError;
use crate::model::DataType;
use crate::model::EntitySource;
use crate::query::Comparator;
use crate::query::Filter;
use crate::query::FilterGroup;
use crate::query::GroupOperator;

/// Where a filter is applied.
pub(crate) enum FilterTarget<'a> {
    /// Emit a remote predicate for this parameter.
    Remote {
        /// The remote filter parameter (field name or expression).
        param: &'a str,
        /// Declared semantic type of the attribute.
        data_type: DataType,
        /// Wire-protocol type hint, if configured.
        hint: Option<&'a str>,
        /// Prefix injected before the encoded value.
        prefix: Option<&'a str>,
    },
    /// Do not filter remotely; apply locally after the fetch.
    Local,
}

/// Resolves the effective remote filter parameter for one filter.
///
/// Order: the per-attribute override, else the raw data address when it is a
/// true remote expression, else local. Attribute aliases unknown to the
/// entity are treated as raw addresses.
pub(crate) fn resolve_target<'a>(
    filter: &'a Filter,
    entity: &'a EntitySource,
) -> FilterTarget<'a> {
    if filter.apply_locally {
        return FilterTarget::Local;
    }
    match entity.attribute(&filter.attribute) {
        Some(attribute) => match attribute.remote_filter_param() {
            Some(param) => FilterTarget::Remote {
                param,
                data_type: attribute.data_type(),
                hint: attribute.remote_type(),
                prefix: attribute.options().filter_remote_prefix.as_deref(),
            },
            None => FilterTarget::Local,
        },
        None => {
            if filter.attribute.is_empty() || filter.attribute.contains("[#") {
                FilterTarget::Local
            } else {
                FilterTarget::Remote {
                    param: &filter.attribute,
                    data_type: DataType::String,
                    hint: None,
                    prefix: None,
                }
            }
        }
    }
}

/// A dialect's filter predicate grammar.
pub trait FilterTranslator {
    /// Dialect name for error messages.
    fn dialect(&self) -> &'static str;

    /// Translates one filter into a predicate, or `None` when the filter is
    /// to be applied locally.
    fn translate_filter(
        &self,
        filter: &Filter,
        entity: &EntitySource,
    ) -> Result<Option<String>, QueryError>;

    /// Translates a whole filter tree into one predicate string.
    fn translate_group(
        &self,
        group: &FilterGroup,
        entity: &EntitySource,
    ) -> Result<Option<String>, QueryError> {
        compose_group(self, group, entity, true)
    }
}

/// Recursive group composition shared by the predicate dialects.
///
/// Children are joined with the lower-cased logical operator. Nested groups
/// are parenthesized; the top-level group is not. Single-child wrapper
/// groups are flattened first so no extra parentheses appear.
pub(crate) fn compose_group<T: FilterTranslator + ?Sized>(
    translator: &T,
    group: &FilterGroup,
    entity: &EntitySource,
    top_level: bool,
) -> Result<Option<String>, QueryError> {
    let group = group.flattened();
    let keyword = match group.operator {
        GroupOperator::And => "and",
        GroupOperator::Or => "or",
        GroupOperator::Xor => {
            return Err(QueryError::unsupported_operator(
                GroupOperator::Xor,
                translator.dialect(),
            ))
        }
    };

    let mut parts = Vec::new();
    for filter in &group.filters {
        if let Some(nested) = filter.nested.as_deref() {
            if let Some(predicate) = compose_group(translator, nested, entity, false)? {
                parts.push(predicate);
            }
            continue;
        }
        if let Some(predicate) = translator.translate_filter(filter, entity)? {
            parts.push(predicate);
        }
    }
    for nested in &group.groups {
        if let Some(predicate) = compose_group(translator, nested, entity, false)? {
            parts.push(predicate);
        }
    }

    Ok(match parts.len() {
        0 => None,
        1 => parts.pop(),
        _ => {
            let joined = parts.join(&format!(" {keyword} "));
            Some(if top_level {
                joined
            } else {
                format!("({joined})")
            })
        }
    })
}

/// Rewrites a single-value `IN`/`NOT_IN` filter as the equivalent equality
/// filter.
///
/// Pure: returns a new filter, never mutates the query mid-translation.
/// Several OData services reject `in` with one member, so this is required
/// behavior, not an optimization.
pub fn simplify_single_in(filter: &Filter, single: crate::model::Value) -> Filter {
    let comparator = match filter.comparator {
        Comparator::NotIn => Comparator::NotEquals,
        _ => Comparator::Equals,
    };
    filter.with_condition(comparator, single)
}
