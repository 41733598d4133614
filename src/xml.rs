//! XML query document generation for the legacy XML dialect.
//!
//! The XML dialect does not use a query string; filters, sorters and the
//! pagination window are rendered into one XML document that is sent as the
//! request body. The document is assembled by string templating with
//! attribute escaping; responses are JSON and go through the regular row
//! extractor.

use crate::codec::JsonCodec;
use crate::codec::ValueCodec;
use crate::error::QueryError;
use crate::model::EntitySource;
use crate::query::Comparator;
use crate::query::DataQuery;
use crate::query::Direction;
use crate::query::Filter;
use crate::query::FilterGroup;
use crate::query::GroupOperator;
use crate::translate::resolve_target;
use crate::translate::FilterTarget;

/// Escapes a string for use in XML attribute values.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Renders the full query document for an entity.
pub fn query_document(entity: &EntitySource, query: &DataQuery) -> Result<String, QueryError> {
    let mut root_attrs = vec![format!(r#"entity="{}""#, escape_xml(entity.data_address()))];
    let window = query.query_window();
    if window.offset() > 0 {
        root_attrs.push(format!(r#"skip="{}""#, window.offset()));
    }
    if !window.is_unbounded() {
        root_attrs.push(format!(r#"top="{}""#, window.limit()));
    }

    let mut content = String::new();
    let filters = filter_group_to_xml(query.filters(), entity, true)?;
    content.push_str(&filters);
    for sorter in query.sorters() {
        let attribute = entity
            .attribute(&sorter.attribute)
            .and_then(|a| a.remote_sort_param())
            .unwrap_or(&sorter.attribute);
        content.push_str(&format!(
            r#"<order attribute="{}" descending="{}"/>"#,
            escape_xml(attribute),
            matches!(sorter.direction, Direction::Desc)
        ));
    }

    Ok(format!(
        r#"<query {}>{}</query>"#,
        root_attrs.join(" "),
        content
    ))
}

/// Converts a filter group to nested `<filter>`/`<condition>` elements.
///
/// The top-level group omits its `<filter>` wrapper when it only carries
/// conditions joined by `and` (the document default).
fn filter_group_to_xml(
    group: &FilterGroup,
    entity: &EntitySource,
    top_level: bool,
) -> Result<String, QueryError> {
    let group = group.flattened();
    let kind = match group.operator {
        GroupOperator::And => "and",
        GroupOperator::Or => "or",
        GroupOperator::Xor => {
            return Err(QueryError::unsupported_operator(GroupOperator::Xor, "XML"))
        }
    };

    let mut inner = String::new();
    for filter in &group.filters {
        if let Some(nested) = filter.nested.as_deref() {
            inner.push_str(&filter_group_to_xml(nested, entity, false)?);
            continue;
        }
        if let Some(condition) = condition_to_xml(filter, entity)? {
            inner.push_str(&condition);
        }
    }
    for nested in &group.groups {
        inner.push_str(&filter_group_to_xml(nested, entity, false)?);
    }

    if inner.is_empty() {
        return Ok(String::new());
    }
    if top_level && kind == "and" {
        return Ok(inner);
    }
    Ok(format!(r#"<filter type="{kind}">{inner}</filter>"#))
}

/// Converts one filter to a `<condition>` element, or `None` for local
/// filters.
fn condition_to_xml(filter: &Filter, entity: &EntitySource) -> Result<Option<String>, QueryError> {
    let FilterTarget::Remote {
        param,
        data_type,
        hint,
        ..
    } = resolve_target(filter, entity)
    else {
        return Ok(None);
    };

    let codec = JsonCodec;
    let operator = match filter.comparator {
        Comparator::Equals => "eq",
        Comparator::NotEquals => "ne",
        Comparator::GreaterThan => "gt",
        Comparator::GreaterOrEqual => "ge",
        Comparator::LessThan => "lt",
        Comparator::LessOrEqual => "le",
        Comparator::Is => "like",
        Comparator::IsNot => "not-like",
        Comparator::In | Comparator::NotIn => {
            let operator = if filter.comparator == Comparator::In {
                "in"
            } else {
                "not-in"
            };
            let scalars = filter.value.to_scalars(',');
            if scalars.is_empty() {
                return Ok(None);
            }
            let values = scalars
                .iter()
                .map(|scalar| {
                    codec
                        .encode_literal(scalar, data_type, hint)
                        .map(|text| format!("<value>{}</value>", escape_xml(&text)))
                })
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| {
                    QueryError::value_encoding(filter.describe(), source.to_string())
                })?;
            return Ok(Some(format!(
                r#"<condition attribute="{}" operator="{operator}">{}</condition>"#,
                escape_xml(param),
                values.join("")
            )));
        }
    };

    let value = codec
        .encode_literal(&filter.value, data_type, hint)
        .map_err(|source| QueryError::value_encoding(filter.describe(), source.to_string()))?;
    let rendered = match filter.comparator {
        Comparator::Is => format!("%{value}%"),
        Comparator::IsNot => format!("%{value}%"),
        _ => value,
    };
    Ok(Some(format!(
        r#"<condition attribute="{}" operator="{operator}" value="{}"/>"#,
        escape_xml(param),
        escape_xml(&rendered)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttributeSource;
    use crate::model::DataType;
    use crate::query::QueryWindow;
    use crate::query::Sorter;

    fn entity() -> EntitySource {
        EntitySource::new("orders")
            .with_attribute(AttributeSource::new("Status", "status", DataType::String))
            .with_attribute(AttributeSource::new("Total", "total", DataType::Number))
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("O'Brien & Co"), "O&apos;Brien &amp; Co");
        assert_eq!(escape_xml("<x>"), "&lt;x&gt;");
    }

    #[test]
    fn test_simple_document() {
        let query = DataQuery::new()
            .filter(Filter::equals("Status", "open"))
            .sort(Sorter::desc("Total"))
            .window(QueryWindow::new(0, 50));
        assert_eq!(
            query_document(&entity(), &query).unwrap(),
            r#"<query entity="orders" top="50"><condition attribute="status" operator="eq" value="open"/><order attribute="total" descending="true"/></query>"#
        );
    }

    #[test]
    fn test_nested_or_group() {
        let query = DataQuery::new().filter_group(
            FilterGroup::and([Filter::equals("Status", "open")]).with_group(FilterGroup::or([
                Filter::greater_than("Total", 10i32),
                Filter::less_than("Total", 2i32),
            ])),
        );
        let document = query_document(&entity(), &query).unwrap();
        assert!(document.contains(r#"<filter type="or">"#));
        assert!(document.contains(r#"operator="gt" value="10""#));
    }

    #[test]
    fn test_in_uses_value_elements() {
        let query = DataQuery::new().filter(Filter::in_list("Status", vec!["a", "b"]));
        let document = query_document(&entity(), &query).unwrap();
        assert!(document
            .contains(r#"<condition attribute="status" operator="in"><value>a</value><value>b</value></condition>"#));
    }

    #[test]
    fn test_xor_is_rejected() {
        let query = DataQuery::new().filter_group(
            FilterGroup::new(GroupOperator::Xor)
                .with_filter(Filter::equals("Status", "a"))
                .with_filter(Filter::equals("Status", "b")),
        );
        assert!(query_document(&entity(), &query).is_err());
    }
}
