//! Response row extraction.
//!
//! One normalization step turns the addressed part of a response body into
//! a tagged [`RowContainer`]; everything downstream consumes that union
//! uniformly instead of re-probing the JSON shape.

use serde_json::Map;
use serde_json::Value;
use tracing::trace;

use crate::dialect::Dialect;
use crate::error::ExtractError;
use crate::model::EntitySource;
use crate::paginate::PaginationStrategy;
use crate::path;

/// Normalized shape of the row-bearing part of a response.
#[derive(Debug, Clone, PartialEq)]
pub enum RowContainer {
    /// Nothing row-like found.
    Empty,
    /// One keyed object (a UID fetch, or an implicit single row).
    SingleObject(Map<String, Value>),
    /// A sequential list of row objects.
    ObjectList(Vec<Map<String, Value>>),
}

impl RowContainer {
    /// Flattens the container into a row list.
    pub fn into_rows(self) -> Vec<Map<String, Value>> {
        match self {
            RowContainer::Empty => Vec::new(),
            RowContainer::SingleObject(row) => vec![row],
            RowContainer::ObjectList(rows) => rows,
        }
    }
}

/// Extracts rows and total counts from raw response bodies.
#[derive(Debug, Clone)]
pub struct RowExtractor {
    dialect: Dialect,
    data_path: Option<String>,
    count_path: Option<String>,
    graphql_operation: Option<String>,
    uid_scoped: bool,
}

impl RowExtractor {
    /// Creates an extractor for a dialect and entity description.
    pub fn new(dialect: Dialect, entity: &EntitySource) -> Self {
        let options = entity.options();
        Self {
            dialect,
            data_path: options.response_data_path.clone(),
            count_path: options
                .response_total_count_path
                .clone()
                .or_else(|| {
                    PaginationStrategy::for_dialect(dialect, options)
                        .count_path()
                        .map(str::to_string)
                }),
            graphql_operation: options.graphql_query_name.clone(),
            uid_scoped: false,
        }
    }

    /// Marks the query as UID-scoped: a keyed object in the response is one
    /// row, not an envelope.
    pub fn uid_scoped(mut self, uid_scoped: bool) -> Self {
        self.uid_scoped = uid_scoped;
        self
    }

    /// Parses the body and returns the list of row objects.
    pub fn rows(&self, body: &str) -> Result<Vec<Map<String, Value>>, ExtractError> {
        Ok(self.container(body)?.into_rows())
    }

    /// Parses the body into the normalized row container.
    pub fn container(&self, body: &str) -> Result<RowContainer, ExtractError> {
        if body.trim().is_empty() {
            return Ok(RowContainer::Empty);
        }
        let root: Value = serde_json::from_str(body)
            .map_err(|e| ExtractError::parse_with_body(e.to_string(), body))?;
        let container = self.normalize(&root);
        let row_count = match &container {
            RowContainer::Empty => 0,
            RowContainer::SingleObject(_) => 1,
            RowContainer::ObjectList(rows) => rows.len(),
        };
        trace!(
            dialect = self.dialect.name(),
            rows = row_count,
            uid_scoped = self.uid_scoped,
            "extracted rows"
        );
        Ok(container)
    }

    /// Reads the total-row counter from the body.
    ///
    /// A malformed or missing counter silently yields `None`, deferring to
    /// the follow-up `$count` request.
    pub fn total_count(&self, body: &str) -> Option<u64> {
        let root: Value = serde_json::from_str(body).ok()?;
        let counter = path::extract(&root, self.count_path.as_deref()?)?;
        match counter {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn normalize(&self, root: &Value) -> RowContainer {
        let candidate = match self.data_path.as_deref() {
            Some(path) => match path::extract(root, path) {
                Some(value) => value,
                None => return RowContainer::Empty,
            },
            None => match self.default_candidate(root) {
                Some(value) => value,
                None => return RowContainer::Empty,
            },
        };
        self.contain(candidate)
    }

    /// Applies the dialect's default envelope when no path is configured.
    fn default_candidate<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        match self.dialect {
            Dialect::OData2 => {
                // {"d": {"results": [...]}} or {"d": {...}}
                let d = root.get("d")?;
                Some(d.get("results").unwrap_or(d))
            }
            Dialect::OData4 | Dialect::ODataHybrid => root.get("value").or(Some(root)),
            Dialect::GraphQl => {
                let operation = self.graphql_operation.as_deref()?;
                root.get("data")?.get(operation)
            }
            Dialect::JsonRest | Dialect::Xml | Dialect::Html => Some(root),
        }
    }

    fn contain(&self, candidate: &Value) -> RowContainer {
        match candidate {
            Value::Object(map) => {
                // A UID fetch returns one object, not a list; an object at
                // the top level with no path is one implicit row.
                RowContainer::SingleObject(map.clone())
            }
            Value::Array(items) => RowContainer::ObjectList(
                items
                    .iter()
                    .map(|item| match item {
                        Value::Object(map) => map.clone(),
                        other => {
                            let mut row = Map::new();
                            row.insert("value".to_string(), other.clone());
                            row
                        }
                    })
                    .collect(),
            ),
            Value::Null => RowContainer::Empty,
            scalar => {
                let mut row = Map::new();
                row.insert("value".to_string(), scalar.clone());
                RowContainer::SingleObject(row)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extractor(dialect: Dialect) -> RowExtractor {
        RowExtractor::new(dialect, &EntitySource::new("Orders"))
    }

    #[test]
    fn test_odata2_results_envelope() {
        let rows = extractor(Dialect::OData2)
            .rows(r#"{"d":{"results":[{"a":1},{"a":2}]}}"#)
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_odata2_single_object_envelope() {
        let rows = extractor(Dialect::OData2).rows(r#"{"d":{"a":1}}"#).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_odata4_value_envelope() {
        let rows = extractor(Dialect::OData4)
            .rows(r#"{"value":[{"a":1}]}"#)
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_bare_array_and_object() {
        let rows = extractor(Dialect::JsonRest)
            .rows(r#"[{"a":1},{"a":2},{"a":3}]"#)
            .unwrap();
        assert_eq!(rows.len(), 3);

        let implicit = extractor(Dialect::JsonRest).rows(r#"{"a":1}"#).unwrap();
        assert_eq!(implicit.len(), 1);
    }

    #[test]
    fn test_configured_path_with_selector() {
        let entity = EntitySource::new("Orders").with_options(crate::model::EntityOptions {
            response_data_path: Some("sections[id=data]/rows".into()),
            ..Default::default()
        });
        let extractor = RowExtractor::new(Dialect::JsonRest, &entity);
        let body = r#"{"sections":[{"id":"meta"},{"id":"data","rows":[{"a":1}]}]}"#;
        assert_eq!(extractor.rows(body).unwrap().len(), 1);
    }

    #[test]
    fn test_graphql_operation_envelope() {
        let entity = EntitySource::new("Orders").with_options(crate::model::EntityOptions {
            graphql_query_name: Some("orders".into()),
            ..Default::default()
        });
        let extractor = RowExtractor::new(Dialect::GraphQl, &entity);
        let rows = extractor
            .rows(r#"{"data":{"orders":[{"id":1},{"id":2}]}}"#)
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_inline_counters() {
        assert_eq!(
            extractor(Dialect::OData2).total_count(r#"{"d":{"__count":"42"}}"#),
            Some(42)
        );
        assert_eq!(
            extractor(Dialect::OData4).total_count(r#"{"@odata.count":17,"value":[]}"#),
            Some(17)
        );
        // Malformed counter yields None, never an error.
        assert_eq!(
            extractor(Dialect::OData2).total_count(r#"{"d":{"__count":{"nested":true}}}"#),
            None
        );
        assert_eq!(extractor(Dialect::OData2).total_count("not json"), None);
    }

    #[test]
    fn test_unparsable_body_is_an_error() {
        let err = extractor(Dialect::JsonRest).rows("<html>").unwrap_err();
        assert!(matches!(err, ExtractError::Parse { .. }));
    }

    #[test]
    fn test_empty_body_is_empty() {
        assert!(extractor(Dialect::JsonRest).rows("").unwrap().is_empty());
    }
}
