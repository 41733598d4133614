//! Generic JSON REST filter translation.
//!
//! Plain REST APIs have no predicate grammar: each remote filter becomes
//! one query-string parameter. Only flat `AND` semantics can be expressed;
//! anything else fails fast instead of silently dropping a condition.

use crate::codec::JsonCodec;
use crate::codec::ValueCodec;
use crate::error::QueryError;
use crate::model::EntitySource;
use crate::query::Comparator;
use crate::query::Filter;
use crate::query::FilterGroup;
use crate::query::GroupOperator;

use super::resolve_target;
use super::FilterTarget;

/// Translates filters into URL parameter pairs for generic JSON REST APIs.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParamTranslator {
    codec: JsonCodec,
}

impl JsonParamTranslator {
    /// Creates a new translator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates a filter tree into (parameter, value) pairs.
    ///
    /// Nested `AND` groups are flattened into the same parameter list.
    pub fn translate_group(
        &self,
        group: &FilterGroup,
        entity: &EntitySource,
    ) -> Result<Vec<(String, String)>, QueryError> {
        let group = group.flattened();
        if group.operator != GroupOperator::And {
            return Err(QueryError::unsupported_operator(
                group.operator,
                "generic JSON REST",
            ));
        }
        let mut params = Vec::new();
        for filter in &group.filters {
            if let Some(nested) = filter.nested.as_deref() {
                params.extend(self.translate_group(nested, entity)?);
                continue;
            }
            if let Some(pair) = self.translate_filter(filter, entity)? {
                params.push(pair);
            }
        }
        for nested in &group.groups {
            params.extend(self.translate_group(nested, entity)?);
        }
        Ok(params)
    }

    /// Translates one filter into a (parameter, value) pair, or `None` for
    /// local filters.
    pub fn translate_filter(
        &self,
        filter: &Filter,
        entity: &EntitySource,
    ) -> Result<Option<(String, String)>, QueryError> {
        let FilterTarget::Remote {
            param,
            data_type,
            hint,
            prefix,
        } = resolve_target(filter, entity)
        else {
            return Ok(None);
        };

        let rendered = match filter.comparator {
            Comparator::Equals | Comparator::Is => self
                .codec
                .encode_literal(&filter.value, data_type, hint)
                .map_err(|source| {
                    QueryError::value_encoding(filter.describe(), source.to_string())
                })?,
            Comparator::In => {
                let scalars = filter.value.to_scalars(',');
                if scalars.is_empty() {
                    return Ok(None);
                }
                scalars
                    .iter()
                    .map(|scalar| {
                        self.codec
                            .encode_literal(scalar, data_type, hint)
                            .map_err(|source| {
                                QueryError::value_encoding(filter.describe(), source.to_string())
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?
                    .join(",")
            }
            other => {
                return Err(QueryError::unsupported_comparator(
                    other,
                    "generic JSON REST",
                ))
            }
        };

        let value = match prefix {
            Some(prefix) => format!("{prefix}{rendered}"),
            None => rendered,
        };
        Ok(Some((param.to_string(), value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttributeOptions;
    use crate::model::AttributeSource;
    use crate::model::DataType;

    fn entity() -> EntitySource {
        EntitySource::new("items")
            .with_attribute(AttributeSource::new("name", "name", DataType::String))
            .with_attribute(
                AttributeSource::new("status", "status", DataType::String).with_options(
                    AttributeOptions {
                        filter_remote_prefix: Some("eq:".into()),
                        ..Default::default()
                    },
                ),
            )
    }

    #[test]
    fn test_equals_becomes_parameter_pair() {
        let group = FilterGroup::and([Filter::equals("name", "Contoso")]);
        assert_eq!(
            JsonParamTranslator::new()
                .translate_group(&group, &entity())
                .unwrap(),
            vec![("name".to_string(), "Contoso".to_string())]
        );
    }

    #[test]
    fn test_prefix_is_injected() {
        let group = FilterGroup::and([Filter::equals("status", "open")]);
        assert_eq!(
            JsonParamTranslator::new()
                .translate_group(&group, &entity())
                .unwrap(),
            vec![("status".to_string(), "eq:open".to_string())]
        );
    }

    #[test]
    fn test_in_joins_values() {
        let group = FilterGroup::and([Filter::in_list("name", vec!["a", "b"])]);
        assert_eq!(
            JsonParamTranslator::new()
                .translate_group(&group, &entity())
                .unwrap(),
            vec![("name".to_string(), "a,b".to_string())]
        );
    }

    #[test]
    fn test_or_group_fails_fast() {
        let group = FilterGroup::or([
            Filter::equals("name", "a"),
            Filter::equals("name", "b"),
        ]);
        let err = JsonParamTranslator::new()
            .translate_group(&group, &entity())
            .unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedGroupOperator { .. }));
    }

    #[test]
    fn test_unmapped_comparator_fails_fast() {
        let group = FilterGroup::and([Filter::greater_than("name", 1i32)]);
        let err = JsonParamTranslator::new()
            .translate_group(&group, &entity())
            .unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedComparator { .. }));
    }
}
