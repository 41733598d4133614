//! OData v2/v4 filter predicate grammars.

use crate::codec::ODataCodec;
use crate::codec::ValueCodec;
use crate::error::QueryError;
use crate::model::DataType;
use crate::model::EntitySource;
use crate::model::Value;
use crate::query::Comparator;
use crate::query::Filter;

use super::resolve_target;
use super::simplify_single_in;
use super::FilterTarget;
use super::FilterTranslator;

/// The two OData protocol versions with distinct filter grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ODataVersion {
    /// OData v2: `substringof`, no native `in`.
    V2,
    /// OData v4: `contains`, `in (…)`, leading `not`.
    V4,
}

/// Translates filters into OData `$filter` predicates.
#[derive(Debug, Clone, Copy)]
pub struct ODataTranslator {
    version: ODataVersion,
    codec: ODataCodec,
}

impl ODataTranslator {
    /// Creates a translator for the given protocol version.
    pub fn new(version: ODataVersion) -> Self {
        Self {
            version,
            codec: ODataCodec,
        }
    }

    fn encode(
        &self,
        filter: &Filter,
        value: &Value,
        data_type: DataType,
        hint: Option<&str>,
    ) -> Result<String, QueryError> {
        self.codec
            .encode_literal(value, data_type, hint)
            .map_err(|source| QueryError::value_encoding(filter.describe(), source.to_string()))
    }

    /// Maps a comparator to its OData operator keyword.
    fn operator(&self, comparator: Comparator) -> Result<&'static str, QueryError> {
        match comparator {
            Comparator::Equals => Ok("eq"),
            Comparator::NotEquals => Ok("ne"),
            Comparator::GreaterThan => Ok("gt"),
            Comparator::GreaterOrEqual => Ok("ge"),
            Comparator::LessThan => Ok("lt"),
            Comparator::LessOrEqual => Ok("le"),
            other => Err(QueryError::unsupported_comparator(other, self.dialect())),
        }
    }

    fn substring_predicate(
        &self,
        param: &str,
        literal: &str,
        negated: bool,
    ) -> String {
        match self.version {
            ODataVersion::V2 => format!(
                "substringof({literal}, {param}) {} true",
                if negated { "ne" } else { "eq" }
            ),
            ODataVersion::V4 => {
                if negated {
                    format!("not contains({param},{literal})")
                } else {
                    format!("contains({param},{literal})")
                }
            }
        }
    }

    fn in_predicate(
        &self,
        filter: &Filter,
        entity: &EntitySource,
        param: &str,
        data_type: DataType,
        hint: Option<&str>,
    ) -> Result<Option<String>, QueryError> {
        let negated = filter.comparator == Comparator::NotIn;
        let mut scalars = filter.value.to_scalars(',');
        match scalars.len() {
            // IN over nothing constrains nothing.
            0 => Ok(None),
            1 => {
                let simplified = simplify_single_in(filter, scalars.pop().expect("one scalar"));
                self.translate_filter(&simplified, entity)
            }
            _ => {
                let literals = scalars
                    .iter()
                    .map(|scalar| self.encode(filter, scalar, data_type, hint))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Some(match self.version {
                    ODataVersion::V4 => {
                        let predicate = format!("{param} in ({})", literals.join(","));
                        if negated {
                            format!("not ({predicate})")
                        } else {
                            predicate
                        }
                    }
                    // v2 has no native `in`: OR-chain of eq (AND-chain of ne).
                    ODataVersion::V2 => {
                        let (op, join) = if negated { ("ne", " and ") } else { ("eq", " or ") };
                        let chain = literals
                            .iter()
                            .map(|literal| format!("{param} {op} {literal}"))
                            .collect::<Vec<_>>()
                            .join(join);
                        format!("({chain})")
                    }
                }))
            }
        }
    }
}

impl FilterTranslator for ODataTranslator {
    fn dialect(&self) -> &'static str {
        match self.version {
            ODataVersion::V2 => "OData v2",
            ODataVersion::V4 => "OData v4",
        }
    }

    fn translate_filter(
        &self,
        filter: &Filter,
        entity: &EntitySource,
    ) -> Result<Option<String>, QueryError> {
        let FilterTarget::Remote {
            param,
            data_type,
            hint,
            ..
        } = resolve_target(filter, entity)
        else {
            return Ok(None);
        };

        match filter.comparator {
            Comparator::Is | Comparator::IsNot => {
                let negated = filter.comparator == Comparator::IsNot;
                if data_type.is_textual() {
                    let literal = self.encode(filter, &filter.value, data_type, hint)?;
                    Ok(Some(self.substring_predicate(param, &literal, negated)))
                } else {
                    // Numbers, dates and booleans have no substring
                    // semantics; IS degrades to strict equality.
                    let strict = filter.with_condition(
                        if negated {
                            Comparator::NotEquals
                        } else {
                            Comparator::Equals
                        },
                        filter.value.clone(),
                    );
                    self.translate_filter(&strict, entity)
                }
            }
            Comparator::In | Comparator::NotIn => {
                self.in_predicate(filter, entity, param, data_type, hint)
            }
            comparator => {
                let op = self.operator(comparator)?;
                let literal = self.encode(filter, &filter.value, data_type, hint)?;
                Ok(Some(format!("{param} {op} {literal}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttributeSource;
    use crate::query::FilterGroup;
    use crate::query::GroupOperator;

    fn entity() -> EntitySource {
        EntitySource::new("Orders")
            .with_attribute(AttributeSource::new("Status", "Status", DataType::String))
            .with_attribute(AttributeSource::new("Total", "Total", DataType::Number))
            .with_attribute(AttributeSource::new("Id", "Id", DataType::Integer))
    }

    fn v2() -> ODataTranslator {
        ODataTranslator::new(ODataVersion::V2)
    }

    fn v4() -> ODataTranslator {
        ODataTranslator::new(ODataVersion::V4)
    }

    fn one(t: &ODataTranslator, filter: Filter) -> String {
        t.translate_filter(&filter, &entity()).unwrap().unwrap()
    }

    #[test]
    fn test_comparator_mapping() {
        assert_eq!(
            one(&v2(), Filter::equals("Status", "open")),
            "Status eq 'open'"
        );
        assert_eq!(
            one(&v2(), Filter::greater_than("Total", 100i32)),
            "Total gt 100"
        );
        assert_eq!(
            one(&v2(), Filter::new("Total", Comparator::LessOrEqual, 5i32)),
            "Total le 5"
        );
    }

    #[test]
    fn test_is_becomes_substring_for_strings() {
        assert_eq!(
            one(&v2(), Filter::is("Status", "ope")),
            "substringof('ope', Status) eq true"
        );
        assert_eq!(
            one(&v2(), Filter::new("Status", Comparator::IsNot, "ope")),
            "substringof('ope', Status) ne true"
        );
        assert_eq!(one(&v4(), Filter::is("Status", "ope")), "contains(Status,'ope')");
        assert_eq!(
            one(&v4(), Filter::new("Status", Comparator::IsNot, "ope")),
            "not contains(Status,'ope')"
        );
    }

    #[test]
    fn test_is_degrades_to_equality_for_numbers() {
        assert_eq!(one(&v2(), Filter::is("Total", 5i32)), "Total eq 5");
        assert_eq!(one(&v4(), Filter::is("Total", 5i32)), "Total eq 5");
    }

    #[test]
    fn test_in_v4() {
        assert_eq!(
            one(&v4(), Filter::in_list("Id", vec![1i32, 2, 3])),
            "Id in (1,2,3)"
        );
        assert_eq!(
            one(&v4(), Filter::new("Id", Comparator::NotIn, vec![1i32, 2])),
            "not (Id in (1,2))"
        );
    }

    #[test]
    fn test_in_with_one_value_equals_equals() {
        let in_one = one(&v4(), Filter::in_list("Id", vec![7i32]));
        let eq = one(&v4(), Filter::equals("Id", 7i32));
        assert_eq!(in_one, eq);
    }

    #[test]
    fn test_in_with_no_values_is_noop() {
        let empty: Vec<i32> = Vec::new();
        assert_eq!(
            v4().translate_filter(&Filter::in_list("Id", empty), &entity())
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_in_v2_becomes_chain() {
        assert_eq!(
            one(&v2(), Filter::in_list("Id", vec![1i32, 2])),
            "(Id eq 1 or Id eq 2)"
        );
        assert_eq!(
            one(&v2(), Filter::new("Id", Comparator::NotIn, vec![1i32, 2])),
            "(Id ne 1 and Id ne 2)"
        );
    }

    #[test]
    fn test_in_splits_delimited_strings() {
        assert_eq!(
            one(&v4(), Filter::in_list("Status", "open,closed")),
            "Status in ('open','closed')"
        );
    }

    #[test]
    fn test_group_flattening() {
        let inner = FilterGroup::and([
            Filter::equals("Status", "open"),
            Filter::greater_than("Total", 10i32),
        ]);
        let wrapped = FilterGroup::new(GroupOperator::And).with_group(inner.clone());

        let direct = v2().translate_group(&inner, &entity()).unwrap().unwrap();
        let unwrapped = v2().translate_group(&wrapped, &entity()).unwrap().unwrap();
        assert_eq!(direct, unwrapped);
        assert_eq!(direct, "Status eq 'open' and Total gt 10");
    }

    #[test]
    fn test_nested_groups_are_parenthesized() {
        let group = FilterGroup::and([Filter::equals("Status", "open")]).with_group(
            FilterGroup::or([
                Filter::equals("Id", 1i32),
                Filter::equals("Id", 2i32),
            ]),
        );
        assert_eq!(
            v2().translate_group(&group, &entity()).unwrap().unwrap(),
            "Status eq 'open' and (Id eq 1 or Id eq 2)"
        );
    }

    #[test]
    fn test_compound_filter_translates_like_its_group() {
        let keys = FilterGroup::and([
            Filter::equals("Id", 1i32),
            Filter::equals("Status", "open"),
        ]);
        let group = FilterGroup::or([
            Filter::compound(keys),
            Filter::equals("Id", 9i32),
        ]);
        assert_eq!(
            v4().translate_group(&group, &entity()).unwrap().unwrap(),
            "(Id eq 1 and Status eq 'open') or Id eq 9"
        );
    }

    #[test]
    fn test_xor_is_rejected() {
        let group = FilterGroup::new(GroupOperator::Xor)
            .with_filter(Filter::equals("Id", 1i32))
            .with_filter(Filter::equals("Id", 2i32));
        for translator in [v2(), v4()] {
            let err = translator.translate_group(&group, &entity()).unwrap_err();
            assert!(matches!(err, QueryError::UnsupportedGroupOperator { .. }));
        }
    }

    #[test]
    fn test_local_filters_are_omitted() {
        let group = FilterGroup::and([
            Filter::equals("Status", "open").locally(),
            Filter::equals("Id", 1i32),
        ]);
        assert_eq!(
            v2().translate_group(&group, &entity()).unwrap().unwrap(),
            "Id eq 1"
        );
    }
}
