//! Compiles [`SearchCriteria`] into a backend-neutral [`CompiledCriteria`].
//!
//! This is where the per-operator contract lives; backends only lower the
//! resulting [`Predicate`] tree.
//!
//! | Operator | STRING | NUMBER / DATE | BOOLEAN |
//! |---|---|---|---|
//! | EQUALS | `=` | `=` (date-only DATE: whole-day range) | `=` |
//! | NOT_EQUALS | present and `<>` | present and `<>` | present and `<>` |
//! | LESS_THAN / GREATER_THAN | dropped | `<` / `>` | dropped |
//! | BETWEEN | dropped | inclusive range | dropped |
//! | CONTAINS / STARTS_WITH / ENDS_WITH | case-insensitive match | dropped | dropped |
//! | NOT_CONTAINS | present and not matching | dropped | dropped |
//! | IN / NOT_IN | membership / present and not a member | same | same |
//! | BLANK | null or `""` | null | null |
//! | NOT_BLANK | present and not `""` | present | present |

use serde::Serialize;

use crate::error::{EngineResult, ValidationError};
use crate::types::{
    FieldType, FieldValue, FilterCriteria, FilterDescriptor, FilterOperator, PageCriteria,
    SearchCriteria, SortDirection,
};

use super::parser::FieldTypeParser;
use super::predicate::{CompareOp, Predicate, TextMode};

/// A filter that was skipped because its operator does not apply to its field type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedFilter {
    /// The filter key.
    pub key: String,
    /// The requested operator.
    pub operator: FilterOperator,
    /// The resolved field type.
    pub field_type: FieldType,
}

/// A sort with its resolved field type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledSort {
    /// The field key.
    pub key: String,
    /// The direction.
    pub direction: SortDirection,
    /// The resolved field type.
    pub field_type: FieldType,
}

/// Criteria ready for lowering by a backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledCriteria {
    /// The combined filter and full-text predicate, if any.
    pub predicate: Option<Predicate>,
    /// Sorts in application order.
    pub sorts: Vec<CompiledSort>,
    /// The page window.
    pub page: PageCriteria,
    /// Filters skipped as unsupported for their field type.
    pub dropped: Vec<DroppedFilter>,
}

/// Compiles criteria against the descriptors of one entity type.
///
/// Holds only a borrowed descriptor list, so one compiler can serve
/// concurrent calls.
#[derive(Debug, Clone, Copy)]
pub struct CriteriaCompiler<'a> {
    descriptors: &'a [FilterDescriptor],
}

impl<'a> CriteriaCompiler<'a> {
    /// Creates a compiler for the given descriptors.
    pub fn new(descriptors: &'a [FilterDescriptor]) -> Self {
        Self { descriptors }
    }

    /// Returns the field type of a key, defaulting to STRING.
    pub fn resolve_field_type(&self, key: &str) -> FieldType {
        self.descriptors
            .iter()
            .find(|d| d.key() == key)
            .map(|d| d.field_type())
            .unwrap_or(FieldType::String)
    }

    /// Compiles the whole request.
    pub fn compile(&self, criteria: &SearchCriteria) -> EngineResult<CompiledCriteria> {
        let page = criteria.page();
        if page.size == 0 {
            return Err(ValidationError::InvalidPageSize { size: page.size }.into());
        }

        let mut terms = Vec::new();
        let mut dropped = Vec::new();

        for filter in criteria.filters() {
            let field_type = filter
                .field_type
                .unwrap_or_else(|| self.resolve_field_type(&filter.key));

            match self.compile_filter(filter, field_type)? {
                Some(predicate) => terms.push(predicate),
                None => {
                    tracing::warn!(
                        key = %filter.key,
                        operator = %filter.operator,
                        field_type = %field_type,
                        "Operator not supported for field type, filter ignored"
                    );
                    dropped.push(DroppedFilter {
                        key: filter.key.clone(),
                        operator: filter.operator,
                        field_type,
                    });
                }
            }
        }

        if let Some(query) = criteria.full_text().and_then(|ft| ft.active_query()) {
            if let Some(predicate) = self.full_text(query) {
                terms.push(predicate);
            }
        }

        let sorts = criteria
            .sorts()
            .iter()
            .map(|sort| CompiledSort {
                key: sort.key.clone(),
                direction: sort.direction,
                field_type: self.resolve_field_type(&sort.key),
            })
            .collect();

        let compiled = CompiledCriteria {
            predicate: Predicate::all(terms),
            sorts,
            page,
            dropped,
        };
        tracing::debug!(predicate = ?compiled.predicate, "Compiled search criteria");

        Ok(compiled)
    }

    /// Compiles one filter; `Ok(None)` means the operator does not apply.
    pub fn compile_filter(
        &self,
        filter: &FilterCriteria,
        field_type: FieldType,
    ) -> EngineResult<Option<Predicate>> {
        use FilterOperator::*;

        let key = filter.key.as_str();

        let predicate = match filter.operator {
            Equals => {
                let raw = required_value(filter)?;
                match FieldTypeParser::whole_day(raw) {
                    Some((start, end)) if field_type == FieldType::Date => {
                        tracing::debug!(key = %key, value = %raw, "Date-only EQUALS widened to whole day");
                        Predicate::range(key, start, end)
                    }
                    _ => Predicate::compare(key, CompareOp::Eq, parse(raw, field_type)?),
                }
            }
            NotEquals => {
                let value = parse(required_value(filter)?, field_type)?;
                Predicate::And(vec![
                    Predicate::is_not_null(key),
                    Predicate::compare(key, CompareOp::Ne, value),
                ])
            }
            LessThan | GreaterThan => {
                if !field_type.is_ordered() {
                    return Ok(None);
                }
                let op = if filter.operator == LessThan {
                    CompareOp::Lt
                } else {
                    CompareOp::Gt
                };
                Predicate::compare(key, op, parse(required_value(filter)?, field_type)?)
            }
            Between => {
                if !field_type.is_ordered() {
                    return Ok(None);
                }
                let lower = parse(required_value(filter)?, field_type)?;
                let upper = filter
                    .value_to
                    .as_deref()
                    .ok_or_else(|| ValidationError::MissingUpperBound {
                        key: key.to_string(),
                    })?;
                Predicate::range(key, lower, parse(upper, field_type)?)
            }
            Contains | NotContains | StartsWith | EndsWith => {
                if field_type != FieldType::String {
                    return Ok(None);
                }
                let text = required_value(filter)?;
                match filter.operator {
                    Contains => Predicate::text(key, TextMode::Contains, text),
                    StartsWith => Predicate::text(key, TextMode::StartsWith, text),
                    EndsWith => Predicate::text(key, TextMode::EndsWith, text),
                    _ => Predicate::present_and_not(
                        key,
                        Predicate::text(key, TextMode::Contains, text),
                    ),
                }
            }
            In | NotIn => {
                let values = filter
                    .values
                    .iter()
                    .map(|v| parse(v, field_type))
                    .collect::<EngineResult<Vec<_>>>()?;
                let membership = Predicate::In {
                    field: key.to_string(),
                    values,
                };
                if filter.operator == In {
                    membership
                } else {
                    Predicate::present_and_not(key, membership)
                }
            }
            Blank => {
                if field_type == FieldType::String {
                    Predicate::Or(vec![
                        Predicate::is_null(key),
                        Predicate::compare(key, CompareOp::Eq, ""),
                    ])
                } else {
                    Predicate::is_null(key)
                }
            }
            NotBlank => {
                if field_type == FieldType::String {
                    Predicate::And(vec![
                        Predicate::is_not_null(key),
                        Predicate::compare(key, CompareOp::Ne, ""),
                    ])
                } else {
                    Predicate::is_not_null(key)
                }
            }
        };

        Ok(Some(predicate))
    }

    /// Builds the OR of case-insensitive substring matches over every STRING field.
    ///
    /// Returns `None` when the entity has no STRING fields.
    pub fn full_text(&self, query: &str) -> Option<Predicate> {
        let predicate = Predicate::any(
            self.descriptors
                .iter()
                .filter(|d| d.field_type() == FieldType::String)
                .map(|d| Predicate::text(d.key(), TextMode::Contains, query)),
        );
        if predicate.is_none() {
            tracing::warn!(query = %query, "No STRING fields available for full-text search");
        }
        predicate
    }
}

fn required_value(filter: &FilterCriteria) -> EngineResult<&str> {
    filter.value.as_deref().ok_or_else(|| {
        ValidationError::MissingValue {
            key: filter.key.clone(),
            operator: filter.operator,
        }
        .into()
    })
}

fn parse(raw: &str, field_type: FieldType) -> EngineResult<FieldValue> {
    Ok(FieldTypeParser::parse(raw, field_type)?)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::error::{EngineError, ParseError};
    use crate::types::{NumberValue, SortCriteria};

    fn descriptors() -> Vec<FilterDescriptor> {
        vec![
            FilterDescriptor::with_default_operators("name", FieldType::String, true).unwrap(),
            FilterDescriptor::with_default_operators("version", FieldType::String, true).unwrap(),
            FilterDescriptor::with_default_operators("usages", FieldType::Number, true).unwrap(),
            FilterDescriptor::with_default_operators("releaseDate", FieldType::Date, true)
                .unwrap(),
            FilterDescriptor::with_default_operators("supported", FieldType::Boolean, true)
                .unwrap(),
        ]
    }

    fn compile_one(filter: FilterCriteria) -> CompiledCriteria {
        let descriptors = descriptors();
        CriteriaCompiler::new(&descriptors)
            .compile(&SearchCriteria::default().with_filter(filter))
            .unwrap()
    }

    #[test]
    fn test_date_only_equals_widens_to_whole_day() {
        let compiled = compile_one(FilterCriteria::with_value(
            "releaseDate",
            FilterOperator::Equals,
            "2024-03-15",
        ));
        let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(
            compiled.predicate,
            Some(Predicate::range(
                "releaseDate",
                day.and_hms_opt(0, 0, 0).unwrap(),
                day.and_hms_nano_opt(23, 59, 59, 999_999_999).unwrap(),
            ))
        );
    }

    #[test]
    fn test_date_time_equals_is_exact() {
        let compiled = compile_one(FilterCriteria::with_value(
            "releaseDate",
            FilterOperator::Equals,
            "2024-03-15 08:00:00",
        ));
        assert!(matches!(
            compiled.predicate,
            Some(Predicate::Compare {
                op: CompareOp::Eq,
                ..
            })
        ));
    }

    #[test]
    fn test_not_equals_has_no_whole_day_rewrite() {
        let compiled = compile_one(FilterCriteria::with_value(
            "releaseDate",
            FilterOperator::NotEquals,
            "2024-03-15",
        ));
        let midnight = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            compiled.predicate,
            Some(Predicate::And(vec![
                Predicate::is_not_null("releaseDate"),
                Predicate::compare("releaseDate", CompareOp::Ne, midnight),
            ]))
        );
    }

    #[test]
    fn test_string_date_only_value_is_not_widened() {
        let compiled = compile_one(FilterCriteria::with_value(
            "name",
            FilterOperator::Equals,
            "2024-03-15",
        ));
        assert_eq!(
            compiled.predicate,
            Some(Predicate::compare("name", CompareOp::Eq, "2024-03-15"))
        );
    }

    #[test]
    fn test_ordering_operators_dropped_on_string() {
        for filter in [
            FilterCriteria::with_value("name", FilterOperator::LessThan, "m"),
            FilterCriteria::with_value("name", FilterOperator::GreaterThan, "m"),
            FilterCriteria::between("name", "a", "z"),
            FilterCriteria::between("supported", "false", "true"),
        ] {
            let compiled = compile_one(filter.clone());
            assert_eq!(compiled.predicate, None);
            assert_eq!(compiled.dropped.len(), 1);
            assert_eq!(compiled.dropped[0].key, filter.key);
        }
    }

    #[test]
    fn test_text_operators_dropped_on_number() {
        let compiled = compile_one(FilterCriteria::with_value(
            "usages",
            FilterOperator::Contains,
            "1",
        ));
        assert_eq!(compiled.predicate, None);
        assert_eq!(compiled.dropped[0].field_type, FieldType::Number);
    }

    #[test]
    fn test_dropped_filter_does_not_affect_others() {
        let descriptors = descriptors();
        let criteria = SearchCriteria::default()
            .with_filter(FilterCriteria::with_value("name", FilterOperator::LessThan, "m"))
            .with_filter(FilterCriteria::with_value("usages", FilterOperator::GreaterThan, "10"));
        let compiled = CriteriaCompiler::new(&descriptors).compile(&criteria).unwrap();
        assert_eq!(
            compiled.predicate,
            Some(Predicate::compare("usages", CompareOp::Gt, 10))
        );
        assert_eq!(compiled.dropped.len(), 1);
    }

    #[test]
    fn test_between_on_number() {
        let compiled = compile_one(FilterCriteria::between("usages", "10", "20.5"));
        assert_eq!(
            compiled.predicate,
            Some(Predicate::range(
                "usages",
                FieldValue::Number(NumberValue::Int(10)),
                FieldValue::Number(NumberValue::Double(20.5)),
            ))
        );
    }

    #[test]
    fn test_between_requires_upper_bound() {
        let descriptors = descriptors();
        let criteria = SearchCriteria::default()
            .with_filter(FilterCriteria::with_value("usages", FilterOperator::Between, "10"));
        let err = CriteriaCompiler::new(&descriptors).compile(&criteria).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::MissingUpperBound { .. })
        ));
    }

    #[test]
    fn test_missing_value_is_validation_error() {
        let descriptors = descriptors();
        let criteria =
            SearchCriteria::default().with_filter(FilterCriteria::new("name", FilterOperator::Equals));
        let err = CriteriaCompiler::new(&descriptors).compile(&criteria).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::MissingValue { .. })
        ));
    }

    #[test]
    fn test_parse_errors_propagate() {
        let descriptors = descriptors();
        let criteria = SearchCriteria::default().with_filter(FilterCriteria::with_value(
            "usages",
            FilterOperator::Equals,
            "many",
        ));
        let err = CriteriaCompiler::new(&descriptors).compile(&criteria).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Parse(ParseError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_unset_field_type_resolved_from_descriptors() {
        let compiled = compile_one(FilterCriteria::with_value(
            "usages",
            FilterOperator::Equals,
            "42",
        ));
        assert_eq!(
            compiled.predicate,
            Some(Predicate::compare("usages", CompareOp::Eq, 42))
        );
    }

    #[test]
    fn test_unknown_field_defaults_to_string() {
        let compiled = compile_one(FilterCriteria::with_value(
            "kernel",
            FilterOperator::Equals,
            "42",
        ));
        assert_eq!(
            compiled.predicate,
            Some(Predicate::compare("kernel", CompareOp::Eq, "42"))
        );
    }

    #[test]
    fn test_explicit_field_type_wins() {
        let compiled = compile_one(
            FilterCriteria::with_value("name", FilterOperator::GreaterThan, "5")
                .field_type(FieldType::Number),
        );
        assert_eq!(
            compiled.predicate,
            Some(Predicate::compare("name", CompareOp::Gt, 5))
        );
    }

    #[test]
    fn test_in_parses_each_value() {
        let compiled = compile_one(FilterCriteria::membership(
            "usages",
            FilterOperator::In,
            ["1", "2.5"],
        ));
        assert_eq!(
            compiled.predicate,
            Some(Predicate::In {
                field: "usages".to_string(),
                values: vec![
                    FieldValue::Number(NumberValue::Int(1)),
                    FieldValue::Number(NumberValue::Double(2.5)),
                ],
            })
        );
    }

    #[test]
    fn test_not_in_and_not_contains_require_presence() {
        let compiled = compile_one(FilterCriteria::membership(
            "name",
            FilterOperator::NotIn,
            ["Debian"],
        ));
        assert!(matches!(
            compiled.predicate,
            Some(Predicate::And(ref children)) if children[0] == Predicate::is_not_null("name")
        ));

        let compiled = compile_one(FilterCriteria::with_value(
            "name",
            FilterOperator::NotContains,
            "win",
        ));
        assert_eq!(
            compiled.predicate,
            Some(Predicate::And(vec![
                Predicate::is_not_null("name"),
                Predicate::not(Predicate::text("name", TextMode::Contains, "win")),
            ]))
        );
    }

    #[test]
    fn test_blank_semantics_by_type() {
        let compiled = compile_one(FilterCriteria::new("name", FilterOperator::Blank));
        assert_eq!(
            compiled.predicate,
            Some(Predicate::Or(vec![
                Predicate::is_null("name"),
                Predicate::compare("name", CompareOp::Eq, ""),
            ]))
        );

        let compiled = compile_one(FilterCriteria::new("usages", FilterOperator::Blank));
        assert_eq!(compiled.predicate, Some(Predicate::is_null("usages")));

        let compiled = compile_one(FilterCriteria::new("name", FilterOperator::NotBlank));
        assert_eq!(
            compiled.predicate,
            Some(Predicate::And(vec![
                Predicate::is_not_null("name"),
                Predicate::compare("name", CompareOp::Ne, ""),
            ]))
        );

        let compiled = compile_one(FilterCriteria::new("releaseDate", FilterOperator::NotBlank));
        assert_eq!(compiled.predicate, Some(Predicate::is_not_null("releaseDate")));
    }

    #[test]
    fn test_full_text_over_string_fields() {
        let descriptors = descriptors();
        let criteria = SearchCriteria::default().with_full_text("Windows");
        let compiled = CriteriaCompiler::new(&descriptors).compile(&criteria).unwrap();
        assert_eq!(
            compiled.predicate,
            Some(Predicate::Or(vec![
                Predicate::text("name", TextMode::Contains, "Windows"),
                Predicate::text("version", TextMode::Contains, "Windows"),
            ]))
        );
    }

    #[test]
    fn test_full_text_without_string_fields_is_noop() {
        let descriptors =
            vec![FilterDescriptor::with_default_operators("usages", FieldType::Number, true).unwrap()];
        let criteria = SearchCriteria::default().with_full_text("Windows");
        let compiled = CriteriaCompiler::new(&descriptors).compile(&criteria).unwrap();
        assert_eq!(compiled.predicate, None);
    }

    #[test]
    fn test_blank_full_text_is_ignored() {
        let descriptors = descriptors();
        let criteria = SearchCriteria::default().with_full_text("  ");
        let compiled = CriteriaCompiler::new(&descriptors).compile(&criteria).unwrap();
        assert_eq!(compiled.predicate, None);
    }

    #[test]
    fn test_filters_and_full_text_are_conjoined() {
        let descriptors = descriptors();
        let criteria = SearchCriteria::default()
            .with_filter(FilterCriteria::with_value("usages", FilterOperator::GreaterThan, "1"))
            .with_full_text("linux");
        let compiled = CriteriaCompiler::new(&descriptors).compile(&criteria).unwrap();
        match compiled.predicate {
            Some(Predicate::And(children)) => {
                assert_eq!(children.len(), 2);
                assert!(matches!(children[1], Predicate::Or(_)));
            }
            other => panic!("expected conjunction, got {:?}", other),
        }
    }

    #[test]
    fn test_sorts_carry_field_types() {
        let descriptors = descriptors();
        let criteria = SearchCriteria::default()
            .with_sort(SortCriteria::desc("usages"))
            .with_sort(SortCriteria::asc("name"));
        let compiled = CriteriaCompiler::new(&descriptors).compile(&criteria).unwrap();
        assert_eq!(compiled.sorts.len(), 2);
        assert_eq!(compiled.sorts[0].field_type, FieldType::Number);
        assert_eq!(compiled.sorts[0].direction, SortDirection::Desc);
        assert_eq!(compiled.sorts[1].field_type, FieldType::String);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let descriptors = descriptors();
        let criteria = SearchCriteria::default().with_page(0, 0);
        let err = CriteriaCompiler::new(&descriptors).compile(&criteria).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::InvalidPageSize { size: 0 })
        ));
    }
}
